//! Render queue controller
//!
//! Renders an ordered list of scenes one at a time. For each scene the
//! controller makes it the active scene, activates (or creates) the slot of the
//! render result named after it, requests a non-blocking render and returns.
//! The next scene starts only once the host has signalled that the previous
//! render completed. When the list is exhausted the controller removes its
//! listener and puts the original scene back.
//!
//! ```text
//! Idle ──start──▶ Rendering(0) ──complete──▶ … ──▶ Rendering(N-1) ──complete──▶ Finalizing ──▶ Idle
//!                      │ timeout / cancel
//!                      ▼
//!              Stalled(i) / Cancelled(i)
//! ```
//!
//! Nothing here blocks. The host delivers completions to the controller's
//! listener and the caller feeds them back in with
//! [`process_events`](RenderQueueController::process_events) or
//! [`poll`](RenderQueueController::poll) from its event loop.

use crate::host::{RenderComplete, RenderHost, SceneId, SubscriptionHandle};
use crate::report::{LogReporter, ReportSink};
use crate::{Error, QueueConfig, Result};
use serde::Serialize;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Instant;

/// Scenes to render, in order, plus the scene to return to afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBatchRequest {
    scenes: Vec<SceneId>,
    original_scene: SceneId,
}

impl RenderBatchRequest {
    pub fn new<I, S>(scenes: I, original_scene: impl Into<SceneId>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SceneId>,
    {
        Self {
            scenes: scenes.into_iter().map(Into::into).collect(),
            original_scene: original_scene.into(),
        }
    }

    pub fn scenes(&self) -> &[SceneId] {
        &self.scenes
    }

    pub fn original_scene(&self) -> &SceneId {
        &self.original_scene
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Position of a running batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub index: usize,
    pub total: usize,
}

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QueueState {
    Idle,
    /// Waiting for the render of scene `index` to complete
    Rendering { index: usize, total: usize },
    Finalizing,
    /// The render of scene `index` timed out; the batch was abandoned
    Stalled { index: usize },
    /// The batch was cancelled while scene `index` was rendering
    Cancelled { index: usize },
}

impl QueueState {
    pub fn is_running(&self) -> bool {
        matches!(self, QueueState::Rendering { .. } | QueueState::Finalizing)
    }
}

/// How a batch ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BatchOutcome {
    Completed { rendered: usize },
    Stalled { scene: SceneId, index: usize, elapsed_ms: u64 },
    Cancelled { index: usize },
    Failed { index: usize, reason: String },
}

impl BatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BatchOutcome::Completed { .. })
    }

    /// Number of rendered scenes, or the error that ended the batch
    pub fn into_result(self) -> Result<usize> {
        match self {
            BatchOutcome::Completed { rendered } => Ok(rendered),
            BatchOutcome::Stalled { scene, elapsed_ms, .. } => Err(Error::Stalled {
                scene: scene.to_string(),
                elapsed_ms,
            }),
            BatchOutcome::Cancelled { .. } => Err(Error::Cancelled),
            BatchOutcome::Failed { reason, .. } => Err(Error::Host(reason)),
        }
    }
}

struct ActiveBatch {
    request: RenderBatchRequest,
    progress: BatchProgress,
    subscription: Option<SubscriptionHandle>,
    events: Receiver<RenderComplete>,
    render_started: Option<Instant>,
}

/// Sequences renders of a [`RenderBatchRequest`] against a [`RenderHost`].
pub struct RenderQueueController {
    config: QueueConfig,
    reporter: Arc<dyn ReportSink>,
    state: QueueState,
    batch: Option<ActiveBatch>,
    last_outcome: Option<BatchOutcome>,
}

impl Default for RenderQueueController {
    fn default() -> Self {
        Self::new(QueueConfig::default(), Arc::new(LogReporter))
    }
}

impl RenderQueueController {
    pub fn new(config: QueueConfig, reporter: Arc<dyn ReportSink>) -> Self {
        Self {
            config,
            reporter,
            state: QueueState::Idle,
            batch: None,
            last_outcome: None,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn state(&self) -> &QueueState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn progress(&self) -> Option<BatchProgress> {
        self.batch.as_ref().map(|b| b.progress)
    }

    pub fn request(&self) -> Option<&RenderBatchRequest> {
        self.batch.as_ref().map(|b| &b.request)
    }

    /// Handle of the controller's render-complete listener while a batch runs
    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.batch.as_ref().and_then(|b| b.subscription)
    }

    /// Outcome of the most recent batch that reached an end
    pub fn last_outcome(&self) -> Option<&BatchOutcome> {
        self.last_outcome.as_ref()
    }

    /// Begin a batch and start rendering its first scene.
    ///
    /// Rejected without touching the host when the request is empty, a batch
    /// is already running, or a render of an abandoned batch is still in
    /// flight on the host.
    pub fn start<H>(&mut self, host: &mut H, request: RenderBatchRequest) -> Result<()>
    where
        H: RenderHost + ?Sized,
    {
        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }
        if request.is_empty() {
            return Err(Error::EmptySelection);
        }
        if host.render_in_flight() {
            return Err(Error::RenderInFlight);
        }

        self.prepare_render_result(host)?;
        self.reporter.info("Starting scene render queue...");

        let (tx, rx) = mpsc::channel();
        let handle = host.subscribe_render_complete(tx);
        let total = request.len();
        self.batch = Some(ActiveBatch {
            request,
            progress: BatchProgress { index: 0, total },
            subscription: Some(handle),
            events: rx,
            render_started: None,
        });
        self.last_outcome = None;
        self.state = QueueState::Rendering { index: 0, total };

        self.advance(host)
    }

    /// Handle one render-complete signal.
    ///
    /// Signals for other subscriptions or other scenes, or arriving while no
    /// render is in flight, are ignored.
    pub fn on_render_complete<H>(&mut self, host: &mut H, signal: &RenderComplete) -> Result<()>
    where
        H: RenderHost + ?Sized,
    {
        if !matches!(self.state, QueueState::Rendering { .. }) {
            log::debug!("queue: ignoring completion of '{}' while {:?}", signal.scene, self.state);
            return Ok(());
        }
        let Some(batch) = self.batch.as_mut() else {
            return Ok(());
        };
        if batch.subscription != Some(signal.subscription) {
            log::debug!("queue: ignoring completion from foreign subscription #{}", signal.subscription.id());
            return Ok(());
        }
        if batch.request.scenes().get(batch.progress.index) != Some(&signal.scene) {
            log::debug!("queue: ignoring stale completion of '{}'", signal.scene);
            return Ok(());
        }

        log::debug!("queue: render of '{}' complete", signal.scene);
        batch.render_started = None;
        batch.progress.index += 1;
        self.advance(host)
    }

    /// Feed every completion the host delivered to this controller's listener.
    /// Returns how many were handled.
    pub fn process_events<H>(&mut self, host: &mut H) -> Result<usize>
    where
        H: RenderHost + ?Sized,
    {
        let mut handled = 0;
        loop {
            let signal = match self.batch.as_ref().map(|b| b.events.try_recv()) {
                Some(Ok(signal)) => signal,
                _ => break,
            };
            self.on_render_complete(host, &signal)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Process pending completions, then abandon the batch if the render in
    /// flight has exceeded the configured timeout.
    pub fn poll<H>(&mut self, host: &mut H, now: Instant) -> Result<QueueState>
    where
        H: RenderHost + ?Sized,
    {
        self.process_events(host)?;

        let Some(timeout) = self.config.render_timeout() else {
            return Ok(self.state.clone());
        };
        let stalled = self.batch.as_ref().and_then(|b| {
            let started = b.render_started?;
            let elapsed = now.saturating_duration_since(started);
            (elapsed >= timeout).then(|| (b.request.scenes()[b.progress.index].clone(), b.progress.index, elapsed))
        });

        if let Some((scene, index, elapsed)) = stalled {
            let elapsed_ms = elapsed.as_millis() as u64;
            self.reporter.warning(&format!(
                "Render of scene '{}' did not finish within {}ms, abandoning queue",
                scene, elapsed_ms
            ));
            self.teardown(
                host,
                BatchOutcome::Stalled { scene, index, elapsed_ms },
                QueueState::Stalled { index },
            );
        }
        Ok(self.state.clone())
    }

    /// Abandon the running batch. Returns `false` when nothing was running.
    pub fn cancel<H>(&mut self, host: &mut H) -> bool
    where
        H: RenderHost + ?Sized,
    {
        let Some(index) = self.batch.as_ref().map(|b| b.progress.index) else {
            return false;
        };
        self.reporter.warning("Scene render queue cancelled");
        self.teardown(host, BatchOutcome::Cancelled { index }, QueueState::Cancelled { index });
        true
    }

    fn prepare_render_result<H>(&mut self, host: &mut H) -> Result<()>
    where
        H: RenderHost + ?Sized,
    {
        if host.has_render_result() {
            return Ok(());
        }
        if self.config.legacy_warmup_render {
            log::info!("queue: render result missing, running a warm-up render");
            host.render_blocking()?;
            if !host.has_render_result() {
                return Err(Error::RenderResultMissing);
            }
        } else {
            host.ensure_render_result()?;
        }
        Ok(())
    }

    /// Render the current scene, turning a host failure into a failed batch.
    fn advance<H>(&mut self, host: &mut H) -> Result<()>
    where
        H: RenderHost + ?Sized,
    {
        if let Err(err) = self.render_current_scene(host) {
            let index = self.progress().map(|p| p.index).unwrap_or(0);
            log::warn!("queue: aborting at scene {}: {}", index, err);
            self.teardown(
                host,
                BatchOutcome::Failed {
                    index,
                    reason: err.to_string(),
                },
                QueueState::Idle,
            );
            return Err(err);
        }
        Ok(())
    }

    fn render_current_scene<H>(&mut self, host: &mut H) -> Result<()>
    where
        H: RenderHost + ?Sized,
    {
        let Some(batch) = self.batch.as_ref() else {
            return Ok(());
        };
        let BatchProgress { index, total } = batch.progress;
        if index >= total {
            self.finalize(host);
            return Ok(());
        }
        let scene = batch.request.scenes()[index].clone();
        self.state = QueueState::Rendering { index, total };

        host.set_active_scene(&scene)?;
        self.reporter
            .info(&format!("Rendering scene '{}' ({}/{})...", scene, index + 1, total));

        let slot = host.render_result_mut()?.select_or_create(scene.name());
        log::debug!(
            "queue: slot '{}' at {} ({})",
            scene,
            slot.index,
            if slot.created { "created" } else { "reused" }
        );

        host.render_async()?;
        if let Some(batch) = self.batch.as_mut() {
            batch.render_started = Some(Instant::now());
        }
        Ok(())
    }

    fn finalize<H>(&mut self, host: &mut H)
    where
        H: RenderHost + ?Sized,
    {
        let Some(mut batch) = self.batch.take() else {
            return;
        };
        self.state = QueueState::Finalizing;

        if let Some(handle) = batch.subscription.take() {
            host.unsubscribe_render_complete(handle);
        }
        if let Err(err) = host.set_active_scene(batch.request.original_scene()) {
            self.reporter.warning(&format!(
                "Could not restore scene '{}': {}",
                batch.request.original_scene(),
                err
            ));
        }
        self.reporter.info("Finished rendering all selected scenes");

        self.last_outcome = Some(BatchOutcome::Completed {
            rendered: batch.progress.total,
        });
        self.state = QueueState::Idle;
    }

    /// Drop the batch: remove the listener, put the original scene back and
    /// record how it ended.
    fn teardown<H>(&mut self, host: &mut H, outcome: BatchOutcome, state: QueueState)
    where
        H: RenderHost + ?Sized,
    {
        if let Some(mut batch) = self.batch.take() {
            if let Some(handle) = batch.subscription.take() {
                host.unsubscribe_render_complete(handle);
            }
            if let Err(err) = host.set_active_scene(batch.request.original_scene()) {
                log::warn!("queue: could not restore '{}': {}", batch.request.original_scene(), err);
            }
        }
        self.last_outcome = Some(outcome);
        self.state = state;
    }
}
