//! Deterministic in-process host
//!
//! `InMemoryHost` behaves like a host application with a window, a list of
//! scenes and a render subsystem that finishes renders only when its event
//! loop runs ([`complete_next`](InMemoryHost::complete_next) or
//! [`dispatch_events`](RenderHost::dispatch_events)). Every command is
//! written to a journal so tests can assert exact call sequences.

use super::signal::CompletionBus;
use super::slots::{RenderResult, RenderedImage};
use super::{CompletionListener, RenderHost, SceneId, SubscriptionHandle};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A command observed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ActiveSceneChanged(SceneId),
    RenderResultCreated,
    /// Synchronous render (legacy warm-up)
    RenderBlocking(SceneId),
    RenderRequested(SceneId),
    RenderFinished(SceneId),
    /// A render finished but its completion signal was swallowed
    CompletionDropped(SceneId),
    Subscribed(u64),
    Unsubscribed(u64),
}

#[derive(Debug, Clone)]
struct PendingRender {
    scene: SceneId,
    slot_index: usize,
    requested_at: Instant,
}

#[derive(Debug)]
pub struct InMemoryHost {
    scenes: Vec<SceneId>,
    active: Option<SceneId>,
    render_result: Option<RenderResult>,
    bus: CompletionBus,
    pending: VecDeque<PendingRender>,
    journal: Vec<HostEvent>,
    render_count: u64,
    width: u32,
    height: u32,
    render_latency: Duration,
    drop_completions: bool,
    refuse_renders: bool,
}

impl InMemoryHost {
    /// Create a host with the given scenes; the first one starts active.
    pub fn new<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SceneId>,
    {
        let scenes: Vec<SceneId> = scenes.into_iter().map(Into::into).collect();
        let active = scenes.first().cloned();
        Self {
            scenes,
            active,
            render_result: None,
            bus: CompletionBus::new(),
            pending: VecDeque::new(),
            journal: Vec::new(),
            render_count: 0,
            width: 4,
            height: 4,
            render_latency: Duration::ZERO,
            drop_completions: false,
            refuse_renders: false,
        }
    }

    /// Start with `scene` active instead of the first scene
    pub fn with_active(mut self, scene: impl Into<SceneId>) -> Self {
        self.active = Some(scene.into());
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Minimum age of a render before `dispatch_events` finishes it
    pub fn with_render_latency(mut self, latency: Duration) -> Self {
        self.render_latency = latency;
        self
    }

    /// Start with the render-result image already present
    pub fn with_render_result(mut self) -> Self {
        self.render_result = Some(RenderResult::new());
        self
    }

    /// Finish renders without delivering completion signals
    pub fn drop_completions(&mut self, drop: bool) {
        self.drop_completions = drop;
    }

    /// Make `render_async` fail with a host error
    pub fn refuse_renders(&mut self, refuse: bool) {
        self.refuse_renders = refuse;
    }

    pub fn journal(&self) -> &[HostEvent] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn render_result(&self) -> Option<&RenderResult> {
        self.render_result.as_ref()
    }

    /// Renders requested but not finished yet
    pub fn pending_renders(&self) -> usize {
        self.pending.len()
    }

    /// Total renders performed or started, warm-up included
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    /// Scenes passed to `render_async`, in order
    pub fn requested_renders(&self) -> Vec<SceneId> {
        self.journal
            .iter()
            .filter_map(|e| match e {
                HostEvent::RenderRequested(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of active-scene switches
    pub fn scene_switches(&self) -> usize {
        self.journal
            .iter()
            .filter(|e| matches!(e, HostEvent::ActiveSceneChanged(_)))
            .count()
    }

    /// Finish the oldest pending render: store its pixels in the slot that was
    /// active when it was requested, then signal subscribers.
    pub fn complete_next(&mut self) -> Option<SceneId> {
        let job = self.pending.pop_front()?;
        let image = RenderedImage::synthesize(&job.scene, self.next_serial(), self.width, self.height);
        if let Some(rr) = self.render_result.as_mut() {
            if let Some(slot) = rr.slots_mut().get_mut(job.slot_index) {
                slot.image = Some(image);
            }
        }
        self.journal.push(HostEvent::RenderFinished(job.scene.clone()));

        if self.drop_completions {
            log::debug!("host: dropping completion for '{}'", job.scene);
            self.journal.push(HostEvent::CompletionDropped(job.scene.clone()));
        } else {
            let delivered = self.bus.notify(&job.scene);
            log::debug!("host: render of '{}' complete, {} listener(s)", job.scene, delivered);
        }
        Some(job.scene)
    }

    fn next_serial(&mut self) -> u64 {
        self.render_count += 1;
        self.render_count
    }

    fn require_scene(&self, scene: &SceneId) -> Result<()> {
        if self.scenes.contains(scene) {
            Ok(())
        } else {
            Err(Error::UnknownScene(scene.to_string()))
        }
    }
}

impl RenderHost for InMemoryHost {
    fn scenes(&self) -> Vec<SceneId> {
        self.scenes.clone()
    }

    fn active_scene(&self) -> Option<SceneId> {
        self.active.clone()
    }

    fn set_active_scene(&mut self, scene: &SceneId) -> Result<()> {
        self.require_scene(scene)?;
        self.active = Some(scene.clone());
        self.journal.push(HostEvent::ActiveSceneChanged(scene.clone()));
        Ok(())
    }

    fn has_render_result(&self) -> bool {
        self.render_result.is_some()
    }

    fn ensure_render_result(&mut self) -> Result<bool> {
        if self.render_result.is_some() {
            return Ok(false);
        }
        self.render_result = Some(RenderResult::new());
        self.journal.push(HostEvent::RenderResultCreated);
        Ok(true)
    }

    fn render_blocking(&mut self) -> Result<()> {
        let scene = self.active.clone().ok_or_else(|| Error::Host("no active scene".to_string()))?;
        // Rendering is what makes the host create its result image.
        self.ensure_render_result()?;
        let image = RenderedImage::synthesize(&scene, self.next_serial(), self.width, self.height);
        if let Some(slot) = self.render_result.as_mut().and_then(|rr| rr.active_slot_mut()) {
            slot.image = Some(image);
        }
        self.journal.push(HostEvent::RenderBlocking(scene));
        Ok(())
    }

    fn render_result_mut(&mut self) -> Result<&mut RenderResult> {
        self.render_result.as_mut().ok_or(Error::RenderResultMissing)
    }

    fn render_async(&mut self) -> Result<()> {
        if self.refuse_renders {
            return Err(Error::Host("render refused".to_string()));
        }
        let scene = self.active.clone().ok_or_else(|| Error::Host("no active scene".to_string()))?;
        let slot_index = self
            .render_result
            .as_ref()
            .map(|rr| rr.active_index())
            .ok_or(Error::RenderResultMissing)?;
        self.pending.push_back(PendingRender {
            scene: scene.clone(),
            slot_index,
            requested_at: Instant::now(),
        });
        self.journal.push(HostEvent::RenderRequested(scene));
        Ok(())
    }

    fn render_in_flight(&self) -> bool {
        !self.pending.is_empty()
    }

    fn subscribe_render_complete(&mut self, listener: CompletionListener) -> SubscriptionHandle {
        let handle = self.bus.subscribe(listener);
        self.journal.push(HostEvent::Subscribed(handle.id()));
        handle
    }

    fn unsubscribe_render_complete(&mut self, handle: SubscriptionHandle) -> bool {
        let removed = self.bus.unsubscribe(handle);
        if removed {
            self.journal.push(HostEvent::Unsubscribed(handle.id()));
        }
        removed
    }

    fn dispatch_events(&mut self) -> usize {
        let mut finished = 0;
        while let Some(job) = self.pending.front() {
            if job.requested_at.elapsed() < self.render_latency {
                break;
            }
            self.complete_next();
            finished += 1;
        }
        finished
    }
}
