use crate::host::RenderHost;
use crate::queue::{BatchOutcome, QueueState, RenderBatchRequest, RenderQueueController};
use crate::report::ReportSink;
use crate::{Error, QueueConfig, Result};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tokio::sync::oneshot;

enum Command<H> {
    Submit(RenderBatchRequest, oneshot::Sender<Result<BatchOutcome>>),
    Cancel(oneshot::Sender<Result<bool>>),
    State(oneshot::Sender<Result<QueueState>>),
    Shutdown(oneshot::Sender<H>),
}

/// An async-friendly render queue backed by a dedicated worker thread.
///
/// The worker thread owns the host and the queue controller and acts as the
/// host's event loop: between commands it lets the host deliver finished
/// renders and advances the queue. Async callers only exchange messages with
/// it, so the host itself never has to be shared across threads.
pub struct Sequencer<H> {
    cmd_tx: Sender<Command<H>>,
}

impl<H> Clone for Sequencer<H> {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
        }
    }
}

impl<H> Sequencer<H>
where
    H: RenderHost + Send + 'static,
{
    /// Move `host` onto a new worker thread and start its event loop.
    pub async fn new(host: H, config: Option<QueueConfig>, reporter: Arc<dyn ReportSink>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command<H>>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            let mut host = host;
            if let Err(err) = config.validate() {
                let _ = init_tx.send(Err(err));
                return;
            }
            let tick = config.poll_interval();
            let mut controller = RenderQueueController::new(config, reporter);
            let mut waiter: Option<oneshot::Sender<Result<BatchOutcome>>> = None;
            // Submit held back until an abandoned render has finished
            let mut deferred: Option<(RenderBatchRequest, oneshot::Sender<Result<BatchOutcome>>)> = None;

            let _ = init_tx.send(Ok(()));

            loop {
                match cmd_rx.recv_timeout(tick) {
                    Ok(Command::Submit(request, resp)) => {
                        if controller.is_running() || deferred.is_some() {
                            let _ = resp.send(Err(Error::AlreadyRunning));
                        } else if !request.is_empty() && host.render_in_flight() {
                            log::debug!("sequencer: waiting for an abandoned render before starting");
                            deferred = Some((request, resp));
                        } else {
                            match controller.start(&mut host, request) {
                                Ok(()) => waiter = Some(resp),
                                Err(err) => {
                                    let _ = resp.send(Err(err));
                                }
                            }
                        }
                    }
                    Ok(Command::Cancel(resp)) => {
                        let mut cancelled = controller.cancel(&mut host);
                        if let Some((_, pending)) = deferred.take() {
                            let _ = pending.send(Err(Error::Cancelled));
                            cancelled = true;
                        }
                        let _ = resp.send(Ok(cancelled));
                    }
                    Ok(Command::State(resp)) => {
                        let _ = resp.send(Ok(controller.state().clone()));
                    }
                    Ok(Command::Shutdown(resp)) => {
                        controller.cancel(&mut host);
                        if let Some(waiter) = waiter.take() {
                            let _ = waiter.send(Err(Error::Cancelled));
                        }
                        if let Some((_, pending)) = deferred.take() {
                            let _ = pending.send(Err(Error::Cancelled));
                        }
                        let _ = resp.send(host);
                        return;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        controller.cancel(&mut host);
                        return;
                    }
                }

                // One event-loop iteration of the host
                host.dispatch_events();
                if let Err(err) = controller.poll(&mut host, Instant::now()) {
                    log::warn!("sequencer: batch aborted: {}", err);
                }

                if !controller.is_running() {
                    if let Some(waiter) = waiter.take() {
                        let outcome = controller
                            .last_outcome()
                            .cloned()
                            .ok_or_else(|| Error::Worker("batch ended without an outcome".to_string()));
                        let _ = waiter.send(outcome);
                    }
                    if !host.render_in_flight() {
                        if let Some((request, resp)) = deferred.take() {
                            match controller.start(&mut host, request) {
                                Ok(()) => waiter = Some(resp),
                                Err(err) => {
                                    let _ = resp.send(Err(err));
                                }
                            }
                        }
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Worker(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Run a batch and wait until it completes, stalls or is cancelled.
    ///
    /// When a render left behind by a cancelled or stalled batch is still
    /// running in the host, the batch starts once that render has finished.
    pub async fn submit(&self, request: RenderBatchRequest) -> Result<BatchOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Submit(request, tx))?;
        rx.await
            .map_err(|e| Error::Worker(format!("Submit canceled: {}", e)))?
    }

    /// Cancel the running batch. Resolves to `false` when nothing was running.
    pub async fn cancel(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Cancel(tx))?;
        rx.await
            .map_err(|e| Error::Worker(format!("Cancel canceled: {}", e)))?
    }

    pub async fn state(&self) -> Result<QueueState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::State(tx))?;
        rx.await
            .map_err(|e| Error::Worker(format!("State canceled: {}", e)))?
    }

    /// Stop the worker and hand the host back. A running batch is cancelled.
    pub async fn shutdown(self) -> Result<H> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        rx.await
            .map_err(|e| Error::Worker(format!("Shutdown canceled: {}", e)))
    }

    fn send(&self, cmd: Command<H>) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Worker("sequencer worker has stopped".to_string()))
    }
}
