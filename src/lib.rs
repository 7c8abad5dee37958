//! Scene Render Queue
//!
//! Renders a selection of scenes one after another, putting each scene's
//! still into its own slot of the host's shared render-result image. Slots
//! are named after their scene and reused when the scene is rendered again.
//!
//! # Features
//!
//! - **One render in flight**: the next scene starts only after the host has
//!   signalled that the previous render completed
//! - **State is restored**: the scene that was active before the batch is
//!   made active again when the batch ends, however it ends
//! - **Host-agnostic**: everything goes through the [`RenderHost`] trait;
//!   [`InMemoryHost`] is a deterministic implementation for tests and demos
//! - **Async facade** (`async` feature, default): [`Sequencer`] runs the queue
//!   on a worker thread and resolves when a batch ends
//!
//! # Example
//!
//! ```
//! use scene_render_queue::{
//!     InMemoryHost, RenderHost, RenderQueueController, RenderScenesToSlots, SceneSelection,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut host = InMemoryHost::new(["Day", "Night", "Layout"]).with_active("Layout");
//! let mut selection = SceneSelection::new();
//! selection.set("Day", true);
//! selection.set("Night", true);
//!
//! let reporter = Arc::new(scene_render_queue::LogReporter);
//! let mut queue = RenderQueueController::new(Default::default(), reporter.clone());
//! RenderScenesToSlots::new(reporter).execute(&mut host, &selection, &mut queue)?;
//!
//! // The host's event loop finishes renders one by one
//! while host.complete_next().is_some() {
//!     queue.process_events(&mut host)?;
//! }
//!
//! assert_eq!(host.active_scene().unwrap().name(), "Layout");
//! assert!(host.render_result().unwrap().slot("Night").is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod operator;
pub mod queue;
pub mod report;
pub mod selection;

// Async-friendly queue API (worker-thread-backed)
#[cfg(feature = "async")]
pub mod async_api;

pub use config::QueueConfig;
pub use error::{Error, Result};
pub use host::{
    CompletionBus, HostEvent, InMemoryHost, RenderComplete, RenderHost, RenderResult, RenderSlot,
    RenderedImage, SceneId, SubscriptionHandle,
};
pub use operator::{OperatorStatus, RenderScenesToSlots};
pub use queue::{BatchOutcome, BatchProgress, QueueState, RenderBatchRequest, RenderQueueController};
pub use report::{CollectingReporter, LogReporter, Report, ReportLevel, ReportSink};
pub use selection::SceneSelection;

#[cfg(feature = "async")]
pub use async_api::Sequencer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_controller_is_idle() {
        let ctl = RenderQueueController::default();
        assert_eq!(ctl.state(), &QueueState::Idle);
        assert!(ctl.last_outcome().is_none());
        assert!(ctl.subscription().is_none());
    }

    #[test]
    fn test_request_keeps_order() {
        let req = RenderBatchRequest::new(["B", "A", "C"], "A");
        let names: Vec<&str> = req.scenes().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(req.len(), 3);
    }
}
