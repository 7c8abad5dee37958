//! "Render Selected Scenes to Slots" entry point
//!
//! Collects the ticked scenes in host order, remembers which scene is active,
//! and hands both to the queue controller.

use crate::host::RenderHost;
use crate::queue::{RenderBatchRequest, RenderQueueController};
use crate::report::ReportSink;
use crate::selection::SceneSelection;
use crate::{Error, Result};
use std::sync::Arc;

/// How an operator invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorStatus {
    /// The batch was started
    Finished,
    /// Nothing to do; no state was changed
    Cancelled,
}

pub struct RenderScenesToSlots {
    reporter: Arc<dyn ReportSink>,
}

impl RenderScenesToSlots {
    pub const ID: &'static str = "render.render_scenes_to_slots";
    pub const LABEL: &'static str = "Render Selected Scenes to Slots";
    pub const DESCRIPTION: &'static str =
        "Render one still from each selected scene into its own render slot (named after the scene)";

    pub fn new(reporter: Arc<dyn ReportSink>) -> Self {
        Self { reporter }
    }

    /// Build the batch request for the current selection, or `None` when no
    /// scene is selected.
    pub fn request_for<H>(host: &H, selection: &SceneSelection) -> Result<Option<RenderBatchRequest>>
    where
        H: RenderHost + ?Sized,
    {
        let scenes = selection.selected_in(&host.scenes());
        if scenes.is_empty() {
            return Ok(None);
        }
        let original = host
            .active_scene()
            .ok_or_else(|| Error::Host("no active scene to return to".to_string()))?;
        Ok(Some(RenderBatchRequest::new(scenes, original)))
    }

    /// Start a batch for every selected scene.
    ///
    /// An empty selection is reported as a warning and leaves host and
    /// controller untouched.
    pub fn execute<H>(
        &self,
        host: &mut H,
        selection: &SceneSelection,
        controller: &mut RenderQueueController,
    ) -> Result<OperatorStatus>
    where
        H: RenderHost + ?Sized,
    {
        let Some(request) = Self::request_for(host, selection)? else {
            self.reporter.warning("No scenes selected.");
            return Ok(OperatorStatus::Cancelled);
        };
        controller.start(host, request)?;
        Ok(OperatorStatus::Finished)
    }
}
