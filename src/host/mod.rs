//! Host application surface: scenes, the render-result image, and the
//! render-complete signal.
//!
//! The queue never renders anything itself. It drives a [`RenderHost`], which
//! owns the scenes, the shared render-result image and the render subsystem,
//! and which reports finished renders through a completion signal.

pub mod memory;
pub mod signal;
pub mod slots;

pub use memory::{HostEvent, InMemoryHost};
pub use signal::{CompletionBus, RenderComplete, SubscriptionHandle};
pub use slots::{RenderResult, RenderSlot, RenderedImage, SlotSelection, RENDER_RESULT_NAME};

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc::Sender;

/// Identifier of a scene in the host application (its name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(name: impl Into<String>) -> Self {
        SceneId(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(name: &str) -> Self {
        SceneId(name.to_string())
    }
}

impl From<String> for SceneId {
    fn from(name: String) -> Self {
        SceneId(name)
    }
}

/// Listener end handed to the host when subscribing to render completions
pub type CompletionListener = Sender<RenderComplete>;

/// Commands the queue needs from the host application.
pub trait RenderHost {
    /// All scenes known to the host, in host order
    fn scenes(&self) -> Vec<SceneId>;

    /// The scene currently shown in the window, if any
    fn active_scene(&self) -> Option<SceneId>;

    /// Make `scene` the active scene
    fn set_active_scene(&mut self, scene: &SceneId) -> Result<()>;

    /// Whether the shared render-result image exists yet
    fn has_render_result(&self) -> bool;

    /// Create the shared render-result image if it is missing.
    /// Returns `true` when it had to be created.
    fn ensure_render_result(&mut self) -> Result<bool>;

    /// Render the active scene and wait for it. Only used for the legacy
    /// warm-up render; no completion signal is delivered for it.
    fn render_blocking(&mut self) -> Result<()>;

    /// The shared render-result image and its slots
    fn render_result_mut(&mut self) -> Result<&mut RenderResult>;

    /// Whether a render started with `render_async` has not finished yet
    fn render_in_flight(&self) -> bool;

    /// Start rendering the active scene into the active slot without waiting.
    /// A [`RenderComplete`] is delivered to every subscriber once it finishes.
    fn render_async(&mut self) -> Result<()>;

    /// Register a listener for render-complete signals
    fn subscribe_render_complete(&mut self, listener: CompletionListener) -> SubscriptionHandle;

    /// Remove a listener. Returns `false` when the handle was not registered.
    fn unsubscribe_render_complete(&mut self, handle: SubscriptionHandle) -> bool;

    /// Give the host's event loop a chance to deliver due completions.
    /// Returns the number of renders that finished.
    fn dispatch_events(&mut self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_displays_its_name() {
        let id = SceneId::from("Kitchen");
        assert_eq!(id.to_string(), "Kitchen");
        assert_eq!(id.name(), "Kitchen");
        assert_eq!(id, SceneId::new(String::from("Kitchen")));
    }
}
