//! Scene selection: which scenes take part in the next batch

use crate::host::SceneId;
use std::collections::HashMap;

/// Per-scene "Render" checkbox state. Scenes never touched are not selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSelection {
    flags: HashMap<SceneId, bool>,
}

impl SceneSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection with every scene in `scenes` ticked
    pub fn from_scenes<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SceneId>,
    {
        let mut sel = Self::new();
        for scene in scenes {
            sel.set(scene, true);
        }
        sel
    }

    pub fn set(&mut self, scene: impl Into<SceneId>, use_scene: bool) {
        self.flags.insert(scene.into(), use_scene);
    }

    /// Flip a scene's flag and return the new value
    pub fn toggle(&mut self, scene: impl Into<SceneId>) -> bool {
        let flag = self.flags.entry(scene.into()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn is_selected(&self, scene: &SceneId) -> bool {
        self.flags.get(scene).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    /// Selected scenes in the order given by `order` (normally the host's
    /// scene list). Flags for scenes missing from `order` are ignored.
    pub fn selected_in(&self, order: &[SceneId]) -> Vec<SceneId> {
        order.iter().filter(|s| self.is_selected(s)).cloned().collect()
    }
}
