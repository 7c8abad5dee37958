//! The shared render-result image and its named slots

use super::SceneId;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Name the host gives its shared render-result image
pub const RENDER_RESULT_NAME: &str = "Render Result";

/// Pixels produced by one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row major
    pub pixels: Vec<u8>,
    /// Scene that was rendered
    pub scene: SceneId,
    /// Host-wide render counter at the time of the render
    pub serial: u64,
}

impl RenderedImage {
    /// Deterministic stand-in for a real render: the pixel stream is a SHA-256
    /// expansion of the scene name and render serial.
    pub fn synthesize(scene: &SceneId, serial: u64, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        let mut pixels = Vec::with_capacity(len);
        let mut block = 0u64;
        while pixels.len() < len {
            let mut hasher = Sha256::new();
            hasher.update(scene.name().as_bytes());
            hasher.update(serial.to_le_bytes());
            hasher.update(block.to_le_bytes());
            let chunk = hasher.finalize();
            let take = (len - pixels.len()).min(chunk.len());
            pixels.extend_from_slice(&chunk[..take]);
            block += 1;
        }
        Self {
            width,
            height,
            pixels,
            scene: scene.clone(),
            serial,
        }
    }

    /// Hex SHA-256 of the pixel data
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.pixels))
    }
}

/// One named sub-image of the render result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSlot {
    pub name: String,
    pub image: Option<RenderedImage>,
}

impl RenderSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }
}

/// Result of [`RenderResult::select_or_create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSelection {
    pub index: usize,
    pub created: bool,
}

/// Summary of a slot, for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub name: String,
    pub scene: Option<String>,
    pub serial: Option<u64>,
    pub digest: Option<String>,
}

/// The shared render-result image: an ordered collection of named slots, one
/// of which is active and receives the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub name: String,
    slots: Vec<RenderSlot>,
    active_index: usize,
}

impl Default for RenderResult {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderResult {
    /// A fresh render result with the host's single default slot
    pub fn new() -> Self {
        Self {
            name: RENDER_RESULT_NAME.to_string(),
            slots: vec![RenderSlot::new("Slot 1")],
            active_index: 0,
        }
    }

    pub fn slots(&self) -> &[RenderSlot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [RenderSlot] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Index of the first slot called `name`
    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn slot(&self, name: &str) -> Option<&RenderSlot> {
        self.find_slot(name).map(|i| &self.slots[i])
    }

    pub fn active_slot(&self) -> Option<&RenderSlot> {
        self.slots.get(self.active_index)
    }

    pub fn active_slot_mut(&mut self) -> Option<&mut RenderSlot> {
        self.slots.get_mut(self.active_index)
    }

    /// Make the slot at `index` active. Returns `false` when out of range.
    pub fn set_active_index(&mut self, index: usize) -> bool {
        if index < self.slots.len() {
            self.active_index = index;
            true
        } else {
            false
        }
    }

    /// Activate the slot called `name`, creating it at the end when missing.
    /// An existing slot is reused so its next render overwrites it.
    pub fn select_or_create(&mut self, name: &str) -> SlotSelection {
        if let Some(index) = self.find_slot(name) {
            self.active_index = index;
            return SlotSelection { index, created: false };
        }
        self.slots.push(RenderSlot::new(name));
        self.active_index = self.slots.len() - 1;
        SlotSelection {
            index: self.active_index,
            created: true,
        }
    }

    pub fn summaries(&self) -> Vec<SlotSummary> {
        self.slots
            .iter()
            .map(|s| SlotSummary {
                name: s.name.clone(),
                scene: s.image.as_ref().map(|i| i.scene.to_string()),
                serial: s.image.as_ref().map(|i| i.serial),
                digest: s.image.as_ref().map(|i| i.digest()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_or_create_reuses_existing_names() {
        let mut rr = RenderResult::new();
        let a = rr.select_or_create("A");
        assert!(a.created);
        assert_eq!(rr.active_index(), a.index);

        let b = rr.select_or_create("B");
        assert!(b.created);

        let again = rr.select_or_create("A");
        assert!(!again.created);
        assert_eq!(again.index, a.index);
        assert_eq!(rr.active_index(), a.index);
        assert_eq!(rr.len(), 3);
    }

    #[test]
    fn synthesized_images_depend_on_scene_and_serial() {
        let a1 = RenderedImage::synthesize(&SceneId::from("A"), 1, 8, 4);
        let a1_again = RenderedImage::synthesize(&SceneId::from("A"), 1, 8, 4);
        let a2 = RenderedImage::synthesize(&SceneId::from("A"), 2, 8, 4);
        let b1 = RenderedImage::synthesize(&SceneId::from("B"), 1, 8, 4);

        assert_eq!(a1.pixels.len(), 8 * 4 * 4);
        assert_eq!(a1.digest(), a1_again.digest());
        assert_ne!(a1.digest(), a2.digest());
        assert_ne!(a1.digest(), b1.digest());
    }

    #[test]
    fn set_active_index_rejects_out_of_range() {
        let mut rr = RenderResult::new();
        assert!(rr.set_active_index(0));
        assert!(!rr.set_active_index(5));
    }
}
