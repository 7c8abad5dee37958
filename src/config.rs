//! Queue configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a [`RenderQueueController`](crate::queue::RenderQueueController)
///
/// The defaults keep the classic behaviour of the queue: no timeout, so a
/// render that never signals completion leaves the batch waiting, and no
/// warm-up render.
///
/// # Examples
///
/// ```
/// let cfg = scene_render_queue::QueueConfig::default();
/// assert!(cfg.render_timeout_ms.is_none());
/// assert!(!cfg.legacy_warmup_render);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum time to wait for a single render to complete, in milliseconds.
    /// `None` waits forever.
    pub render_timeout_ms: Option<u64>,
    /// When the render-result image is missing, run one throwaway render to
    /// make the host create it instead of asking the host to create it.
    pub legacy_warmup_render: bool,
    /// Event loop tick used by the background sequencer, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: None,
            legacy_warmup_render: false,
            poll_interval_ms: 10,
        }
    }
}

impl QueueConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text and validate it
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: QueueConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would make the queue misbehave
    pub fn validate(&self) -> Result<()> {
        if self.render_timeout_ms == Some(0) {
            return Err(Error::Config("render_timeout_ms must be greater than zero".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn render_timeout(&self) -> Option<Duration> {
        self.render_timeout_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
