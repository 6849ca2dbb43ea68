//! Canvas configuration.

use serde::Deserialize;
use std::time::Duration;

/// Tunables for a hosting canvas. Every field has a default, so a partial
/// JSON object (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// How long hovers are ignored after a drop or drag-end.
    pub cooldown_ms: u64,
    /// Forward every Nth dragover to the event sink. 0 and 1 forward all.
    pub dragover_sample_every: u32,
    /// Events retained by the log from `Canvas::attach_event_log`.
    pub event_log_capacity: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 300,
            dragover_sample_every: 10,
            event_log_capacity: 10,
        }
    }
}

impl CanvasConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_ms = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_dragover_sampling(mut self, every: u32) -> Self {
        self.dragover_sample_every = every;
        self
    }
}
