//! Engine tuning knobs.
//!
//! Hosts usually embed this in their own settings file, so it is
//! serde-friendly and every field falls back to its default.

use crate::model::ordering::{OrderingScheme, DEFAULT_POSITION_BASE, DEFAULT_POSITION_STEP};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WRITE_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before queued writes are flushed.
    pub write_delay_ms: u64,
    /// Position of the first item in an empty note.
    pub position_base: f64,
    /// Gap left after the last item on append.
    pub position_step: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            write_delay_ms: DEFAULT_WRITE_DELAY_MS,
            position_base: DEFAULT_POSITION_BASE,
            position_step: DEFAULT_POSITION_STEP,
        }
    }
}

impl EngineConfig {
    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn ordering(&self) -> OrderingScheme {
        OrderingScheme::new(self.position_base, self.position_step)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use std::time::Duration;

    #[test]
    fn defaults_match_two_second_quiet_period() {
        let config = EngineConfig::default();
        assert_eq!(config.write_delay(), Duration::from_secs(2));
        assert_eq!(config.position_base, 1000.0);
        assert_eq!(config.position_step, 1000.0);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"write_delay_ms": 250}"#).unwrap();
        assert_eq!(config.write_delay(), Duration::from_millis(250));
        assert_eq!(config.position_step, 1000.0);
    }
}
