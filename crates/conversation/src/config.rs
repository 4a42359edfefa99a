use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Wait between arming a cycle and capturing its frame.
pub const DEFAULT_CYCLE_DELAY: Duration = Duration::from_millis(5000);

/// How long a decisive result stays on screen before the next question.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Timing of the detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub cycle_delay_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: DEFAULT_CYCLE_DELAY.as_millis() as u64,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
        }
    }
}

impl SchedulerConfig {
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
