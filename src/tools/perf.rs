//! Elapsed-time measurement for `ToolPerformance` rows.

use std::time::Duration;
use std::time::Instant;

pub struct ToolTimer {
    started: Instant,
}

impl ToolTimer {
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
