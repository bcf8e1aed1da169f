use crate::agent_engine::state::{LoopConfig, SessionEnd};

/// Tracks the session-level limits checked between iterations.
pub struct LoopController {
    config: LoopConfig,
    start_time: std::time::Instant,
    iterations: u32,
    consecutive_failures: u32,
}

impl LoopController {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            start_time: std::time::Instant::now(),
            iterations: 0,
            consecutive_failures: 0,
        }
    }

    pub fn record_iteration(&mut self) {
        self.iterations += 1;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// First limit that has been reached, if any.
    pub fn should_stop(&self) -> Option<SessionEnd> {
        if let Some(max) = self.config.max_iterations {
            if self.iterations >= max {
                return Some(SessionEnd::IterationLimit);
            }
        }
        if let Some(max_min) = self.config.max_duration_minutes {
            if self.start_time.elapsed().as_secs() / 60 >= max_min as u64 {
                return Some(SessionEnd::TimeLimit);
            }
        }
        if let Some(max_fail) = self.config.max_consecutive_failures {
            if max_fail > 0 && self.consecutive_failures >= max_fail {
                return Some(SessionEnd::FailureLimit);
            }
        }
        None
    }
}
