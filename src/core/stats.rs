//! Navigation statistics

use std::collections::VecDeque;
use std::time::Duration;

/// Counters and step timings for one simulation run
#[derive(Debug)]
pub struct NavStats {
    /// Wall-clock cost of recent steps
    step_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Average step cost in milliseconds
    avg_step_ms: f32,
    /// Worst step cost in the window, in milliseconds
    max_step_ms: f32,
    ticks: u64,
    path_requests: u64,
    path_failures: u64,
    waypoints_reached: u64,
}

impl NavStats {
    /// Create empty stats
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_times: VecDeque::with_capacity(120),
            max_samples: 120,
            avg_step_ms: 0.0,
            max_step_ms: 0.0,
            ticks: 0,
            path_requests: 0,
            path_failures: 0,
            waypoints_reached: 0,
        }
    }

    /// Record a finished step and how long it took
    pub fn record_tick(&mut self, cost: Duration) {
        self.ticks += 1;

        if self.step_times.len() >= self.max_samples {
            self.step_times.pop_front();
        }
        self.step_times.push_back(cost);

        let total: Duration = self.step_times.iter().sum();
        let max = self.step_times.iter().max().copied().unwrap_or_default();
        self.avg_step_ms = total.as_secs_f32() * 1000.0 / self.step_times.len() as f32;
        self.max_step_ms = max.as_secs_f32() * 1000.0;
    }

    /// Record a path request and whether it succeeded
    pub fn record_request(&mut self, ok: bool) {
        self.path_requests += 1;
        if !ok {
            self.path_failures += 1;
        }
    }

    /// Record a reached waypoint
    pub fn record_waypoint(&mut self) {
        self.waypoints_reached += 1;
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn path_requests(&self) -> u64 {
        self.path_requests
    }

    #[must_use]
    pub fn path_failures(&self) -> u64 {
        self.path_failures
    }

    #[must_use]
    pub fn waypoints_reached(&self) -> u64 {
        self.waypoints_reached
    }

    /// Average step cost over the recent window
    #[must_use]
    pub fn avg_step_ms(&self) -> f32 {
        self.avg_step_ms
    }

    /// Worst step cost over the recent window
    #[must_use]
    pub fn max_step_ms(&self) -> f32 {
        self.max_step_ms
    }

    /// One-line summary
    #[must_use]
    pub fn format_stats(&self) -> String {
        format!(
            "Ticks: {} | Paths: {} ({} failed) | Waypoints: {} | Step: {:.3}ms (max: {:.3})",
            self.ticks,
            self.path_requests,
            self.path_failures,
            self.waypoints_reached,
            self.avg_step_ms,
            self.max_step_ms
        )
    }

    /// Reset everything
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for NavStats {
    fn default() -> Self {
        Self::new()
    }
}
