//! Named start/end timing around computations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Receives start/end notifications for named computations.
pub trait Profiler: Send + Sync {
    fn start(&self, name: &str);
    fn end(&self, name: &str);
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    fn start(&self, _name: &str) {}
    fn end(&self, _name: &str) {}
}

/// Logs elapsed time per computation and keeps the totals.
#[derive(Debug, Default)]
pub struct TracingProfiler {
    started: Mutex<HashMap<String, Instant>>,
    timings: Mutex<Vec<(String, Duration)>>,
}

impl TracingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed timings in completion order.
    pub fn timings(&self) -> Vec<(String, Duration)> {
        self.timings
            .lock()
            .map(|timings| timings.clone())
            .unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.timings().iter().map(|(_, elapsed)| *elapsed).sum()
    }
}

impl Profiler for TracingProfiler {
    fn start(&self, name: &str) {
        if let Ok(mut started) = self.started.lock() {
            started.insert(name.to_string(), Instant::now());
        }
    }

    fn end(&self, name: &str) {
        let Some(start) = self
            .started
            .lock()
            .ok()
            .and_then(|mut started| started.remove(name))
        else {
            tracing::warn!(operation = %name, "Profile end without matching start");
            return;
        };

        let elapsed = start.elapsed();
        tracing::debug!(
            operation = %name,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Computed"
        );
        if let Ok(mut timings) = self.timings.lock() {
            timings.push((name.to_string(), elapsed));
        }
    }
}
