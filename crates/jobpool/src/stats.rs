//! Observability counters
//!
//! The original design keeps "running-average counters for observability" on
//! the pool and calls the per-job timing counters removable without behavior
//! change. Here they are promoted to a small, structured snapshot rather than
//! left as ad hoc debug counters, but they remain pure bookkeeping: reading
//! them never blocks a worker and never changes scheduling behavior.

use std::time::Duration;

/// Point-in-time snapshot of pool-wide counters, taken under the pool mutex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub jobs_dispatched: u64,
    pub jobs_completed: u64,
    pub jobs_dropped_on_shutdown: u64,
    pub workers_idle: usize,
    pub workers_busy: usize,
    pub avg_job_latency: Duration,
}

/// Point-in-time snapshot of one queue's counters, taken under the pool mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub dispatched: u64,
    pub delivered: u64,
    pub dropped_on_shutdown: u64,
    pub n_input: usize,
    pub n_processing: usize,
    pub n_output: usize,
}

/// Running exponential average, updated one sample at a time under the lock
///
/// alpha = 1/8 matches the cheap shift-based EWMA used by the teacher's
/// scheduler counters; no floating point division per sample.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningAverage {
    avg_nanos: u64,
    samples: u64,
}

impl RunningAverage {
    pub fn sample(&mut self, value: Duration) {
        let v = value.as_nanos().min(u64::MAX as u128) as u64;
        if self.samples == 0 {
            self.avg_nanos = v;
        } else {
            self.avg_nanos = self.avg_nanos - (self.avg_nanos >> 3) + (v >> 3);
        }
        self.samples += 1;
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.avg_nanos)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PoolStatsInner {
    pub jobs_dispatched: u64,
    pub jobs_completed: u64,
    pub jobs_dropped_on_shutdown: u64,
    pub job_latency: RunningAverage,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QueueStatsInner {
    pub dispatched: u64,
    pub delivered: u64,
    pub dropped_on_shutdown: u64,
}
