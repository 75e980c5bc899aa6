//! Append-only collections shared by the concurrent users of a run.
use metrics_util::AtomicBucket;
use stampede_core::{LatencyStats, RequestEvent};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Latencies of successful requests and descriptions of failed ones.
///
/// Every recorded request lands in exactly one of the two collections. The counters mirror the
/// collection sizes so progress can be read without draining the buckets.
pub struct ResultSet {
    success: AtomicU64,
    error: AtomicU64,
    durations: AtomicBucket<Duration>,
    errors: AtomicBucket<String>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSet {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            error: AtomicU64::new(0),
            durations: AtomicBucket::new(),
            errors: AtomicBucket::new(),
        }
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.durations.push(elapsed);
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, error: String) {
        self.errors.push(error);
        self.error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error.load(Ordering::Relaxed)
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.durations.data()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.data()
    }

    pub fn stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_durations(&self.durations())
    }
}

/// Record of every request attempt in a run, owned by the driver and shared with its users.
pub struct EventLog {
    events: AtomicBucket<RequestEvent>,
    len: AtomicUsize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: AtomicBucket::new(),
            len: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, event: RequestEvent) {
        self.events.push(event);
        self.len.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All events recorded so far, ordered by start time.
    pub fn snapshot(&self) -> Vec<RequestEvent> {
        let mut events = self.events.data();
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        events
    }
}
