use crate::LatencyStats;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// A single request attempt as recorded in the event log.
///
/// `timestamp` is the request start in epoch seconds, `duration` the wall time of the call in
/// seconds. `error` is empty for successful requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub timestamp: f64,
    pub duration: f64,
    pub status: Status,
    pub user_id: usize,
    pub error: String,
}

impl RequestEvent {
    pub fn success(started: OffsetDateTime, elapsed: Duration, user_id: usize) -> Self {
        Self {
            timestamp: epoch_secs(started),
            duration: elapsed.as_secs_f64(),
            status: Status::Success,
            user_id,
            error: String::new(),
        }
    }

    pub fn failure(
        started: OffsetDateTime,
        elapsed: Duration,
        user_id: usize,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: epoch_secs(started),
            duration: elapsed.as_secs_f64(),
            status: Status::Error,
            user_id,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

fn epoch_secs(time: OffsetDateTime) -> f64 {
    time.unix_timestamp_nanos() as f64 / 1e9
}

/// Outcome of one ramp batch.
///
/// `stats` is serialized as an empty object when the batch had no successful requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub num_users: usize,
    pub successful: usize,
    pub failed: usize,
    #[serde(with = "empty_stats")]
    pub stats: Option<LatencyStats>,
}

impl BatchStats {
    pub fn new(num_users: usize, durations: &[Duration], failed: usize) -> Self {
        Self {
            num_users,
            successful: durations.len(),
            failed,
            stats: LatencyStats::from_durations(durations),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub max_users: usize,
    pub step_size: usize,
    pub url: Url,
    pub model: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Ramp mode report: the run configuration and per-batch statistics in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub config: ReportConfig,
    pub batches: Vec<BatchStats>,
}

impl Report {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            batches: vec![],
        }
    }

    pub fn push(&mut self, batch: BatchStats) {
        self.batches.push(batch);
    }

    pub fn levels(&self) -> Vec<usize> {
        self.batches.iter().map(|b| b.num_users).collect()
    }
}

/// Summary of a sustained run. Not persisted; the sustained report file holds the raw events.
#[derive(Debug, Clone, PartialEq)]
pub struct SustainedSummary {
    pub num_users: usize,
    pub duration: Duration,
    pub successful: usize,
    pub failed: usize,
    pub stats: Option<LatencyStats>,
    pub cancelled: bool,
}

impl SustainedSummary {
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}

mod empty_stats {
    use crate::LatencyStats;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Stats(LatencyStats),
        Empty(Empty),
    }

    // Only a literal `{}` means "no stats"; a partial stats object is an error.
    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Empty {}

    pub fn serialize<S: Serializer>(stats: &Option<LatencyStats>, s: S) -> Result<S::Ok, S::Error> {
        match stats {
            Some(stats) => Repr::Stats(*stats),
            None => Repr::Empty(Empty {}),
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LatencyStats>, D::Error> {
        Ok(match Repr::deserialize(d)? {
            Repr::Stats(stats) => Some(stats),
            Repr::Empty(_) => None,
        })
    }
}
