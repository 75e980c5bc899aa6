//! Load-test harness for text-generation HTTP endpoints.
//!
//! Two modes are provided: a ramp test stepping concurrency up across barrier-joined batches,
//! and a sustained test holding a fixed number of virtual users for a fixed duration. Both
//! record every request in an event log and persist JSON reports when done.

pub mod harness;
pub mod preflight;
pub mod results;

mod error;
mod ramp;
mod report;
mod sustained;
mod transaction;

pub use error::*;
pub use harness::Harness;
pub use ramp::Batch;
pub use stampede_core as core;

pub mod prelude {
    pub use crate::error::{HarnessError, RequestError};
    pub use crate::harness::Harness;
    pub use crate::preflight::Health;
    pub use stampede_core::{
        BatchStats, LatencyStats, Pacing, RampConfig, Report, RequestEvent, Status,
        SustainedConfig, SustainedSummary, Target,
    };
    pub use tokio_util::sync::CancellationToken;
}
