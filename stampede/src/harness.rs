//! Entry point tying the drivers, pre-flight check and report persistence together.
use crate::error::HarnessError;
use crate::preflight::{self, Health};
use crate::ramp::{self, Batch};
use crate::report::write_json;
use crate::results::EventLog;
use crate::sustained;
use crate::transaction::Runner;
use stampede_core::{
    Pacing, RampConfig, Report, RequestEvent, SustainedConfig, SustainedSummary, Target,
    RAMP_EVENTS_FILE, RAMP_REPORT_FILE, SUSTAINED_REPORT_FILE,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Load test harness for a single generate endpoint.
///
/// # Example
/// ```no_run
/// use stampede::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), HarnessError> {
///     let target = Target::new("http://localhost:8000/api/generate", "gemma3:4b")?;
///     let harness = Harness::new(target).output_dir("reports");
///
///     harness.preflight().await;
///     let report = harness.ramp(RampConfig::new(100, 20)?).await?;
///     println!("{} batches", report.batches.len());
///     Ok(())
/// }
/// ```
pub struct Harness {
    target: Target,
    pacing: Pacing,
    output_dir: PathBuf,
    token: CancellationToken,
}

impl Harness {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            pacing: Pacing::default(),
            output_dir: PathBuf::from("."),
            token: CancellationToken::new(),
        }
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Directory the report files are written to (default: the working directory).
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Use an externally owned token to stop a run early.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Handle for stopping the current or next run. Cancellation is cooperative: workers observe
    /// it between requests, never mid-request.
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn report_path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    /// Best-effort health check. The outcome is logged and returned but never stops a run.
    pub async fn preflight(&self) -> Health {
        let url = match self.target.health_url() {
            Ok(url) => url,
            Err(err) => return Health::Unreachable(err.to_string()),
        };

        match self.runner() {
            Ok(runner) => {
                preflight::check(runner.client(), url, self.pacing.preflight_timeout).await
            }
            Err(err) => Health::Unreachable(err.to_string()),
        }
    }

    /// Run a single barrier-joined batch of `users` one-shot requests. Nothing is persisted.
    /// A cancelled token stops launching further requests.
    pub async fn batch(&self, users: usize) -> Result<(Batch, Vec<RequestEvent>), HarnessError> {
        let runner = self.runner()?;
        let log = Arc::new(EventLog::new());
        let batch =
            ramp::run_batch(&runner, users, self.pacing.batch_stagger, &log, &self.token).await;
        Ok((batch, log.snapshot()))
    }

    /// Sustained mode: hold `config.users` users for `config.duration`, then write the raw
    /// events to `sustained_test_report.json`.
    pub async fn sustained(
        &self,
        config: SustainedConfig,
    ) -> Result<SustainedSummary, HarnessError> {
        let runner = self.runner()?;
        let (summary, events) =
            sustained::run_sustained(&runner, config, &self.pacing, &self.token).await;

        write_json(&self.report_path(SUSTAINED_REPORT_FILE), &events).await?;
        Ok(summary)
    }

    /// Ramp mode: run batches up to `config.max_users`, then write the structured report to
    /// `load_test_report.json` and the raw events to `load_test_raw_events.json`.
    pub async fn ramp(&self, config: RampConfig) -> Result<Report, HarnessError> {
        let runner = self.runner()?;
        let (report, events) = ramp::run_ramp(&runner, config, &self.pacing, &self.token).await;

        let report_path = self.report_path(RAMP_REPORT_FILE);
        write_json(&report_path, &report).await?;
        write_json(&self.report_path(RAMP_EVENTS_FILE), &events).await?;

        println!("\nTest Complete. Data saved to {}", display(&report_path));
        info!("Ramp finished with {} batches", report.batches.len());
        Ok(report)
    }

    fn runner(&self) -> Result<Runner, HarnessError> {
        Ok(Runner::new(self.target.clone(), &self.pacing)?)
    }
}

fn display(path: &Path) -> String {
    path.strip_prefix(".").unwrap_or(path).display().to_string()
}
