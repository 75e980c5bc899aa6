//! Command-line runtime for the stampede harness.
//!
//! Parses the command line, wires Ctrl-C to the harness cancellation token, runs the pre-flight
//! check and then one of the two test modes.
use clap::Parser;
#[cfg(feature = "metrics")]
use metrics_exporter_prometheus::PrometheusBuilder;
use stampede::core::{
    ConfigError, RampConfig, SustainedConfig, Target, DEFAULT_MAX_USERS, DEFAULT_MODEL,
    DEFAULT_STEP_SIZE, DEFAULT_SUSTAINED_USERS, DEFAULT_URL,
};
use stampede::Harness;
#[cfg(feature = "metrics")]
use std::net::SocketAddr;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn, Instrument};

#[derive(Parser, Debug)]
#[command(version, about = "Load test a text-generation endpoint")]
pub struct StampedeCli {
    /// Max concurrent users (ramp mode)
    #[arg(long = "max_users", alias = "max-users", default_value_t = DEFAULT_MAX_USERS)]
    pub max_users: usize,

    /// Users to add per step (ramp mode)
    #[arg(long = "step_size", alias = "step-size", default_value_t = DEFAULT_STEP_SIZE)]
    pub step_size: usize,

    /// Duration in seconds for sustained test (0 = ramp mode)
    #[arg(long, default_value_t = 0)]
    pub duration: u64,

    /// Concurrent users for sustained test
    #[arg(long, default_value_t = DEFAULT_SUSTAINED_USERS)]
    pub users: usize,

    /// API endpoint
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Directory for the JSON reports
    #[arg(long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Serve Prometheus metrics on this address while the test runs
    #[cfg(feature = "metrics")]
    #[arg(long = "metrics-addr")]
    pub metrics_addr: Option<SocketAddr>,

    /// Log filter directive, overridden by RUST_LOG
    #[arg(long, default_value = "stampede=info")]
    pub log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ramp(RampConfig),
    Sustained(SustainedConfig),
}

impl StampedeCli {
    /// A non-zero `--duration` selects sustained mode, otherwise ramp mode.
    pub fn mode(&self) -> Result<Mode, ConfigError> {
        if self.duration > 0 {
            let duration = Duration::from_secs(self.duration);
            Ok(Mode::Sustained(SustainedConfig::new(self.users, duration)?))
        } else {
            Ok(Mode::Ramp(RampConfig::new(self.max_users, self.step_size)?))
        }
    }

    pub fn target(&self) -> Result<Target, ConfigError> {
        Target::new(&self.url, &self.model)
    }
}

pub struct StampedeRuntime {
    cli: StampedeCli,
}

impl StampedeRuntime {
    pub fn new(cli: StampedeCli) -> Self {
        Self { cli }
    }

    #[instrument(name = "stampede", skip_all)]
    pub async fn run(self) -> anyhow::Result<()> {
        let target = self.cli.target()?;
        let mode = self.cli.mode()?;

        #[cfg(feature = "metrics")]
        if let Some(addr) = self.cli.metrics_addr {
            PrometheusBuilder::new().with_http_listener(addr).install()?;
            info!("Serving metrics on {addr}");
        }

        let token = CancellationToken::new();
        spawn_interrupt_handler(token.clone());

        let harness = Harness::new(target)
            .output_dir(&self.cli.output_dir)
            .cancel_token(token);

        let health = harness.preflight().await;
        debug!("Pre-flight: {health}");

        match mode {
            Mode::Ramp(config) => {
                harness.ramp(config).await?;
            }
            Mode::Sustained(config) => {
                harness.sustained(config).await?;
            }
        }

        Ok(())
    }
}

/// Exit status for a run aborted by a second interrupt (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(
        async move {
            match watch_interrupts(token, tokio::signal::ctrl_c).await {
                Ok(()) => std::process::exit(FORCED_EXIT_CODE),
                Err(err) => error!("Unable to listen for interrupts: {err}"),
            }
        }
        .in_current_span(),
    );
}

/// The first interrupt cancels the run gracefully. Returns on the second one, which means the
/// operator does not want to wait for in-flight requests.
async fn watch_interrupts<F, Fut>(token: CancellationToken, mut interrupt: F) -> std::io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    interrupt().await?;
    info!("Interrupt received, stopping after in-flight requests finish. Press Ctrl-C again to exit now.");
    token.cancel();

    interrupt().await?;
    warn!("Second interrupt received, exiting without waiting for in-flight requests.");
    Ok(())
}
