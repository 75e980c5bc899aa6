//! Fixed concurrency held for a fixed wall-clock duration.
use crate::results::{EventLog, ResultSet};
use crate::transaction::Runner;
use stampede_core::{Pacing, RequestEvent, SustainedConfig, SustainedSummary, Target};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

#[instrument(name = "sustained", skip_all, fields(users = config.users))]
pub(crate) async fn run_sustained(
    runner: &Runner,
    config: SustainedConfig,
    pacing: &Pacing,
    token: &CancellationToken,
) -> (SustainedSummary, Vec<RequestEvent>) {
    println!("Starting Sustained Load Test");
    println!("{}", runner.target());
    println!("Maintaining {config}...");
    info!("Running sustained test with {pacing:?}");

    let results = Arc::new(ResultSet::new());
    let log = Arc::new(EventLog::new());

    let start = Instant::now();
    let deadline = deadline_after(start, config.duration);

    let mut users = Vec::with_capacity(config.users);
    for user_id in 0..config.users {
        if token.is_cancelled() {
            debug!("Cancelled while starting users; {user_id} of {} started.", config.users);
            break;
        }

        users.push(tokio::spawn(
            virtual_user(
                runner.clone(),
                user_id,
                deadline,
                pacing.think_time,
                results.clone(),
                log.clone(),
                token.clone(),
            )
            .in_current_span(),
        ));

        // NOTE: Stagger user start so the first requests don't arrive as a single burst.
        tokio::select! {
            _ = sleep(pacing.user_stagger) => {}
            _ = token.cancelled() => {}
        }
    }

    monitor(start, deadline, config.duration, pacing.monitor_interval, &results, token).await;

    for handle in users {
        if let Err(err) = handle.await {
            error!("Virtual user task failed: {err}");
        }
    }

    let summary = SustainedSummary {
        num_users: config.users,
        duration: config.duration,
        successful: results.success_count() as usize,
        failed: results.error_count() as usize,
        stats: results.stats(),
        cancelled: token.is_cancelled(),
    };
    print_summary(&summary);

    (summary, log.snapshot())
}

/// `start + duration`, saturating at a far-future instant for durations the clock can't hold.
fn deadline_after(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

// Roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

async fn virtual_user(
    runner: Runner,
    user_id: usize,
    deadline: Instant,
    think_time: Duration,
    results: Arc<ResultSet>,
    log: Arc<EventLog>,
    token: CancellationToken,
) {
    let prompt = Target::prompt(user_id);

    // NOTE: Deadline and cancellation are only checked between requests; an in-flight request
    // always runs to completion.
    while Instant::now() < deadline && !token.is_cancelled() {
        let _ = runner.send(user_id, &prompt, &results, &log).await;

        tokio::select! {
            _ = sleep_until((Instant::now() + think_time).min(deadline)) => {}
            _ = token.cancelled() => break,
        }
    }

    trace!("User {user_id} finished.");
}

/// Print progress every `interval` until `deadline`. Returns early on cancellation.
async fn monitor(
    start: Instant,
    deadline: Instant,
    duration: Duration,
    interval: Duration,
    results: &ResultSet,
    token: &CancellationToken,
) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }

        println!(
            "Elapsed: {:.0}s / {}s - Requests: {} Ok, {} Error",
            (now - start).as_secs_f64(),
            duration.as_secs(),
            results.success_count(),
            results.error_count(),
        );

        tokio::select! {
            _ = sleep_until((now + interval).min(deadline)) => {}
            _ = token.cancelled() => {
                println!("\nStopping test early...");
                return;
            }
        }
    }
}

fn print_summary(summary: &SustainedSummary) {
    println!(
        "\nTest Complete. Total Requests: {} ({} Ok, {} Error)",
        summary.total(),
        summary.successful,
        summary.failed,
    );

    match &summary.stats {
        Some(stats) => {
            println!("Stats:");
            println!("  Average: {:.4}s", stats.avg);
            println!("  Median:  {:.4}s", stats.median);
            println!("  Min:     {:.4}s", stats.min);
            println!("  Max:     {:.4}s", stats.max);
        }
        None => println!("No successful requests."),
    }
}
