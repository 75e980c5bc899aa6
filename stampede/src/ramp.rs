//! Batches of increasing concurrency, each barrier-joined before the next.
use crate::results::{EventLog, ResultSet};
use crate::transaction::Runner;
use stampede_core::{BatchStats, Pacing, RampConfig, Report, ReportConfig, RequestEvent, Target};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Result of a single batch of one-shot requests.
#[derive(Debug, Clone)]
pub struct Batch {
    pub stats: BatchStats,
    pub errors: Vec<String>,
}

#[instrument(name = "ramp", skip_all, fields(max_users = config.max_users, step_size = config.step_size))]
pub(crate) async fn run_ramp(
    runner: &Runner,
    config: RampConfig,
    pacing: &Pacing,
    token: &CancellationToken,
) -> (Report, Vec<RequestEvent>) {
    println!("Starting Scalability Test");
    println!("{}", runner.target());
    println!(
        "Ramping up to {} users in steps of {}...",
        config.max_users, config.step_size
    );

    let target = runner.target();
    let mut report = Report::new(ReportConfig {
        max_users: config.max_users,
        step_size: config.step_size,
        url: target.url.clone(),
        model: target.model.clone(),
        timestamp: OffsetDateTime::now_utc(),
    });

    let log = Arc::new(EventLog::new());
    let levels = config.levels();
    debug!("Batch levels: {levels:?}");

    for (idx, &users) in levels.iter().enumerate() {
        if token.is_cancelled() {
            warn!("Ramp cancelled before batch of {users} users.");
            break;
        }

        println!("\n--- Batch: {users} Concurrent Users ---");
        let batch = run_batch(runner, users, pacing.batch_stagger, &log, token).await;
        print_batch(&batch);
        report.push(batch.stats);

        if idx + 1 < levels.len() {
            // NOTE: Let the target recover so consecutive latency distributions stay separate.
            tokio::select! {
                _ = sleep(pacing.cool_down) => {}
                _ = token.cancelled() => {}
            }
        }
    }

    (report, log.snapshot())
}

/// Fire `users` single requests, staggered by `stagger`, and wait for all of them.
///
/// Cancellation stops further requests from being launched; those already started are still
/// joined and counted.
pub(crate) async fn run_batch(
    runner: &Runner,
    users: usize,
    stagger: Duration,
    log: &Arc<EventLog>,
    token: &CancellationToken,
) -> Batch {
    println!("  Running batch with {users} users...");

    let results = Arc::new(ResultSet::new());
    let mut handles = Vec::with_capacity(users);
    for user_id in 0..users {
        if token.is_cancelled() {
            warn!("Batch cancelled after launching {user_id} of {users} requests.");
            break;
        }

        let runner = runner.clone();
        let results = results.clone();
        let log = log.clone();
        handles.push(tokio::spawn(
            async move {
                let prompt = Target::prompt(user_id);
                let _ = runner.send(user_id, &prompt, &results, &log).await;
            }
            .in_current_span(),
        ));

        tokio::select! {
            _ = sleep(stagger) => {}
            _ = token.cancelled() => {}
        }
    }

    // NOTE: Hard barrier; statistics are only computed once every request has finished.
    for handle in handles {
        if let Err(err) = handle.await {
            error!("Batch request task failed: {err}");
        }
    }

    let durations = results.durations();
    let errors = results.errors();
    Batch {
        stats: BatchStats::new(users, &durations, errors.len()),
        errors,
    }
}

fn print_batch(batch: &Batch) {
    match &batch.stats.stats {
        Some(stats) => {
            println!("  Avg Latency: {:.2}s", stats.avg);
            println!("  Max Latency: {:.2}s", stats.max);
        }
        None => println!("  No successful requests."),
    }

    if !batch.errors.is_empty() {
        println!("  Errors: {}", batch.errors.len());
        if let Some(first) = batch.errors.first() {
            debug!("First error: {first}");
        }
    }
}
