use utils::*;

use mock_service::MockConfig;
use stampede::core::SUSTAINED_REPORT_FILE;
use stampede::prelude::*;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing_test::traced_test;

fn read_events(dir: &std::path::Path) -> anyhow::Result<Vec<RequestEvent>> {
    let raw = std::fs::read_to_string(dir.join(SUSTAINED_REPORT_FILE))?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn zero_duration_terminates_promptly() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default()).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());

    let summary = timeout(
        Duration::from_secs(5),
        harness.sustained(SustainedConfig::new(5, Duration::ZERO)?),
    )
    .await??;

    assert_eq!(summary.total(), 0);
    assert!(summary.stats.is_none());
    assert!(!summary.cancelled);
    assert!(read_events(dir.path())?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn users_loop_until_deadline() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().delay(Duration::from_millis(10))).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());

    let summary = harness
        .sustained(SustainedConfig::new(3, Duration::from_millis(600))?)
        .await?;

    // Every user gets several iterations in at a 20ms think time.
    assert!(summary.successful > 3);
    assert_eq!(summary.failed, 0);
    assert!(summary.stats.is_some());
    assert_eq!(summary.total() as u64, mock.hits());

    let events = read_events(dir.path())?;
    assert_eq!(events.len(), summary.total());
    for user_id in 0..3 {
        assert!(events.iter().any(|e| e.user_id == user_id));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn failures_are_counted_not_fatal() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().status(500)).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());

    let summary = harness
        .sustained(SustainedConfig::new(2, Duration::from_millis(300))?)
        .await?;

    assert_eq!(summary.successful, 0);
    assert!(summary.failed >= 2);
    assert!(summary.stats.is_none());

    let events = read_events(dir.path())?;
    assert_eq!(events.len(), summary.failed);
    assert!(events.iter().all(|e| e.error.contains("500")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn cancellation_waits_for_in_flight_requests() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().delay(Duration::from_millis(300))).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());

    let token = harness.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        token.cancel();
    });

    let start = Instant::now();
    let summary = timeout(
        Duration::from_secs(10),
        harness.sustained(SustainedConfig::new(4, Duration::from_secs(60))?),
    )
    .await??;

    assert!(summary.cancelled);
    assert!(start.elapsed() < Duration::from_secs(5));
    // Nothing is aborted mid-request: every request the mock saw made it into the report.
    assert_eq!(summary.total() as u64, mock.hits());
    assert_eq!(read_events(dir.path())?.len(), summary.total());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[traced_test]
async fn unbounded_duration_runs_until_cancelled() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default()).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());

    let token = harness.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });

    let summary = timeout(
        Duration::from_secs(10),
        harness.sustained(SustainedConfig::new(1, Duration::from_secs(u64::MAX))?),
    )
    .await??;

    assert!(summary.cancelled);
    assert!(summary.successful >= 1);
    assert_eq!(summary.duration, Duration::from_secs(u64::MAX));
    Ok(())
}
