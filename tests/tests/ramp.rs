use utils::*;

use mock_service::MockConfig;
use stampede::core::{RAMP_EVENTS_FILE, RAMP_REPORT_FILE};
use stampede::prelude::*;
use std::time::Duration;
use tracing_test::traced_test;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn ramp_clamps_final_batch_and_persists_reports() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().delay(Duration::from_millis(20))).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());

    let report = harness.ramp(RampConfig::new(50, 20)?).await?;

    assert_eq!(report.levels(), vec![20, 40, 50]);
    assert!(report
        .batches
        .iter()
        .all(|b| b.successful == b.num_users && b.failed == 0 && b.stats.is_some()));
    assert_eq!(report.config.max_users, 50);
    assert_eq!(report.config.step_size, 20);
    assert_eq!(report.config.model, "test-model");
    assert_eq!(report.config.url.as_str(), mock.generate_url());
    assert_eq!(mock.hits(), 110);

    let written: Report = serde_json::from_str(&std::fs::read_to_string(
        dir.path().join(RAMP_REPORT_FILE),
    )?)?;
    assert_eq!(written, report);

    let events: Vec<RequestEvent> = serde_json::from_str(&std::fs::read_to_string(
        dir.path().join(RAMP_EVENTS_FILE),
    )?)?;
    assert_eq!(events.len(), 110);
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn ramp_against_failing_endpoint_reports_empty_stats() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().status(503)).await;
    let dir = tempfile::tempdir()?;

    let report = harness(&mock.generate_url(), dir.path())
        .ramp(RampConfig::new(10, 5)?)
        .await?;

    assert_eq!(report.levels(), vec![5, 10]);
    assert!(report
        .batches
        .iter()
        .all(|b| b.successful == 0 && b.failed == b.num_users && b.stats.is_none()));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(RAMP_REPORT_FILE))?)?;
    assert_eq!(raw["batches"][0]["stats"], serde_json::json!({}));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[traced_test]
async fn cancelled_ramp_still_writes_reports() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default()).await;
    let dir = tempfile::tempdir()?;
    let harness = harness(&mock.generate_url(), dir.path());
    harness.cancellation().cancel();

    let report = harness.ramp(RampConfig::new(40, 20)?).await?;

    assert!(report.batches.is_empty());
    assert_eq!(mock.hits(), 0);
    assert!(dir.path().join(RAMP_REPORT_FILE).exists());
    assert!(dir.path().join(RAMP_EVENTS_FILE).exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn batches_do_not_overlap() -> anyhow::Result<()> {
    // Requests outlast the cool-down, so an unjoined batch would overlap the next one.
    let mock = mock(MockConfig::default().delay(Duration::from_millis(200))).await;
    let dir = tempfile::tempdir()?;

    let report = harness(&mock.generate_url(), dir.path())
        .ramp(RampConfig::new(10, 5)?)
        .await?;
    assert_eq!(report.levels(), vec![5, 10]);
    assert_eq!(mock.hits(), 15);
    assert!(mock.max_in_flight() <= 10);

    let events: Vec<RequestEvent> = serde_json::from_str(&std::fs::read_to_string(
        dir.path().join(RAMP_EVENTS_FILE),
    )?)?;
    assert_eq!(events.len(), 15);

    let (first, second) = events.split_at(5);
    let first_done = first
        .iter()
        .map(|e| e.timestamp + e.duration)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(second.iter().all(|e| e.timestamp >= first_done));
    Ok(())
}
