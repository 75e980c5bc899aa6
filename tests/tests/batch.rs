use utils::*;

use mock_service::MockConfig;
use stampede::prelude::*;
use std::time::Duration;
use tracing_test::traced_test;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn batch_against_healthy_endpoint() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().delay(Duration::from_millis(100))).await;
    let dir = tempfile::tempdir()?;

    let (batch, events) = harness(&mock.generate_url(), dir.path()).batch(12).await?;

    assert_eq!(batch.stats.num_users, 12);
    assert_eq!(batch.stats.successful, 12);
    assert_eq!(batch.stats.failed, 0);
    assert!(batch.errors.is_empty());

    let stats = batch.stats.stats.expect("latency stats for successful batch");
    assert!(stats.min >= 0.1);
    assert!(stats.max >= stats.median && stats.median >= stats.min);

    assert_eq!(events.len(), 12);
    assert!(events.iter().all(|e| e.status == Status::Success && e.error.is_empty()));

    let mut users: Vec<usize> = events.iter().map(|e| e.user_id).collect();
    users.sort_unstable();
    assert_eq!(users, (0..12).collect::<Vec<_>>());

    assert_eq!(mock.hits(), 12);
    // Requests overlap rather than run one after another.
    assert!(mock.max_in_flight() > 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn batch_against_failing_endpoint() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().status(500)).await;
    let dir = tempfile::tempdir()?;

    let (batch, events) = harness(&mock.generate_url(), dir.path()).batch(8).await?;

    assert_eq!(batch.stats.successful, 0);
    assert_eq!(batch.stats.failed, 8);
    assert!(batch.stats.stats.is_none());
    assert_eq!(batch.errors.len(), 8);
    assert!(batch.errors.iter().all(|e| e.contains("500")));

    assert_eq!(events.len(), 8);
    assert!(events
        .iter()
        .all(|e| e.status == Status::Error && e.error.contains("500")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[traced_test]
async fn batch_against_missing_endpoint() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let dir = tempfile::tempdir()?;
    let url = format!("http://{addr}/api/generate");
    let (batch, events) = harness(&url, dir.path()).batch(3).await?;

    assert_eq!(batch.stats.successful + batch.stats.failed, 3);
    assert_eq!(batch.stats.failed, 3);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| !e.error.is_empty()));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[traced_test]
async fn slow_endpoint_times_out() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default().delay(Duration::from_secs(2))).await;
    let dir = tempfile::tempdir()?;

    let pacing = Pacing {
        request_timeout: Duration::from_millis(200),
        ..fast_pacing()
    };
    let (batch, events) = harness(&mock.generate_url(), dir.path())
        .pacing(pacing)
        .batch(2)
        .await?;

    assert_eq!(batch.stats.failed, 2);
    assert!(batch.errors.iter().all(|e| e.starts_with("Request timed out")));
    assert!(events.iter().all(|e| e.duration < 2.0));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[traced_test]
async fn cancelled_batch_stops_launching() -> anyhow::Result<()> {
    let mock = mock(MockConfig::default()).await;
    let dir = tempfile::tempdir()?;

    let pacing = Pacing {
        batch_stagger: Duration::from_millis(50),
        ..fast_pacing()
    };
    let harness = harness(&mock.generate_url(), dir.path()).pacing(pacing);

    let token = harness.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        token.cancel();
    });

    let (batch, events) = harness.batch(20).await?;

    let launched = mock.hits() as usize;
    assert!(launched >= 1 && launched < 20);
    // Requests already started are still joined and counted.
    assert_eq!(batch.stats.successful, launched);
    assert_eq!(events.len(), launched);
    Ok(())
}
