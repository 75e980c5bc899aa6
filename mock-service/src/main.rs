use mock_service::{rate_measure_task, Counters, MockConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("mock_service=info,tower_http=info")
        .init();

    let addr: SocketAddr = "0.0.0.0:8000".parse()?;
    let config = MockConfig::default()
        .delay(Duration::from_millis(200))
        .jitter(Duration::from_millis(300));

    let counters = Arc::new(Counters::default());
    tokio::spawn(rate_measure_task(counters.clone()));

    let listener = TcpListener::bind(addr).await?;
    mock_service::run(listener, config, counters).await
}
