use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Behaviour of the mock generate endpoint.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Status returned by `POST /api/generate`.
    pub status: u16,
    /// Status returned by `GET /api/tags`.
    pub health_status: u16,
    pub delay: Duration,
    /// Extra random delay in `[0, jitter]` added to every generate request.
    pub jitter: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            status: 200,
            health_status: 200,
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

impl MockConfig {
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn health_status(mut self, status: u16) -> Self {
        self.health_status = status;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }
}

#[derive(Default)]
pub struct Counters {
    hits: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
    health_checks: AtomicU64,
}

struct MockState {
    config: MockConfig,
    counters: Arc<Counters>,
}

/// A mock service running in the background of the current tokio runtime.
pub struct MockHandle {
    pub addr: SocketAddr,
    counters: Arc<Counters>,
}

impl MockHandle {
    pub fn generate_url(&self) -> String {
        format!("http://{}/api/generate", self.addr)
    }

    /// Generate requests received so far.
    pub fn hits(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    /// Highest number of generate requests that were being served at the same time.
    pub fn max_in_flight(&self) -> u64 {
        self.counters.max_in_flight.load(Ordering::Relaxed)
    }

    pub fn health_checks(&self) -> u64 {
        self.counters.health_checks.load(Ordering::Relaxed)
    }
}

#[derive(Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

pub fn router(config: MockConfig, counters: Arc<Counters>) -> Router {
    let state = MockState { config, counters };
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/tags", get(tags))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(
    listener: TcpListener,
    config: MockConfig,
    counters: Arc<Counters>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(config, counters)).await?;
    Ok(())
}

/// Bind an ephemeral local port and serve the mock in a background task.
pub async fn spawn(config: MockConfig) -> anyhow::Result<MockHandle> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let counters = Arc::new(Counters::default());

    let task_counters = counters.clone();
    tokio::spawn(async move {
        if let Err(err) = run(listener, config, task_counters).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });

    Ok(MockHandle { addr, counters })
}

async fn generate(
    State(state): State<Arc<MockState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    let counters = &state.counters;
    counters.hits.fetch_add(1, Ordering::Relaxed);
    let in_flight = counters.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
    counters.max_in_flight.fetch_max(in_flight, Ordering::Relaxed);

    let jitter_ms = state.config.jitter.as_millis() as u64;
    let jitter = if jitter_ms > 0 {
        Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    } else {
        Duration::ZERO
    };
    tokio::time::sleep(state.config.delay + jitter).await;

    counters.in_flight.fetch_sub(1, Ordering::Relaxed);
    debug!("Generate request for {} ({} chars)", req.model, req.prompt.len());

    if req.stream {
        return Err(StatusCode::BAD_REQUEST);
    }

    match StatusCode::from_u16(state.config.status) {
        Ok(StatusCode::OK) => Ok(Json(GenerateResponse {
            model: req.model,
            response: "The capital of France is Paris.".to_string(),
            done: true,
        })),
        Ok(status) => Err(status),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn tags(State(state): State<Arc<MockState>>) -> Result<Json<serde_json::Value>, StatusCode> {
    state.counters.health_checks.fetch_add(1, Ordering::Relaxed);
    match StatusCode::from_u16(state.config.health_status) {
        Ok(StatusCode::OK) => Ok(Json(serde_json::json!({ "models": [] }))),
        Ok(status) => Err(status),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/** Request rate printer **/

pub async fn rate_measure_task(counters: Arc<Counters>) {
    let mut last = 0;
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let hits = counters.hits.load(Ordering::Relaxed);
        println!("{} req/s", hits - last);
        last = hits;
    }
}
