//! Best-effort health check run before a test starts.
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy(StatusCode),
    Unreachable(String),
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::Healthy => write!(f, "healthy"),
            Health::Unhealthy(status) => write!(f, "unhealthy (HTTP {status})"),
            Health::Unreachable(err) => write!(f, "unreachable ({err})"),
        }
    }
}

/// Issue a single GET against `url`. Never fails; problems are reported as warnings and the
/// caller carries on regardless.
#[instrument(skip_all, fields(url = %url))]
pub async fn check(client: &Client, url: Url, timeout: Duration) -> Health {
    let health = match client.get(url).timeout(timeout).send().await {
        Ok(res) if res.status() == StatusCode::OK => Health::Healthy,
        Ok(res) => Health::Unhealthy(res.status()),
        Err(err) => Health::Unreachable(err.to_string()),
    };

    match &health {
        Health::Healthy => debug!("Endpoint is healthy."),
        Health::Unhealthy(status) => {
            warn!("Endpoint might be unhealthy or path is wrong (HTTP {status}).")
        }
        Health::Unreachable(err) => warn!("Could not contact endpoint before start: {err}"),
    }

    health
}
