use reqwest::StatusCode;
use std::error::Error as _;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single generation request. Only its description reaches the reports.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("Request timed out: {}", describe(.0))]
    Timeout(reqwest::Error),

    #[error("Transport error: {}", describe(.0))]
    Transport(reqwest::Error),

    #[error("Failed reading response body: {}", describe(.0))]
    Body(reqwest::Error),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// reqwest keeps the interesting part (connection refused, DNS failure) in the source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unable to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] stampede_core::ConfigError),

    #[error("Unable to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Report(#[from] ReportError),
}
