use crate::error::RequestError;
use crate::results::{EventLog, ResultSet};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use stampede_core::{Pacing, RequestEvent, Target};
use std::future::Future;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

#[cfg(feature = "metrics")]
const LATENCY_LABEL: &str = "stampede_request_latency";
#[cfg(feature = "metrics")]
const SUCCESS_LABEL: &str = "stampede_request_success";
#[cfg(feature = "metrics")]
const ERROR_LABEL: &str = "stampede_request_error";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Issues generation requests against a [`Target`] and records their outcome.
#[derive(Clone)]
pub struct Runner {
    client: Client,
    target: Arc<Target>,
}

impl Runner {
    pub fn new(target: Target, pacing: &Pacing) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(pacing.request_timeout).build()?;
        Ok(Self {
            client,
            target: Arc::new(target),
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Send one request for `user_id` and record it in `results` and `log`.
    pub async fn send(
        &self,
        user_id: usize,
        prompt: &str,
        results: &ResultSet,
        log: &EventLog,
    ) -> Result<(), RequestError> {
        transaction_hook(user_id, results, log, self.generate(prompt)).await
    }

    async fn generate(&self, prompt: &str) -> Result<(), RequestError> {
        let body = GenerateRequest {
            model: &self.target.model,
            prompt,
            stream: false,
        };

        let res = self
            .client
            .post(self.target.url.clone())
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(RequestError::Status(status));
        }

        // NOTE: The body is only drained; its content plays no part in the measurements.
        res.bytes().await.map_err(RequestError::Body)?;
        Ok(())
    }
}

/// Times `func` and records exactly one outcome: a success latency or an error description in
/// `results`, plus one event in `log` either way.
pub(crate) async fn transaction_hook<T, R, E>(
    user_id: usize,
    results: &ResultSet,
    log: &EventLog,
    func: T,
) -> T::Output
where
    T: Future<Output = Result<R, E>>,
    E: std::fmt::Display,
{
    let started = OffsetDateTime::now_utc();
    let start = Instant::now();
    let res = func.await;
    let elapsed = start.elapsed();

    #[cfg(feature = "metrics")]
    metrics::histogram!(LATENCY_LABEL).record(elapsed.as_secs_f64());

    match &res {
        Ok(_) => {
            trace!("User {user_id} request succeeded in {elapsed:?}");
            results.record_success(elapsed);
            log.push(RequestEvent::success(started, elapsed, user_id));

            #[cfg(feature = "metrics")]
            metrics::counter!(SUCCESS_LABEL).increment(1);
        }
        Err(err) => {
            let description = err.to_string();
            debug!("User {user_id} request failed after {elapsed:?}: {description}");
            results.record_error(description.clone());
            log.push(RequestEvent::failure(started, elapsed, user_id, description));

            #[cfg(feature = "metrics")]
            metrics::counter!(ERROR_LABEL).increment(1);
        }
    }

    res
}
