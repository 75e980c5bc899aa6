use crate::{
    ConfigError, BATCH_STAGGER, COOL_DOWN, HEALTH_SEGMENT, MONITOR_INTERVAL, PREFLIGHT_TIMEOUT,
    REQUEST_TIMEOUT, THINK_TIME, USER_STAGGER,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;
use url::Url;

/// The generate endpoint under test and the model to request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub url: Url,
    pub model: String,
}

impl Target {
    pub fn new(url: &str, model: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(url)?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        Ok(Self {
            url,
            model: model.to_string(),
        })
    }

    /// Health-check URL: the trailing path segment of the generate URL replaced by `tags`.
    ///
    /// `http://host:8000/api/generate` becomes `http://host:8000/api/tags`.
    pub fn health_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::CannotBeABase(self.url.clone()))?
            .pop_if_empty()
            .pop()
            .push(HEALTH_SEGMENT);
        Ok(url)
    }

    /// The canned prompt a virtual user sends.
    pub fn prompt(user_id: usize) -> String {
        format!("User {user_id}: What is the capital of France?")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target: {}, Model: {}", self.url, self.model)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampConfig {
    pub max_users: usize,
    pub step_size: usize,
}

impl RampConfig {
    pub fn new(max_users: usize, step_size: usize) -> Result<Self, ConfigError> {
        if max_users == 0 {
            return Err(ConfigError::Zero("max_users"));
        }
        if step_size == 0 {
            return Err(ConfigError::Zero("step_size"));
        }
        Ok(Self {
            max_users,
            step_size,
        })
    }

    /// Concurrency of each batch: `step_size, 2 * step_size, ...` with every level clamped to
    /// `max_users`, so the last batch always runs at exactly `max_users`.
    pub fn levels(&self) -> Vec<usize> {
        let mut levels = vec![];
        let mut current = self.step_size.min(self.max_users);
        loop {
            levels.push(current);
            if current >= self.max_users {
                break;
            }
            current = current.saturating_add(self.step_size).min(self.max_users);
        }
        levels
    }
}

#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SustainedConfig {
    pub users: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub duration: Duration,
}

impl SustainedConfig {
    pub fn new(users: usize, duration: Duration) -> Result<Self, ConfigError> {
        if users == 0 {
            return Err(ConfigError::Zero("users"));
        }
        Ok(Self { users, duration })
    }
}

impl fmt::Display for SustainedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} concurrent users for {}",
            self.users,
            humantime::format_duration(self.duration)
        )
    }
}

/// Timing knobs shared by both drivers. `Default` holds the production values.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub user_stagger: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub batch_stagger: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub think_time: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub cool_down: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub monitor_interval: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub preflight_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            user_stagger: USER_STAGGER,
            batch_stagger: BATCH_STAGGER,
            think_time: THINK_TIME,
            cool_down: COOL_DOWN,
            monitor_interval: MONITOR_INTERVAL,
            request_timeout: REQUEST_TIMEOUT,
            preflight_timeout: PREFLIGHT_TIMEOUT,
        }
    }
}
