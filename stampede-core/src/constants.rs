use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8000/api/generate";
pub const DEFAULT_MODEL: &str = "gemma3:4b";

pub const DEFAULT_MAX_USERS: usize = 100;
pub const DEFAULT_STEP_SIZE: usize = 20;
pub const DEFAULT_SUSTAINED_USERS: usize = 20;

/// Per-request socket timeout for generation requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for the single pre-flight health check.
pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path segment substituted for the generate segment to build the health-check URL.
pub const HEALTH_SEGMENT: &str = "tags";

/// Delay between starting consecutive users in sustained mode.
pub const USER_STAGGER: Duration = Duration::from_millis(100);

/// Delay between starting consecutive requests within a ramp batch.
pub const BATCH_STAGGER: Duration = Duration::from_millis(10);

/// Pause a sustained-mode user takes after each request.
pub const THINK_TIME: Duration = Duration::from_secs(1);

/// Pause between ramp batches.
pub const COOL_DOWN: Duration = Duration::from_secs(5);

/// Poll interval of the sustained-mode progress monitor.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(5);

pub const SUSTAINED_REPORT_FILE: &str = "sustained_test_report.json";
pub const RAMP_REPORT_FILE: &str = "load_test_report.json";
pub const RAMP_EVENTS_FILE: &str = "load_test_raw_events.json";
