use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid target URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),

    #[error("URL {0} has no path to derive a health-check URL from")]
    CannotBeABase(Url),

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}
