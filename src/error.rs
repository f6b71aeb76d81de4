use std::sync::Arc;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while loading or refreshing flag definitions.
///
/// Flag evaluation itself never fails: unknown flags and malformed rules degrade to "disabled".
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A flag declares a rollout percentage above 100.
    #[error("rollout percentage {percentage} of flag {key:?} is outside of 0..=100")]
    InvalidPercentage {
        /// Key of the offending flag.
        key: String,
        /// Configured percentage.
        percentage: u8,
    },

    /// The same flag key appears more than once in a flag list.
    #[error("duplicate flag key {0:?}")]
    DuplicateFlagKey(String),

    /// Flag definitions could not be parsed.
    #[error("error parsing flag definitions")]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    ConfigurationParse(#[source] Arc<serde_json::Error>),

    /// Flag source URL is not valid.
    #[error("invalid flag source url")]
    InvalidUrl(#[source] url::ParseError),

    /// The flag source rejected our credentials.
    #[error("unauthorized, api_key is likely invalid")]
    Unauthorized,

    /// Indicates that the poller thread panicked. This should normally never happen.
    #[error("poller thread panicked")]
    PollerThreadPanicked,

    /// An I/O error.
    #[error(transparent)]
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigurationParse(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}
