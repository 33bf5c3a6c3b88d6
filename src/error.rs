//! error handling stuff
use {reqwest::StatusCode, thiserror::Error};

#[derive(Debug, Error)]
/// An error
pub enum ExportError {
    /// the forum api rejected our credentials (or we never got a token)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// a request to the forum api failed after all retries
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// the forum api answered with a non-success status
    #[error("{url} returned http {status}")]
    Status {
        /// the status code
        status: StatusCode,
        /// the requested url
        url: String,
    },

    /// the start of a time window lies after its end
    #[error("invalid time window: start {start} is after end {end}")]
    InvalidWindow {
        /// the requested start
        start: String,
        /// the requested end
        end: String,
    },

    /// a date that couldn't be parsed
    #[error("invalid date '{0}': expected YYYY-MM-DD, YYYY-MM-DD HH:MM:SS or RFC 3339")]
    InvalidDate(String),

    /// an IO error
    #[error("i/o error: {0}")]
    IO(#[from] std::io::Error),

    /// a csv error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// a json error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// a reqwest error
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// a url parse error
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    /// an invalid header value
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// a custom error
    #[error("error: {0}")]
    Other(String),
}

impl ExportError {
    /// whether retrying the failed request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

impl From<String> for ExportError {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}

/// A result using [`ExportError`] as the `Err` variant
pub type Result<T, U = ExportError> = std::result::Result<T, U>;
