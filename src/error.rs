use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Server returned {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Server ignored the range request at offset {0} and sent the full body")]
    RangeIgnored(u64),

    #[error("Gave up after {retries} retries: {last}")]
    RetriesExhausted {
        retries: u32,
        #[source]
        last: Box<DownloadError>,
    },

    #[error("Rate limiter rejected chunk: {0}")]
    RateLimit(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("health monitor was already started")]
    AlreadyStarted,

    #[error("health monitor has been stopped")]
    Stopped,

    #[error("failed to build probe client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the transfer loop should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Wait, re-read the offset from disk and request again.
    Transient,
    /// Abort the session.
    Fatal,
}

pub fn classify(err: &DownloadError) -> Disposition {
    match err {
        DownloadError::Http(e) => {
            if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
                Disposition::Transient
            } else {
                Disposition::Fatal
            }
        }
        DownloadError::UnexpectedStatus(_) => Disposition::Transient,
        DownloadError::Io(_)
        | DownloadError::InvalidUrl(_)
        | DownloadError::RangeIgnored(_)
        | DownloadError::RetriesExhausted { .. }
        | DownloadError::RateLimit(_)
        | DownloadError::Config(_) => Disposition::Fatal,
    }
}
