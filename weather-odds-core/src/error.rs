use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the upstream point-query service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode upstream response")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Date range of {days} days exceeds the hourly maximum of {max} days")]
    DateRangeTooLarge { days: i64, max: i64 },

    #[error("Weather data not available for the requested point and range")]
    DataUnavailable,
}

/// Failures of the probability engine.
#[derive(Debug, Error)]
pub enum ProbabilityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid hour {0}, must be between 0 and 23")]
    InvalidHour(u32),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("No historical data available between {start_year} and {end_year}")]
    NoHistoricalData { start_year: i32, end_year: i32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable classification of [`ProbabilityError`] for boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    UpstreamUnavailable,
    NoHistoricalData,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::NoHistoricalData => "no_historical_data",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProbabilityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbabilityError::InvalidInput(_) | ProbabilityError::InvalidHour(_) => {
                ErrorKind::InvalidInput
            }
            ProbabilityError::Upstream(err) => err.kind(),
            ProbabilityError::NoHistoricalData { .. } => ErrorKind::NoHistoricalData,
            ProbabilityError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl UpstreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::Request { .. } | UpstreamError::Status { .. } | UpstreamError::Decode(_) => {
                ErrorKind::UpstreamUnavailable
            }
            UpstreamError::InvalidDateRange { .. } | UpstreamError::DateRangeTooLarge { .. } => {
                ErrorKind::InvalidInput
            }
            UpstreamError::DataUnavailable => ErrorKind::NoHistoricalData,
        }
    }
}

pub type Result<T, E = ProbabilityError> = std::result::Result<T, E>;
