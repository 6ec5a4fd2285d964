//! Error types for Vantage

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Unknown region '{region}' (known: {})", .known.join(", "))]
    UnknownRegion { region: String, known: Vec<String> },

    #[error("Unsupported export format: {0} (use csv or json)")]
    UnsupportedFormat(String),

    #[error("AI backend not configured")]
    AiNotConfigured,

    #[error("AI backend returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("AI backend timed out after {0}s")]
    Timeout(u64),

    #[error("Insight generation failed after {attempts} attempt(s) with model {model}: {message}")]
    InsightGeneration {
        model: String,
        attempts: u32,
        message: String,
    },

    #[error("Malformed insight response for {region} ({start_date} to {end_date}): {reason}")]
    MalformedInsightResponse {
        start_date: NaiveDate,
        end_date: NaiveDate,
        region: String,
        reason: String,
    },
}

impl Error {
    /// Whether a failed backend call is worth repeating.
    ///
    /// Timeouts, connection failures, rate limits and server errors are
    /// transient. Everything else, including a response we could not parse,
    /// fails the same way on a second attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Backend { status, .. } => *status == 429 || (500..600).contains(status),
            Error::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            _ => false,
        }
    }

    /// Whether this error was caused by the caller's request parameters
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Error::InvalidRange { .. } | Error::UnknownRegion { .. } | Error::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
