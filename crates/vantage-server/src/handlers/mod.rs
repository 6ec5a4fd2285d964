//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod admin;
pub mod analytics;
pub mod export;
pub mod insights;

// Re-export all handlers for use in router
pub use admin::*;
pub use analytics::*;
pub use export::*;
pub use insights::*;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use vantage_core::db::Database;
use vantage_core::window::{parse_date, resolve_window};
use vantage_core::{AnalyticsConfig, Error, MetricWindow, RegionFilter};

use crate::{AppError, AppState};

/// Period used when a request names neither a preset nor explicit dates
pub const DEFAULT_PERIOD: &str = "all";

/// Date range, region and limit parameters shared by the report endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Custom start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Custom end date (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Period preset (this-month, last-12-months, all, ...)
    pub period: Option<String>,
    /// Region name, or `all`
    pub region: Option<String>,
    /// Number of ranked entries (capped by `reports.max_top_n`)
    pub limit: Option<usize>,
}

impl ReportQuery {
    /// Resolve the window. Explicit dates take precedence over the preset.
    pub fn window(&self, today: NaiveDate) -> Result<MetricWindow, AppError> {
        if self.start_date.is_some() != self.end_date.is_some() {
            return Err(AppError::bad_request(
                "start_date and end_date must be given together",
            ));
        }
        resolve_window(
            Some(self.period.as_deref().unwrap_or(DEFAULT_PERIOD)),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            today,
        )
        .map_err(input_error)
    }
}

/// Run store-bound work on the blocking pool with the shared database and config
pub(crate) async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Database, &AnalyticsConfig) -> vantage_core::Result<T> + Send + 'static,
{
    let db = state.db.clone();
    let config = state.config.clone();
    let value = tokio::task::spawn_blocking(move || work(&db, &config)).await??;
    Ok(value)
}

/// Resolve the `region` parameter against the configured regions
pub(crate) fn region_param(state: &AppState, raw: Option<&str>) -> Result<RegionFilter, AppError> {
    Ok(RegionFilter::parse(raw, &state.config.regions)?)
}

/// Today's date in UTC, the reference point for period presets
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn parse_date_param(raw: &str) -> Result<NaiveDate, AppError> {
    parse_date(raw).map_err(input_error)
}

/// Unparseable request input is the caller's fault
fn input_error(err: Error) -> AppError {
    match err {
        Error::InvalidData(msg) => AppError::bad_request(&msg),
        other => other.into(),
    }
}
