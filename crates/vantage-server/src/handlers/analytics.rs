//! Analytics report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::{AppError, AppState};
use vantage_core::models::{CustomerSummary, ProductSummary, SalesSummary, SeasonalSummary};
use vantage_core::Analytics;

use super::{parse_date_param, region_param, run_blocking, today, ReportQuery};

/// GET /api/analytics/sales - Headline KPIs with period comparison
pub async fn sales_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<SalesSummary>, AppError> {
    let window = params.window(today())?;
    let region = region_param(&state, params.region.as_deref())?;
    let label = region.label().to_string();

    let summary = run_blocking(&state, move |db, config| {
        Analytics::new(db, config).sales_summary(window, &region)
    })
    .await?;
    debug!(window = %window, region = %label, "Sales summary served");

    Ok(Json(summary))
}

/// GET /api/analytics/customers - Retention, segments and top customers
pub async fn customer_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<CustomerSummary>, AppError> {
    let window = params.window(today())?;
    let region = region_param(&state, params.region.as_deref())?;
    let limit = params.limit;

    let summary = run_blocking(&state, move |db, config| {
        Analytics::new(db, config).customer_summary(window, &region, limit)
    })
    .await?;
    Ok(Json(summary))
}

/// GET /api/analytics/products - Product rankings, categories and inventory
pub async fn product_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<ProductSummary>, AppError> {
    let window = params.window(today())?;
    let region = region_param(&state, params.region.as_deref())?;
    let limit = params.limit;

    let summary = run_blocking(&state, move |db, config| {
        Analytics::new(db, config).product_summary(window, &region, limit)
    })
    .await?;
    Ok(Json(summary))
}

/// Query parameters for the seasonal report
#[derive(Debug, Deserialize)]
pub struct SeasonalQuery {
    /// Last day of the trend series (default: today)
    pub end_date: Option<String>,
    pub region: Option<String>,
    /// Number of calendar months (default from config)
    pub months: Option<u32>,
    /// Peak threshold in percent above the mean (default from config)
    pub threshold: Option<f64>,
}

/// GET /api/analytics/seasonal - Monthly trends, quarters and peaks
pub async fn seasonal_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeasonalQuery>,
) -> Result<Json<SeasonalSummary>, AppError> {
    let as_of = match params.end_date.as_deref() {
        Some(raw) => parse_date_param(raw)?,
        None => today(),
    };
    if params.months == Some(0) {
        return Err(AppError::bad_request("months must be at least 1"));
    }
    if params.threshold.is_some_and(|t| !t.is_finite() || t < 0.0) {
        return Err(AppError::bad_request("threshold must be a non-negative number"));
    }
    let region = region_param(&state, params.region.as_deref())?;
    let SeasonalQuery {
        months, threshold, ..
    } = params;

    let summary = run_blocking(&state, move |db, config| {
        Analytics::new(db, config).seasonal_summary(as_of, &region, months, threshold)
    })
    .await?;
    Ok(Json(summary))
}
