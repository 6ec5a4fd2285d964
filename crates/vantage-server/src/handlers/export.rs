//! Sales report export handler

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
};
use serde::Deserialize;
use tracing::info;

use crate::{AppError, AppState};
use vantage_core::{build_sales_report, ExportFormat};

use super::{region_param, run_blocking, today, ReportQuery};

/// Query parameters for the sales report export
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
    pub region: Option<String>,
    /// Output format (default: csv)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "csv".to_string()
}

/// GET /api/export/sales-report - Download the sales report as CSV or JSON
pub async fn export_sales_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportQuery>,
) -> Result<Response<Body>, AppError> {
    let format: ExportFormat = params.format.parse()?;
    let range = ReportQuery {
        start_date: params.start_date,
        end_date: params.end_date,
        period: params.period,
        region: params.region,
        limit: None,
    };
    let window = range.window(today())?;
    let region = region_param(&state, range.region.as_deref())?;

    let (table, body) = run_blocking(&state, move |db, config| {
        let table = build_sales_report(db, window, &region, config)?;
        let body = table.render(format)?;
        Ok((table, body))
    })
    .await?;
    info!(
        "Exported {} sales records to {} ({})",
        table.rows.len(),
        format,
        table.region
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", table.filename(format)),
        )
        .body(Body::from(body))
        .map_err(|e| AppError::internal(&e.to_string()))
}
