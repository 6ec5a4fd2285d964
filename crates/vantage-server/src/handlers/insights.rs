//! AI insight handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::{AppError, AppState};
use vantage_core::insights::Digest;
use vantage_core::models::InsightReport;
use vantage_core::{Analytics, Error};

use super::{region_param, run_blocking, today, ReportQuery};

/// GET /api/analytics/ai-insights - Narrative, recommendations and trends
/// for a window, generated by the configured AI backend
pub async fn ai_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<InsightReport>, AppError> {
    let generator = state.insights.as_ref().ok_or(Error::AiNotConfigured)?;

    let window = params.window(today())?;
    let region = region_param(&state, params.region.as_deref())?;
    let snapshot = run_blocking(&state, move |db, config| {
        Analytics::new(db, config).snapshot(window, &region)
    })
    .await?;

    let digest = Digest::collect(Arc::new(snapshot), state.config.clone()).await?;
    let report = generator.generate_insights(&digest).await?;

    info!(
        window = %window,
        region = %digest.region,
        model = %report.model,
        recommendations = report.recommendations.len(),
        "Insights generated"
    );

    Ok(Json(report))
}
