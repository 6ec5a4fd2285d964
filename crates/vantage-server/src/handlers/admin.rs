//! Service banner, health and sample data handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState};
use vantage_core::ai::AIBackend;
use vantage_core::db::{SampleDataOptions, StoreCounts};

use super::{run_blocking, today};

/// GET /api - Service banner
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Vantage Sales Analytics API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// AI backend status for the health endpoint
#[derive(Debug, Serialize)]
pub struct AiStatus {
    pub backend: &'static str,
    pub host: String,
    pub model: String,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: StoreCounts,
    /// Distinct regions with recorded sales
    pub regions: Vec<String>,
    /// Absent when no AI backend is configured
    pub ai: Option<AiStatus>,
}

/// GET /api/health - Store and AI backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let (records, regions) =
        run_blocking(&state, |db, _| Ok((db.counts()?, db.regions_in_use()?))).await?;

    let ai = match state.ai {
        Some(ref client) => Some(AiStatus {
            backend: client.kind(),
            host: client.host().to_string(),
            model: client.model().to_string(),
            available: client.health_check().await,
        }),
        None => None,
    };

    Ok(Json(HealthResponse {
        status: "ok",
        records,
        regions,
        ai,
    }))
}

#[derive(Debug, Serialize)]
pub struct SampleDataResponse {
    pub message: String,
    pub transactions: i64,
    pub created: bool,
}

/// POST /api/generate-sample-data - Populate an empty store with sample data
pub async fn generate_sample_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SampleDataResponse>, AppError> {
    let db = state.db.clone();
    let options = SampleDataOptions::new(today(), state.config.regions.clone());

    let result = tokio::task::spawn_blocking(move || db.generate_sample_data(&options)).await??;
    info!(created = result.created, transactions = result.transactions, "Sample data request");

    Ok(Json(SampleDataResponse {
        message: result.message(),
        transactions: result.transactions,
        created: result.created,
    }))
}
