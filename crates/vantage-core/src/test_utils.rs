//! Test utilities for vantage-core
//!
//! This module provides a mock LLM server speaking both the Ollama and the
//! OpenAI-compatible wire formats, for backend and orchestrator tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::{MockReply, MOCK_INSIGHT_RESPONSE};

/// How the mock server answers generation requests
#[derive(Debug, Clone)]
pub enum ServerBehavior {
    /// Well-formed three-section insight text
    WellFormed,
    /// Prose without the section headings
    Malformed,
    /// 503 for the first `n` generation calls, then well-formed text
    FailFirst(u32),
    /// Always 429
    RateLimited,
    /// Sleep before answering with well-formed text
    Slow(Duration),
}

#[derive(Clone)]
struct MockState {
    behavior: ServerBehavior,
    calls: Arc<AtomicU32>,
}

/// Mock LLM server for testing and development
pub struct MockLlmServer {
    addr: SocketAddr,
    calls: Arc<AtomicU32>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start the mock server on an available port
    pub async fn start(behavior: ServerBehavior) -> Self {
        let calls = Arc::new(AtomicU32::new(0));
        let state = MockState {
            behavior,
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .route("/health", get(|| async { StatusCode::OK }))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            calls,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generation requests received so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decide the reply for one generation call, counting it
async fn next_reply(state: &MockState) -> MockReply {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    match &state.behavior {
        ServerBehavior::WellFormed => MockReply::Text(MOCK_INSIGHT_RESPONSE.to_string()),
        ServerBehavior::Malformed => {
            MockReply::Text("Sales were fine this period. Keep doing what works.".to_string())
        }
        ServerBehavior::FailFirst(n) if call <= *n => MockReply::Status(503),
        ServerBehavior::FailFirst(_) => MockReply::Text(MOCK_INSIGHT_RESPONSE.to_string()),
        ServerBehavior::RateLimited => MockReply::Status(429),
        ServerBehavior::Slow(delay) => {
            tokio::time::sleep(*delay).await;
            MockReply::Text(MOCK_INSIGHT_RESPONSE.to_string())
        }
    }
}

fn error_response(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "mock failure").into_response()
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<MockState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    match next_reply(&state).await {
        MockReply::Text(response) | MockReply::Delayed(_, response) => Json(GenerateResponse {
            model: request.model,
            response,
            done: true,
        })
        .into_response(),
        MockReply::Status(status) => error_response(status),
    }
}

/// OpenAI-compatible chat completions endpoint
async fn handle_chat(
    State(state): State<MockState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match next_reply(&state).await {
        MockReply::Text(content) | MockReply::Delayed(_, content) => Json(ChatResponse {
            model: request.model,
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
            }],
        })
        .into_response(),
        MockReply::Status(status) => error_response(status),
    }
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
        }],
    })
}

/// OpenAI-compatible models endpoint (health check)
async fn handle_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        data: vec![ModelEntry {
            id: "gpt-4o-mini".to_string(),
        }],
    })
}

// Request/Response types for the mock server

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Serialize)]
struct ChatChoice {
    index: u32,
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, OpenAICompatibleBackend};
    use crate::config::InsightConfig;
    use crate::error::Error;
    use crate::insights::{CustomerDigest, Digest, InsightGenerator};
    use crate::models::{PeriodComparison, ReportPeriod, SalesSummary, SeasonalSummary};
    use crate::prompts::{PromptId, PromptLibrary};
    use chrono::NaiveDate;

    fn digest() -> Digest {
        let day = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let period = ReportPeriod {
            start_date: day,
            end_date: day,
        };
        Digest {
            period,
            region: "Europe".into(),
            sales: SalesSummary {
                period,
                region: "Europe".into(),
                total_revenue: 1250.0,
                total_transactions: 5,
                average_order_value: 250.0,
                visits: 100,
                conversion_rate: 5.0,
                period_comparison: PeriodComparison {
                    previous_period: period,
                    previous_revenue: 1000.0,
                    previous_transactions: 4,
                    revenue_growth: 25.0,
                    transaction_growth: 25.0,
                },
            },
            customers: CustomerDigest {
                total_customers: 3,
                returning_customers: 1,
                retention_rate: 33.33,
                segments: vec![],
            },
            categories: vec![],
            top_products: vec![],
            seasonal: SeasonalSummary {
                as_of: day,
                region: "Europe".into(),
                months: 1,
                threshold_pct: 20.0,
                mean_monthly_revenue: 1250.0,
                monthly_trends: vec![],
                seasonal_patterns: vec![],
                peak_periods: vec![],
            },
        }
    }

    fn generator(client: AIClient, timeout_secs: u64) -> InsightGenerator {
        let prompt = PromptLibrary::embedded_only()
            .get(PromptId::SalesInsights)
            .unwrap()
            .clone();
        let config = InsightConfig {
            timeout_secs,
            max_retries: 1,
            backoff_base_ms: 10,
            max_recommendations: 5,
        };
        InsightGenerator::with_prompt(client, prompt, config)
    }

    #[tokio::test]
    async fn test_openai_compatible_insights_end_to_end() {
        let server = MockLlmServer::start(ServerBehavior::WellFormed).await;
        let client = AIClient::OpenAICompatible(OpenAICompatibleBackend::new(
            &server.url(),
            "gpt-4o-mini",
        ));

        let report = generator(client, 5).generate_insights(&digest()).await.unwrap();
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.model, "gpt-4o-mini");
        assert_eq!(server.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_server_exhausts_retries() {
        let server = MockLlmServer::start(ServerBehavior::RateLimited).await;
        let client = AIClient::ollama(&server.url(), "llama3.2");

        let err = generator(client, 5)
            .generate_insights(&digest())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsightGeneration { attempts: 2, .. }));
        assert_eq!(server.calls(), 2);
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockLlmServer::start(ServerBehavior::Slow(Duration::from_secs(3))).await;
        let client = AIClient::ollama(&server.url(), "llama3.2");

        let err = generator(client, 1)
            .generate_insights(&digest())
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::InsightGeneration { ref message, .. } if message.contains("timed out"))
        );
    }
}
