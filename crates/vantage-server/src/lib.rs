//! Vantage Web Server
//!
//! Axum-based REST API for the Vantage sales analytics engine.
//!
//! - Read-only analytics endpoints over the record store
//! - AI insight generation when a backend is configured
//! - Sales report export and the sample data admin operation
//! - Restrictive CORS policy and sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use vantage_core::ai::{AIBackend, AIClient};
use vantage_core::db::Database;
use vantage_core::{AnalyticsConfig, InsightGenerator};

mod handlers;

/// Environment variable with allowed CORS origins (comma separated)
pub const CORS_ORIGINS_ENV: &str = "VANTAGE_CORS_ORIGINS";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var(CORS_ORIGINS_ENV)
            .map(|v| parse_origins(&v))
            .unwrap_or_default();
        Self { allowed_origins }
    }
}

fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: Arc<AnalyticsConfig>,
    pub ai: Option<AIClient>,
    /// Insight generator bound to `ai`, with its prompt loaded
    pub insights: Option<InsightGenerator>,
}

impl AppState {
    /// Build state, loading the insight prompt when an AI backend is given
    pub fn new(
        db: Database,
        config: AnalyticsConfig,
        ai: Option<AIClient>,
    ) -> anyhow::Result<Self> {
        let insights = ai
            .clone()
            .map(|client| InsightGenerator::new(client, config.insights.clone()))
            .transpose()?;
        Ok(Self {
            db,
            config: Arc::new(config),
            ai,
            insights,
        })
    }
}

/// Create the application router
pub fn create_router(state: AppState, static_dir: Option<&str>, config: &ServerConfig) -> Router {
    match state.ai {
        Some(ref client) => info!(
            "AI backend configured: {} ({}, model: {})",
            client.host(),
            client.kind(),
            client.model()
        ),
        None => info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable AI insights)"),
    }

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Admin
        .route("/generate-sample-data", post(handlers::generate_sample_data))
        // Analytics
        .route("/analytics/sales", get(handlers::sales_analytics))
        .route("/analytics/customers", get(handlers::customer_analytics))
        .route("/analytics/products", get(handlers::product_analytics))
        .route("/analytics/seasonal", get(handlers::seasonal_analytics))
        .route("/analytics/ai-insights", get(handlers::ai_insights))
        // Export
        .route("/export/sales-report", get(handlers::export_sales_report));

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
            .expose_headers([header::CONTENT_DISPOSITION])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve the dashboard if a directory is provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if let Some(ref client) = state.ai {
        check_ai_connection(client).await;
    }

    let app = create_router(state, static_dir, &config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(client: &AIClient) {
    if client.health_check().await {
        info!(
            "✅ AI backend connected: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        warn!(
            "⚠️  AI backend configured but not responding: {} (model: {})",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        use vantage_core::Error as CoreError;

        let err = err.into();
        let (status, public) = match err.downcast_ref::<CoreError>() {
            Some(e) if e.is_bad_request() => (StatusCode::BAD_REQUEST, true),
            Some(CoreError::NotFound(_)) => (StatusCode::NOT_FOUND, true),
            Some(CoreError::AiNotConfigured) => (StatusCode::SERVICE_UNAVAILABLE, true),
            Some(CoreError::InsightGeneration { .. } | CoreError::MalformedInsightResponse { .. }) => {
                (StatusCode::BAD_GATEWAY, true)
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };

        if public {
            warn!(status = status.as_u16(), error = %err, "Request failed");
            return Self {
                status,
                message: err.to_string(),
                internal: None,
            };
        }

        Self {
            status,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
