//! Vantage Core Library
//!
//! Shared functionality for the Vantage sales analytics engine:
//! - Record model and SQLite record store with migrations
//! - Metric primitives and time windows with period comparison
//! - Sales, customer, product and seasonal aggregators
//! - Pluggable AI backends (Ollama, OpenAI-compatible) for narrative insights
//! - Prompt library for customizable AI prompts
//! - Sales report export and deterministic sample data

pub mod ai;
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod prompts;
pub mod store;
pub mod window;

/// Test utilities including a mock LLM server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, MockReply, OllamaBackend, OpenAICompatibleBackend};
pub use analytics::{Analytics, Snapshot};
pub use config::AnalyticsConfig;
pub use db::{Database, SampleDataOptions, SeedResult, StoreCounts};
pub use error::{Error, Result};
pub use export::{build_sales_report, ExportFormat, ReportTable, SalesReportRow};
pub use insights::{Digest, InsightGenerator};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use store::RecordStore;
pub use window::{MetricWindow, Period, RecordQuery, RegionFilter};
