//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use vantage_core::ai::AIClient;
use vantage_core::AnalyticsConfig;
use vantage_server::{AppState, ServerConfig, CORS_ORIGINS_ENV};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    config: AnalyticsConfig,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Vantage web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    println!("   Regions: {}", config.regions.join(", "));

    let server_config = ServerConfig::from_env();
    if server_config.allowed_origins.is_empty() {
        println!("   🔒 CORS: same-origin only (set {} to allow others)", CORS_ORIGINS_ENV);
    } else {
        println!(
            "   🌐 CORS origins: {} ({})",
            server_config.allowed_origins.join(", "),
            CORS_ORIGINS_ENV
        );
    }

    let ai = AIClient::from_env();
    if ai.is_none() {
        println!("   💡 Tip: Set OLLAMA_HOST to enable AI insights");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;
    let state = AppState::new(db, config, ai).context("Failed to build server state")?;

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    vantage_server::serve(state, host, port, static_dir_str, server_config).await?;

    Ok(())
}
