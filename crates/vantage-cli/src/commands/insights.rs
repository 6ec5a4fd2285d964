//! AI insight command

use std::sync::Arc;

use anyhow::{Context, Result};
use vantage_core::ai::{AIBackend, AIClient};
use vantage_core::db::Database;
use vantage_core::models::InsightReport;
use vantage_core::{Analytics, AnalyticsConfig, Digest, InsightGenerator};

use super::{resolve_window, today};
use crate::cli::WindowArgs;

pub async fn cmd_insights(db: &Database, config: AnalyticsConfig, args: &WindowArgs) -> Result<()> {
    let Some(client) = AIClient::from_env() else {
        println!("⚠️  No AI backend configured.");
        println!("   Set OLLAMA_HOST (or AI_BACKEND=openai_compatible with OPENAI_COMPATIBLE_HOST)");
        return Ok(());
    };

    println!(
        "🤖 Generating insights with {} ({}, model: {})...",
        client.host(),
        client.kind(),
        client.model()
    );

    let report = generate_insight_report(db, config, args, client).await?;
    print_report(&report);
    Ok(())
}

/// Build the digest for the window and run the insight generator
pub async fn generate_insight_report(
    db: &Database,
    config: AnalyticsConfig,
    args: &WindowArgs,
    client: AIClient,
) -> Result<InsightReport> {
    let (window, region) = resolve_window(&config, args, today())?;
    let snapshot = Analytics::new(db, &config).snapshot(window, &region)?;

    let config = Arc::new(config);
    let digest = Digest::collect(Arc::new(snapshot), config.clone()).await?;
    let generator = InsightGenerator::new(client, config.insights.clone())
        .context("Failed to load insight prompt")?;

    let report = generator.generate_insights(&digest).await?;
    Ok(report)
}

fn print_report(report: &InsightReport) {
    println!();
    println!("💡 Insights");
    println!("   ─────────────────────────────────────────────────────────────");
    for line in report.narrative.lines() {
        println!("   {}", line);
    }

    if !report.trends_analysis.is_empty() {
        println!();
        println!("📈 Trends");
        for line in report.trends_analysis.lines() {
            println!("   {}", line);
        }
    }

    println!();
    println!("✅ Recommendations");
    for (i, rec) in report.recommendations.iter().enumerate() {
        println!("   {}. {}", i + 1, rec);
    }

    println!();
    println!(
        "   Generated {} by {}",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.model
    );
}
