//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `load_config` - Shared utilities used by every command
//! - `resolve_window` - Turn `--period`/`--from`/`--to`/`--region` into a window and filter
//! - `cmd_init` - Initialize the database
//! - `cmd_seed` - Generate sample data
//! - `cmd_config` - Print the effective analytics config

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::debug;
use vantage_core::db::{Database, SampleDataOptions};
use vantage_core::{window, AnalyticsConfig, MetricWindow, RegionFilter};

use crate::cli::WindowArgs;

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load the analytics config: `--config` > `VANTAGE_CONFIG` > user override > embedded
pub fn load_config(explicit: Option<&Path>) -> Result<AnalyticsConfig> {
    AnalyticsConfig::load(explicit).context("Failed to load analytics config")
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve window arguments relative to `today`
pub fn resolve_window(
    config: &AnalyticsConfig,
    args: &WindowArgs,
    today: NaiveDate,
) -> Result<(MetricWindow, RegionFilter)> {
    let window = window::resolve_window(
        Some(&args.period),
        args.from.as_deref(),
        args.to.as_deref(),
        today,
    )?;
    let region = RegionFilter::parse(args.region.as_deref(), &config.regions)?;
    debug!(window = %window, region = region.label(), "Resolved report window");
    Ok((window, region))
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let counts = db.counts()?;
    println!(
        "   {} customers, {} products, {} transactions",
        counts.customers, counts.products, counts.transactions
    );

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Generate sample data: vantage seed");
    println!("  2. View a report: vantage report sales");
    println!("  3. Start web UI: vantage serve");

    Ok(())
}

pub fn cmd_seed(
    db: &Database,
    config: &AnalyticsConfig,
    seed: Option<u64>,
    days: i64,
    customers: usize,
) -> Result<()> {
    if days < 1 {
        anyhow::bail!("--days must be at least 1");
    }
    if customers == 0 {
        anyhow::bail!("--customers must be at least 1");
    }

    let mut options = SampleDataOptions::new(today(), config.regions.clone());
    if let Some(seed) = seed {
        options = options.with_seed(seed);
    }
    options.days = days;
    options.customers = customers;

    println!("🌱 Generating sample data (seed {})...", options.seed);
    let result = db
        .generate_sample_data(&options)
        .context("Failed to generate sample data")?;

    if result.created {
        let counts = db.counts()?;
        println!("✅ {}", result.message());
        println!("   Customers:    {}", counts.customers);
        println!("   Products:     {}", counts.products);
        println!("   Visit days:   {}", counts.visit_days);
    } else {
        println!("ℹ️  {}", result.message());
        println!("   Use a fresh --db path to generate a new data set.");
    }

    Ok(())
}

pub fn cmd_config(config: &AnalyticsConfig) -> Result<()> {
    let rendered = config.to_toml().context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}
