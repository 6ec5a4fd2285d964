//! Vantage CLI - Sales analytics engine
//!
//! Usage:
//!   vantage init                       Initialize database
//!   vantage seed                       Generate sample data
//!   vantage report sales --period all  Show headline KPIs
//!   vantage insights                   Generate AI insights
//!   vantage serve --port 3000          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Seed {
            seed,
            days,
            customers,
        } => {
            let db = commands::open_db(&cli.db)?;
            let config = commands::load_config(config_path)?;
            commands::cmd_seed(&db, &config, seed, days, customers)
        }
        Commands::Report { report_type } => {
            let db = commands::open_db(&cli.db)?;
            let config = commands::load_config(config_path)?;
            match report_type {
                ReportType::Sales { window } => commands::cmd_report_sales(&db, &config, &window),
                ReportType::Customers { window, limit } => {
                    commands::cmd_report_customers(&db, &config, &window, limit)
                }
                ReportType::Products { window, limit } => {
                    commands::cmd_report_products(&db, &config, &window, limit)
                }
                ReportType::Seasonal {
                    end,
                    region,
                    months,
                    threshold,
                } => commands::cmd_report_seasonal(
                    &db,
                    &config,
                    end.as_deref(),
                    region.as_deref(),
                    months,
                    threshold,
                ),
            }
        }
        Commands::Insights { window } => {
            let db = commands::open_db(&cli.db)?;
            let config = commands::load_config(config_path)?;
            commands::cmd_insights(&db, config, &window).await
        }
        Commands::Export {
            format,
            out,
            window,
        } => {
            let db = commands::open_db(&cli.db)?;
            let config = commands::load_config(config_path)?;
            commands::cmd_export(&db, &config, &format, out.as_deref(), &window).map(|_| ())
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_serve(&cli.db, config, &host, port, static_dir.as_deref()).await
        }
        Commands::Config => {
            let config = commands::load_config(config_path)?;
            commands::cmd_config(&config)
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
