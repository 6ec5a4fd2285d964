//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Vantage - Sales analytics with AI-generated insights
#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Sales analytics engine with LLM-generated insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "vantage.db", global = true)]
    pub db: PathBuf,

    /// Analytics config file (overrides VANTAGE_CONFIG and the default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Reporting window selection shared by report, insights and export
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Period preset: this-month, last-month, this-year, last-year,
    /// last-30-days, last-90-days, last-12-months, all
    #[arg(short, long, default_value = "all")]
    pub period: String,

    /// Custom start date (YYYY-MM-DD, requires --to)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Custom end date (YYYY-MM-DD, requires --from)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Restrict to one region
    #[arg(short, long)]
    pub region: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Populate an empty database with generated sample data
    Seed {
        /// Random seed (same seed, same data)
        #[arg(long)]
        seed: Option<u64>,

        /// Days of history to generate
        #[arg(long, default_value = "730")]
        days: i64,

        /// Number of customers to generate
        #[arg(long, default_value = "500")]
        customers: usize,
    },

    /// Show an analytics report
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Generate AI insights for a window (requires OLLAMA_HOST or another AI backend)
    Insights {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Export the sales report
    Export {
        /// Output format: csv or json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (defaults to sales_report_<start>_<end>.<ext>)
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory to serve the dashboard from
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print the effective analytics config as TOML
    Config,

    /// Manage the prompt library
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Revenue, transactions and period-over-period growth
    Sales {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Retention, segment breakdown and top customers
    Customers {
        #[command(flatten)]
        window: WindowArgs,

        /// Number of top customers to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Top products, category performance and inventory flags
    Products {
        #[command(flatten)]
        window: WindowArgs,

        /// Number of top products to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Monthly trends, quarterly patterns and peak months
    Seasonal {
        /// Last day of the trend series (YYYY-MM-DD, default: today)
        #[arg(long)]
        end: Option<String>,

        /// Restrict to one region
        #[arg(short, long)]
        region: Option<String>,

        /// Number of calendar months
        #[arg(short, long)]
        months: Option<u32>,

        /// Peak threshold in percent above the monthly mean
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g. sales_insights)
        prompt_id: String,
    },

    /// Print the prompt override directory
    Path,
}
