//! Sales report export command

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vantage_core::db::Database;
use vantage_core::{build_sales_report, AnalyticsConfig, ExportFormat};

use super::{resolve_window, today};
use crate::cli::WindowArgs;

/// Write the sales report and return the path written
pub fn cmd_export(
    db: &Database,
    config: &AnalyticsConfig,
    format: &str,
    out: Option<&Path>,
    args: &WindowArgs,
) -> Result<PathBuf> {
    let format: ExportFormat = format.parse()?;
    let (window, region) = resolve_window(config, args, today())?;

    let table = build_sales_report(db, window, &region, config)?;
    let bytes = table.render(format)?;

    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(table.filename(format)));
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "✅ Exported {} transactions ({} to {}, region: {}) to {}",
        table.rows.len(),
        window.start(),
        window.end(),
        table.region,
        path.display()
    );

    Ok(path)
}
