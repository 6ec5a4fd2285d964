//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::NaiveDate;
use tempfile::TempDir;
use vantage_core::ai::AIClient;
use vantage_core::db::Database;
use vantage_core::{AnalyticsConfig, RegionFilter};

use crate::cli::WindowArgs;
use crate::commands::{self, truncate};

fn config() -> AnalyticsConfig {
    AnalyticsConfig::embedded().unwrap()
}

/// A database file in a temp directory. Keep the `TempDir` alive for the test.
fn setup_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = commands::open_db(&dir.path().join("vantage.db")).unwrap();
    (dir, db)
}

fn seeded_db() -> (TempDir, Database) {
    let (dir, db) = setup_test_db();
    commands::cmd_seed(&db, &config(), Some(3), 120, 40).unwrap();
    (dir, db)
}

fn all_time() -> WindowArgs {
    WindowArgs {
        period: "all".to_string(),
        from: None,
        to: None,
        region: None,
    }
}

fn range(from: &str, to: &str) -> WindowArgs {
    WindowArgs {
        period: "all".to_string(),
        from: Some(from.to_string()),
        to: Some(to.to_string()),
        region: None,
    }
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("CloudSync Professional", 10), "CloudSy...");
    assert_eq!(truncate("Zürich Ränder GmbH", 9), "Zürich...");
}

#[test]
fn test_resolve_window_uses_explicit_range() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let (window, region) =
        commands::resolve_window(&config(), &range("2024-01-01", "2024-01-31"), today).unwrap();
    assert_eq!(window.start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(window.end(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    assert_eq!(region, RegionFilter::All);
}

#[test]
fn test_resolve_window_period_and_region() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let mut args = all_time();
    args.period = "last-month".to_string();
    args.region = Some("europe".to_string());

    let (window, region) = commands::resolve_window(&config(), &args, today).unwrap();
    assert_eq!(window.start(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    assert_eq!(region, RegionFilter::Only("Europe".to_string()));
}

#[test]
fn test_resolve_window_rejects_bad_input() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let config = config();

    let mut args = all_time();
    args.period = "fortnight".to_string();
    assert!(commands::resolve_window(&config, &args, today).is_err());

    assert!(commands::resolve_window(&config, &range("2024-02-01", "2024-01-01"), today).is_err());
    assert!(commands::resolve_window(&config, &range("01/01/2024", "2024-01-31"), today).is_err());

    let mut args = all_time();
    args.region = Some("Atlantis".to_string());
    assert!(commands::resolve_window(&config, &args, today).is_err());
}

// ========== Core Command Tests ==========

#[test]
fn test_cmd_init_creates_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.db");

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path).unwrap();
    assert_eq!(db.counts().unwrap().transactions, 0);
}

#[test]
fn test_cmd_seed_is_idempotent() {
    let (_dir, db) = seeded_db();
    let before = db.counts().unwrap();
    assert!(before.transactions > 0);
    assert!(before.customers > 0 && before.customers <= 40);

    commands::cmd_seed(&db, &config(), Some(99), 120, 40).unwrap();
    assert_eq!(db.counts().unwrap(), before);
}

#[test]
fn test_cmd_seed_rejects_empty_options() {
    let (_dir, db) = setup_test_db();
    assert!(commands::cmd_seed(&db, &config(), None, 0, 10).is_err());
    assert!(commands::cmd_seed(&db, &config(), None, 10, 0).is_err());
    assert_eq!(db.counts().unwrap().transactions, 0);
}

#[test]
fn test_cmd_config_renders() {
    assert!(commands::cmd_config(&config()).is_ok());
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analytics.toml");
    let mut config = config();
    config.regions = vec!["North".to_string(), "South".to_string()];
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = commands::load_config(Some(&path)).unwrap();
    assert_eq!(loaded.regions, vec!["North", "South"]);

    std::fs::write(&path, "regions = [").unwrap();
    assert!(commands::load_config(Some(&path)).is_err());
}

// ========== Report Command Tests ==========

#[test]
fn test_reports_on_seeded_data() {
    let (_dir, db) = seeded_db();
    let config = config();

    commands::cmd_report_sales(&db, &config, &all_time()).unwrap();
    commands::cmd_report_customers(&db, &config, &all_time(), Some(3)).unwrap();
    commands::cmd_report_products(&db, &config, &all_time(), None).unwrap();
    commands::cmd_report_seasonal(&db, &config, None, None, Some(6), None).unwrap();
}

#[test]
fn test_reports_on_empty_database() {
    let (_dir, db) = setup_test_db();
    let config = config();

    commands::cmd_report_sales(&db, &config, &all_time()).unwrap();
    commands::cmd_report_customers(&db, &config, &all_time(), None).unwrap();
    commands::cmd_report_products(&db, &config, &all_time(), None).unwrap();
    commands::cmd_report_seasonal(&db, &config, Some("2024-06-30"), None, None, None).unwrap();
}

#[test]
fn test_seasonal_report_validates_arguments() {
    let (_dir, db) = setup_test_db();
    let config = config();

    assert!(commands::cmd_report_seasonal(&db, &config, None, None, Some(0), None).is_err());
    assert!(commands::cmd_report_seasonal(&db, &config, None, None, None, Some(-5.0)).is_err());
    assert!(commands::cmd_report_seasonal(&db, &config, Some("June"), None, None, None).is_err());
    assert!(
        commands::cmd_report_seasonal(&db, &config, None, Some("Atlantis"), None, None).is_err()
    );
}

// ========== Export Command Tests ==========

#[test]
fn test_cmd_export_csv() {
    let (dir, db) = seeded_db();
    let out = dir.path().join("report.csv");

    let written =
        commands::cmd_export(&db, &config(), "csv", Some(&out), &all_time()).unwrap();
    assert_eq!(written, out);

    let content = std::fs::read_to_string(&out).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("Transaction ID,Date,Customer Name"));
    assert_eq!(
        lines.count() as i64,
        db.counts().unwrap().transactions
    );
}

#[test]
fn test_cmd_export_json_for_region() {
    let (dir, db) = seeded_db();
    let out = dir.path().join("report.json");
    let mut args = all_time();
    args.region = Some("Europe".to_string());

    commands::cmd_export(&db, &config(), "JSON", Some(&out), &args).unwrap();

    let rows: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert!(rows.iter().all(|r| r["Region"] == "Europe"));
}

#[test]
fn test_cmd_export_rejects_unknown_format() {
    let (dir, db) = setup_test_db();
    let out = dir.path().join("report.xlsx");
    assert!(commands::cmd_export(&db, &config(), "xlsx", Some(&out), &all_time()).is_err());
    assert!(!out.exists());
}

// ========== Insights Command Tests ==========

#[tokio::test]
async fn test_generate_insights_with_mock_backend() {
    let (_dir, db) = seeded_db();

    let report = commands::generate_insight_report(&db, config(), &all_time(), AIClient::mock())
        .await
        .unwrap();
    assert!(!report.narrative.is_empty());
    assert!(!report.recommendations.is_empty());
    assert_eq!(report.model, "mock");
}

// ========== Prompts Command Tests ==========

#[test]
fn test_cmd_prompts() {
    assert!(commands::cmd_prompts_list().is_ok());
    assert!(commands::cmd_prompts_show("sales_insights").is_ok());
    assert!(commands::cmd_prompts_show("weekly_digest").is_err());
    assert!(commands::cmd_prompts_path().is_ok());
}
