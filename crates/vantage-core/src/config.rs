//! Analytics configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. Explicit path (`--config` or `VANTAGE_CONFIG`)
//! 2. Override in data dir (~/.local/share/vantage/config/analytics.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::metrics::amount_to_cents;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analytics.toml");

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "VANTAGE_CONFIG";

/// Full analytics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub regions: Vec<String>,
    pub segments: SegmentConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub seasonal: SeasonalConfig,
    #[serde(default)]
    pub reports: ReportConfig,
    #[serde(default)]
    pub insights: InsightConfig,
}

/// Ordered customer segment rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub rules: Vec<SegmentRule>,
    /// Label for customers no rule matches
    pub fallback: String,
}

/// A segment rule. Every minimum that is set must be met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_transactions: Option<i64>,
    /// Lifetime revenue in currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_revenue: Option<f64>,
}

impl SegmentRule {
    pub fn matches(&self, transaction_count: i64, lifetime_revenue_cents: i64) -> bool {
        let tx_ok = self
            .min_transactions
            .map_or(true, |min| transaction_count >= min);
        let revenue_ok = self
            .min_revenue
            .map_or(true, |min| lifetime_revenue_cents >= amount_to_cents(min));
        tx_ok && revenue_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// `low_stock` when stock is strictly below this
    pub low_stock_threshold: i64,
    /// `fast_moving` when recent units sold is strictly above this
    pub fast_moving_threshold: i64,
    /// `slow_moving` when recent units sold is strictly below this
    pub slow_moving_threshold: i64,
    pub velocity_window_days: i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 50,
            fast_moving_threshold: 150,
            slow_moving_threshold: 40,
            velocity_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    pub months: u32,
    pub peak_threshold_pct: f64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            months: 12,
            peak_threshold_pct: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
    pub max_top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            max_top_n: 100,
        }
    }
}

impl ReportConfig {
    /// Requested limit, or the default, capped at `max_top_n`
    pub fn limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.top_n).min(self.max_top_n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub timeout_secs: u64,
    /// Extra attempts after the first, for transient failures only
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_recommendations: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 1,
            backoff_base_ms: 500,
            max_recommendations: 5,
        }
    }
}

impl InsightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `attempt` (0-based): base * 2^attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(2u64.saturating_pow(attempt)))
    }
}

impl AnalyticsConfig {
    /// Load using the layered resolution described in the module docs
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);

        if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
            info!(path = %path.display(), "Loading analytics config");
            return Self::from_file(&path);
        }

        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            info!(path = %path.display(), "Loading analytics config override");
            return Self::from_file(&path);
        }

        debug!("Using embedded analytics config");
        Self::embedded()
    }

    /// The defaults compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(Error::Config("at least one region is required".into()));
        }
        if self.regions.iter().any(|r| r.eq_ignore_ascii_case("all")) {
            return Err(Error::Config("'all' is reserved and cannot be a region".into()));
        }
        if self.segments.rules.is_empty() {
            return Err(Error::Config("at least one segment rule is required".into()));
        }
        if self.segments.rules.iter().any(|r| r.label == self.segments.fallback) {
            return Err(Error::Config(format!(
                "segment label '{}' is also the fallback label",
                self.segments.fallback
            )));
        }
        let inv = &self.inventory;
        if inv.low_stock_threshold < 0
            || inv.fast_moving_threshold < 0
            || inv.slow_moving_threshold < 0
        {
            return Err(Error::Config("inventory thresholds must be non-negative".into()));
        }
        if inv.slow_moving_threshold > inv.fast_moving_threshold {
            return Err(Error::Config(
                "slow_moving_threshold must not exceed fast_moving_threshold".into(),
            ));
        }
        if inv.velocity_window_days < 1 {
            return Err(Error::Config("velocity_window_days must be at least 1".into()));
        }
        if !(1..=120).contains(&self.seasonal.months) {
            return Err(Error::Config("seasonal.months must be between 1 and 120".into()));
        }
        if self.seasonal.peak_threshold_pct < 0.0 {
            return Err(Error::Config("peak_threshold_pct must be non-negative".into()));
        }
        if self.insights.timeout_secs == 0 {
            return Err(Error::Config("insights.timeout_secs must be at least 1".into()));
        }
        if self.insights.max_recommendations == 0 {
            return Err(Error::Config("max_recommendations must be at least 1".into()));
        }
        Ok(())
    }

    /// Render back to TOML (for `vantage config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("vantage").join("config").join("analytics.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_parses() {
        let config = AnalyticsConfig::embedded().unwrap();
        assert_eq!(config.regions.len(), 5);
        assert!(config.regions.contains(&"Asia-Pacific".to_string()));
        assert_eq!(config.segments.fallback, "New");
        assert_eq!(config.insights.max_retries, 1);
        assert_eq!(config.insights.max_recommendations, 5);
        assert_eq!(config.seasonal.peak_threshold_pct, 20.0);
    }

    #[test]
    fn test_segment_rule_matching() {
        let rule = SegmentRule {
            label: "VIP".into(),
            min_transactions: Some(3),
            min_revenue: Some(100.0),
        };
        assert!(rule.matches(3, 10_000));
        assert!(!rule.matches(2, 10_000));
        assert!(!rule.matches(3, 9_999));

        let open = SegmentRule {
            label: "Anyone".into(),
            min_transactions: None,
            min_revenue: None,
        };
        assert!(open.matches(0, 0));
    }

    #[test]
    fn test_sections_default_when_missing() {
        let config = AnalyticsConfig::parse(
            r#"
regions = ["Europe"]

[segments]
fallback = "Other"

[[segments.rules]]
label = "Repeat"
min_transactions = 2
"#,
        )
        .unwrap();
        assert_eq!(config.inventory, InventoryConfig::default());
        assert_eq!(config.reports.top_n, 10);
    }

    #[test]
    fn test_validation_rejects_overlapping_velocity() {
        let mut config = AnalyticsConfig::embedded().unwrap();
        config.inventory.slow_moving_threshold = 500;
        config.inventory.fast_moving_threshold = 100;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_zero_insight_timeout() {
        let mut config = AnalyticsConfig::embedded().unwrap();
        config.insights.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(msg)) if msg.contains("timeout_secs")));

        config.insights.timeout_secs = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_regions_and_rules() {
        let mut config = AnalyticsConfig::embedded().unwrap();
        config.regions.clear();
        assert!(config.validate().is_err());

        let mut config = AnalyticsConfig::embedded().unwrap();
        config.segments.rules.clear();
        assert!(config.validate().is_err());

        let mut config = AnalyticsConfig::embedded().unwrap();
        config.regions.push("All".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let insights = InsightConfig {
            backoff_base_ms: 100,
            ..Default::default()
        };
        assert_eq!(insights.backoff(0), Duration::from_millis(100));
        assert_eq!(insights.backoff(1), Duration::from_millis(200));
        assert_eq!(insights.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_report_limit_capped() {
        let reports = ReportConfig::default();
        assert_eq!(reports.limit(None), 10);
        assert_eq!(reports.limit(Some(3)), 3);
        assert_eq!(reports.limit(Some(5000)), 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        let mut config = AnalyticsConfig::embedded().unwrap();
        config.seasonal.months = 6;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = AnalyticsConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.seasonal.months, 6);
        assert_eq!(loaded, config);
    }
}
