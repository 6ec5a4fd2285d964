//! Domain models for Vantage
//!
//! Stored records (`Transaction`, `Customer`, `Product`) keep currency as
//! integer cents. Report structs are what the API returns: decimal amounts
//! rounded to two places, dates as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::cents_to_amount;

/// A recorded sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// e.g. `TXN000042`
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity * unit_price_cents`
    pub amount_cents: i64,
    pub timestamp: DateTime<Utc>,
    pub region: String,
    /// Copied from the product when the sale was recorded
    pub category: String,
    pub channel: String,
}

impl Transaction {
    /// Calendar date (UTC) the sale falls on
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn amount(&self) -> f64 {
        cents_to_amount(self.amount_cents)
    }
}

/// A customer as stored. Segment and lifetime figures are derived, see
/// [`CustomerHistory`] and [`crate::analytics::segments`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// e.g. `CUST0007`
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Lifetime statistics for one customer across the full transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerHistory {
    pub customer_id: String,
    pub transaction_count: i64,
    pub lifetime_revenue_cents: i64,
    pub first_seen: NaiveDate,
}

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// e.g. `PROD003`
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit_price_cents: i64,
    pub stock_level: i64,
}

/// Daily visit (opportunity) count for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitCount {
    pub date: NaiveDate,
    pub region: String,
    pub visits: i64,
}

// =============================================================================
// Report structures
// =============================================================================

/// Report period info
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Totals for the preceding window of equal length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub previous_period: ReportPeriod,
    pub previous_revenue: f64,
    pub previous_transactions: i64,
    pub revenue_growth: f64,
    pub transaction_growth: f64,
}

/// Headline KPIs for a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub period: ReportPeriod,
    /// `all` or the canonical region name
    pub region: String,
    pub total_revenue: f64,
    pub total_transactions: i64,
    pub average_order_value: f64,
    pub visits: i64,
    pub conversion_rate: f64,
    pub period_comparison: PeriodComparison,
}

/// One customer in a top-N ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRanking {
    pub customer_id: String,
    pub name: String,
    pub revenue: f64,
    pub transactions: i64,
}

/// One bucket of a partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBucket {
    pub label: String,
    pub count: i64,
    pub revenue: f64,
}

/// Customer-side report for a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub period: ReportPeriod,
    pub region: String,
    pub total_customers: i64,
    pub returning_customers: i64,
    pub customer_retention_rate: f64,
    pub top_customers: Vec<CustomerRanking>,
    pub segment_breakdown: Vec<SegmentBucket>,
}

/// One product in a top-N ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRanking {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub revenue: f64,
    pub units_sold: i64,
    pub avg_price: f64,
}

/// Revenue and volume for one product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub revenue: f64,
    pub units_sold: i64,
    pub transactions: i64,
    /// Share of the window's revenue, in percent
    pub revenue_share: f64,
}

/// Inventory classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryLabel {
    LowStock,
    FastMoving,
    SlowMoving,
}

impl InventoryLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::FastMoving => "fast_moving",
            Self::SlowMoving => "slow_moving",
        }
    }
}

/// A product carrying at least one inventory label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedProduct {
    pub product_id: String,
    pub name: String,
    pub stock_level: i64,
    /// Units sold inside the velocity window
    pub recent_units_sold: i64,
    pub labels: Vec<InventoryLabel>,
}

/// Inventory label counts. A product may carry several labels, so the
/// counts can add up to more than the number of flagged products.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventoryInsights {
    pub low_stock: i64,
    pub fast_moving: i64,
    pub slow_moving: i64,
    pub products: Vec<FlaggedProduct>,
}

/// Product-side report for a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub period: ReportPeriod,
    pub region: String,
    pub top_products: Vec<ProductRanking>,
    pub category_performance: Vec<CategoryPerformance>,
    pub inventory_insights: InventoryInsights,
}

/// A single data point in a trend series (`2024-03` or `2024-Q1`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub revenue: f64,
    pub transactions: i64,
}

/// A month whose revenue clears the peak threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakPeriod {
    pub label: String,
    pub revenue: f64,
    /// Percent above the series mean
    pub above_average: f64,
}

/// Seasonal report ending at `as_of`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalSummary {
    pub as_of: NaiveDate,
    pub region: String,
    pub months: u32,
    pub threshold_pct: f64,
    pub mean_monthly_revenue: f64,
    pub monthly_trends: Vec<TrendPoint>,
    pub seasonal_patterns: Vec<TrendPoint>,
    pub peak_periods: Vec<PeakPeriod>,
}

/// Narrative analysis produced by the AI backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub generated_at: DateTime<Utc>,
    pub narrative: String,
    pub recommendations: Vec<String>,
    pub trends_analysis: String,
    /// Model that produced the text
    pub model: String,
}
