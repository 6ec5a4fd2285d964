//! Aggregate digest handed to the insight prompt
//!
//! A digest carries figures only. Customer names, customer ids and raw
//! transactions never reach the AI backend.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::analytics::Snapshot;
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::models::{
    CategoryPerformance, CustomerSummary, ProductRanking, ProductSummary, ReportPeriod,
    SalesSummary, SeasonalSummary, SegmentBucket,
};
use crate::prompts::Prompt;

/// Products listed in the prompt
const DIGEST_TOP_PRODUCTS: usize = 5;

/// Customer-side aggregates, without identities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDigest {
    pub total_customers: i64,
    pub returning_customers: i64,
    pub retention_rate: f64,
    pub segments: Vec<SegmentBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Digest {
    pub period: ReportPeriod,
    pub region: String,
    pub sales: SalesSummary,
    pub customers: CustomerDigest,
    pub categories: Vec<CategoryPerformance>,
    pub top_products: Vec<ProductRanking>,
    pub seasonal: SeasonalSummary,
}

impl Digest {
    /// Assemble a digest from finished reports, dropping customer identities
    pub fn from_reports(
        sales: SalesSummary,
        customers: CustomerSummary,
        products: ProductSummary,
        seasonal: SeasonalSummary,
    ) -> Self {
        let mut top_products = products.top_products;
        top_products.truncate(DIGEST_TOP_PRODUCTS);
        Self {
            period: sales.period,
            region: sales.region.clone(),
            customers: CustomerDigest {
                total_customers: customers.total_customers,
                returning_customers: customers.returning_customers,
                retention_rate: customers.customer_retention_rate,
                segments: customers.segment_breakdown,
            },
            categories: products.category_performance,
            top_products,
            seasonal,
            sales,
        }
    }

    /// Build every report from one snapshot. The aggregators run as
    /// separate blocking tasks over the shared records.
    pub async fn collect(snapshot: Arc<Snapshot>, config: Arc<AnalyticsConfig>) -> Result<Self> {
        let threshold = config.seasonal.peak_threshold_pct;
        let limit = config.reports.top_n;

        let sales = {
            let snapshot = snapshot.clone();
            tokio::task::spawn_blocking(move || snapshot.sales_summary())
        };
        let customers = {
            let (snapshot, config) = (snapshot.clone(), config.clone());
            tokio::task::spawn_blocking(move || snapshot.customer_summary(&config, limit))
        };
        let products = {
            let (snapshot, config) = (snapshot.clone(), config.clone());
            tokio::task::spawn_blocking(move || snapshot.product_summary(&config, limit))
        };
        let seasonal = tokio::task::spawn_blocking(move || snapshot.seasonal_summary(threshold));

        let (sales, customers, products, seasonal) =
            tokio::join!(sales, customers, products, seasonal);

        Ok(Self::from_reports(sales?, customers?, products?, seasonal??))
    }

    /// Template variables in a fixed order with fixed number formatting
    pub fn prompt_vars(&self) -> Vec<(&'static str, String)> {
        let sales = &self.sales;
        let comparison = &sales.period_comparison;

        let segments = self
            .customers
            .segments
            .iter()
            .map(|s| format!("- {}: {}, {}", s.label, s.count, money(s.revenue)))
            .collect::<Vec<_>>()
            .join("\n");
        let categories = self
            .categories
            .iter()
            .map(|c| {
                format!(
                    "- {}: {}, {} units, {:.1}%",
                    c.category,
                    money(c.revenue),
                    c.units_sold,
                    c.revenue_share
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let top_products = self
            .top_products
            .iter()
            .map(|p| format!("- {}: {}, {} units", p.name, money(p.revenue), p.units_sold))
            .collect::<Vec<_>>()
            .join("\n");
        let monthly = self
            .seasonal
            .monthly_trends
            .iter()
            .map(|m| format!("- {}: {}, {}", m.label, money(m.revenue), m.transactions))
            .collect::<Vec<_>>()
            .join("\n");
        let peaks = self
            .seasonal
            .peak_periods
            .iter()
            .map(|p| format!("- {}: {} (+{:.1}%)", p.label, money(p.revenue), p.above_average))
            .collect::<Vec<_>>()
            .join("\n");

        vec![
            (
                "period",
                format!("{} to {}", self.period.start_date, self.period.end_date),
            ),
            ("region", self.region.clone()),
            ("total_revenue", money(sales.total_revenue)),
            ("total_transactions", sales.total_transactions.to_string()),
            ("average_order_value", money(sales.average_order_value)),
            ("conversion_rate", format!("{:.2}", sales.conversion_rate)),
            (
                "previous_period",
                format!(
                    "{} to {}",
                    comparison.previous_period.start_date, comparison.previous_period.end_date
                ),
            ),
            ("previous_revenue", money(comparison.previous_revenue)),
            (
                "previous_transactions",
                comparison.previous_transactions.to_string(),
            ),
            ("revenue_growth", format!("{:.2}", comparison.revenue_growth)),
            (
                "transaction_growth",
                format!("{:.2}", comparison.transaction_growth),
            ),
            ("total_customers", self.customers.total_customers.to_string()),
            (
                "retention_rate",
                format!("{:.2}", self.customers.retention_rate),
            ),
            ("segments", or_none(segments)),
            ("categories", or_none(categories)),
            ("top_products", or_none(top_products)),
            ("months", self.seasonal.months.to_string()),
            ("monthly_trends", or_none(monthly)),
            (
                "mean_monthly_revenue",
                money(self.seasonal.mean_monthly_revenue),
            ),
            ("threshold_pct", format!("{:.0}", self.seasonal.threshold_pct)),
            ("peaks", peaks),
        ]
    }

    /// Render the prompt's user section for this digest
    pub fn render(&self, prompt: &Prompt) -> String {
        let vars = self.prompt_vars();
        let map: HashMap<&str, &str> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
        prompt.render_user(&map)
    }
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn or_none(lines: String) -> String {
    if lines.is_empty() {
        "- none".to_string()
    } else {
        lines
    }
}
