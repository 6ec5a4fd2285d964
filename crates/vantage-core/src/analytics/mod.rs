//! Analytics engine
//!
//! `Analytics` fetches a complete record set from a [`RecordStore`] and runs
//! the pure aggregators over it:
//! - `sales` - headline KPIs and period comparison
//! - `segments` - segments, retention, rankings, categories, inventory
//! - `seasonal` - monthly trends, quarters, peaks
//!
//! Window and region are explicit arguments of every call.

pub mod seasonal;
pub mod segments;
pub mod sales;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::models::{
    Customer, CustomerHistory, CustomerSummary, Product, ProductSummary, SalesSummary,
    SeasonalSummary, Transaction,
};
use crate::store::RecordStore;
use crate::window::{MetricWindow, RecordQuery, RegionFilter};

/// Records for one window and region, fetched in full before aggregation.
///
/// Every report can be computed from a snapshot, so callers may run the
/// aggregators concurrently over a shared one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub window: MetricWindow,
    pub region: RegionFilter,
    /// Transactions of the window and its comparison window
    pub transactions: Vec<Transaction>,
    pub visits: i64,
    pub history: Vec<CustomerHistory>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    /// Transactions of the inventory velocity window
    pub recent: Vec<Transaction>,
    /// Transactions from the start of the first trend quarter through
    /// `seasonal_as_of`
    pub seasonal: Vec<Transaction>,
    pub seasonal_as_of: NaiveDate,
    pub seasonal_months: u32,
}

impl Snapshot {
    /// A snapshot with no records, for reports that fetch only what they need
    fn bare(window: MetricWindow, region: &RegionFilter) -> Self {
        Self {
            window,
            region: region.clone(),
            transactions: Vec::new(),
            visits: 0,
            history: Vec::new(),
            customers: Vec::new(),
            products: Vec::new(),
            recent: Vec::new(),
            seasonal: Vec::new(),
            seasonal_as_of: window.end(),
            seasonal_months: 1,
        }
    }

    /// Transactions of the current window only
    fn current(&self) -> Vec<Transaction> {
        sales::in_window(&self.transactions, &self.window, &self.region)
            .cloned()
            .collect()
    }

    pub fn sales_summary(&self) -> SalesSummary {
        sales::sales_summary(
            &self.transactions,
            &self.window.comparison(),
            &self.region,
            self.visits,
        )
    }

    pub fn customer_summary(&self, config: &AnalyticsConfig, limit: usize) -> CustomerSummary {
        let current = self.current();
        let retention = segments::retention(&current, &self.history);
        CustomerSummary {
            period: self.window.period(),
            region: self.region.label().to_string(),
            total_customers: retention.total_customers,
            returning_customers: retention.returning_customers,
            customer_retention_rate: retention.rate,
            top_customers: segments::top_customers(&current, &self.customers, limit),
            segment_breakdown: segments::segment_breakdown(
                &current,
                &self.history,
                &config.segments,
            ),
        }
    }

    pub fn product_summary(&self, config: &AnalyticsConfig, limit: usize) -> ProductSummary {
        let current = self.current();
        ProductSummary {
            period: self.window.period(),
            region: self.region.label().to_string(),
            top_products: segments::top_products(&current, &self.products, limit),
            category_performance: segments::category_performance(&current),
            inventory_insights: segments::inventory_insights(
                &self.products,
                &self.recent,
                &config.inventory,
            ),
        }
    }

    pub fn seasonal_summary(&self, threshold_pct: f64) -> Result<SeasonalSummary> {
        let monthly =
            seasonal::monthly_trends(&self.seasonal, self.seasonal_as_of, self.seasonal_months)?;
        let quarters = seasonal::quarter_window(self.seasonal_as_of, self.seasonal_months)?;
        Ok(SeasonalSummary {
            as_of: self.seasonal_as_of,
            region: self.region.label().to_string(),
            months: self.seasonal_months,
            threshold_pct,
            mean_monthly_revenue: crate::metrics::round2(seasonal::mean_revenue(&monthly)),
            seasonal_patterns: seasonal::seasonal_patterns(&self.seasonal, &quarters)?,
            peak_periods: seasonal::peak_periods(&monthly, threshold_pct),
            monthly_trends: monthly,
        })
    }
}

/// Report entry points over a record store
pub struct Analytics<'a> {
    store: &'a dyn RecordStore,
    config: &'a AnalyticsConfig,
}

impl<'a> Analytics<'a> {
    pub fn new(store: &'a dyn RecordStore, config: &'a AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        self.config
    }

    /// Resolve a raw region parameter against the configured regions
    pub fn region(&self, raw: Option<&str>) -> Result<RegionFilter> {
        RegionFilter::parse(raw, &self.config.regions)
    }

    pub fn sales_summary(
        &self,
        window: MetricWindow,
        region: &RegionFilter,
    ) -> Result<SalesSummary> {
        let pair = window.comparison();
        let transactions = self.comparison_transactions(window, region)?;
        let visits = self
            .store
            .visit_count(&RecordQuery::new(pair.current, region.clone()))?;
        Ok(sales::sales_summary(&transactions, &pair, region, visits))
    }

    pub fn customer_summary(
        &self,
        window: MetricWindow,
        region: &RegionFilter,
        limit: Option<usize>,
    ) -> Result<CustomerSummary> {
        let snapshot = Snapshot {
            transactions: self.window_transactions(window, region)?,
            history: self.store.customer_history()?,
            customers: self.store.customers()?,
            ..Snapshot::bare(window, region)
        };
        Ok(snapshot.customer_summary(self.config, self.config.reports.limit(limit)))
    }

    pub fn product_summary(
        &self,
        window: MetricWindow,
        region: &RegionFilter,
        limit: Option<usize>,
    ) -> Result<ProductSummary> {
        let snapshot = Snapshot {
            transactions: self.window_transactions(window, region)?,
            recent: self.velocity_transactions(window, region)?,
            products: self.store.products()?,
            ..Snapshot::bare(window, region)
        };
        Ok(snapshot.product_summary(self.config, self.config.reports.limit(limit)))
    }

    /// Seasonal report for the `months` calendar months ending at `as_of`
    pub fn seasonal_summary(
        &self,
        as_of: NaiveDate,
        region: &RegionFilter,
        months: Option<u32>,
        threshold_pct: Option<f64>,
    ) -> Result<SeasonalSummary> {
        let months = months.unwrap_or(self.config.seasonal.months).clamp(1, 120);
        let threshold = threshold_pct.unwrap_or(self.config.seasonal.peak_threshold_pct);
        let trend_window = seasonal::trend_window(as_of, months)?;
        let quarters = seasonal::quarter_window(as_of, months)?;

        let snapshot = Snapshot {
            seasonal: self.window_transactions(quarters, region)?,
            seasonal_as_of: as_of,
            seasonal_months: months,
            ..Snapshot::bare(trend_window, region)
        };
        snapshot.seasonal_summary(threshold)
    }

    /// Fetch everything every report needs for `window`. The seasonal series
    /// ends at the window's last day.
    pub fn snapshot(&self, window: MetricWindow, region: &RegionFilter) -> Result<Snapshot> {
        let months = self.config.seasonal.months;
        let quarters = seasonal::quarter_window(window.end(), months)?;

        let snapshot = Snapshot {
            window,
            region: region.clone(),
            transactions: self.comparison_transactions(window, region)?,
            visits: self
                .store
                .visit_count(&RecordQuery::new(window, region.clone()))?,
            history: self.store.customer_history()?,
            customers: self.store.customers()?,
            products: self.store.products()?,
            recent: self.velocity_transactions(window, region)?,
            seasonal: self.window_transactions(quarters, region)?,
            seasonal_as_of: window.end(),
            seasonal_months: months,
        };
        debug!(
            window = %window,
            region = region.label(),
            transactions = snapshot.transactions.len(),
            seasonal = snapshot.seasonal.len(),
            "Snapshot fetched"
        );
        Ok(snapshot)
    }

    fn window_transactions(
        &self,
        window: MetricWindow,
        region: &RegionFilter,
    ) -> Result<Vec<Transaction>> {
        let txs = self
            .store
            .transactions(&RecordQuery::new(window, region.clone()))?;
        debug!(window = %window, region = region.label(), count = txs.len(), "Fetched transactions");
        Ok(txs)
    }

    /// Current and comparison window in one query
    fn comparison_transactions(
        &self,
        window: MetricWindow,
        region: &RegionFilter,
    ) -> Result<Vec<Transaction>> {
        let span = MetricWindow::new(window.previous().start(), window.end())?;
        self.window_transactions(span, region)
    }

    /// The velocity window ends on the report window's last day
    fn velocity_transactions(
        &self,
        window: MetricWindow,
        region: &RegionFilter,
    ) -> Result<Vec<Transaction>> {
        let days = self.config.inventory.velocity_window_days.max(1);
        let start = window.end() - Duration::days(days - 1);
        self.window_transactions(MetricWindow::new(start, window.end())?, region)
    }
}
