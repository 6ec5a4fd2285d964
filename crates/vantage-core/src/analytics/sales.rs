//! Time-window aggregation: headline KPIs and period comparison

use crate::metrics::{average, cents_to_amount, count, percentage_growth, round2, sum};
use crate::models::{PeriodComparison, SalesSummary, Transaction};
use crate::window::{ComparisonPair, MetricWindow, RegionFilter};

/// Revenue and transaction count for one window and region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub revenue_cents: i64,
    pub transactions: i64,
}

impl WindowTotals {
    pub fn revenue(&self) -> f64 {
        cents_to_amount(self.revenue_cents)
    }

    /// Revenue per transaction, `0.0` for an empty window
    pub fn average_order_value(&self) -> f64 {
        average(self.revenue(), self.transactions)
    }
}

/// Transactions dated inside `window` whose region passes `region`
pub fn in_window<'a>(
    transactions: &'a [Transaction],
    window: &'a MetricWindow,
    region: &'a RegionFilter,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions
        .iter()
        .filter(move |t| window.contains(t.date()) && region.matches(&t.region))
}

pub fn totals(
    transactions: &[Transaction],
    window: &MetricWindow,
    region: &RegionFilter,
) -> WindowTotals {
    WindowTotals {
        revenue_cents: sum(in_window(transactions, window, region).map(|t| t.amount_cents)),
        transactions: count(in_window(transactions, window, region)),
    }
}

/// `transactions / visits * 100`, `0.0` without visits
pub fn conversion_rate(transactions: i64, visits: i64) -> f64 {
    if visits == 0 {
        0.0
    } else {
        transactions as f64 / visits as f64 * 100.0
    }
}

/// Build the sales summary for `pair.current`, comparing against
/// `pair.previous`. `transactions` must cover both windows; anything outside
/// them is ignored.
pub fn sales_summary(
    transactions: &[Transaction],
    pair: &ComparisonPair,
    region: &RegionFilter,
    visits: i64,
) -> SalesSummary {
    let current = totals(transactions, &pair.current, region);
    let previous = totals(transactions, &pair.previous, region);

    SalesSummary {
        period: pair.current.period(),
        region: region.label().to_string(),
        total_revenue: round2(current.revenue()),
        total_transactions: current.transactions,
        average_order_value: round2(current.average_order_value()),
        visits,
        conversion_rate: round2(conversion_rate(current.transactions, visits)),
        period_comparison: PeriodComparison {
            previous_period: pair.previous.period(),
            previous_revenue: round2(previous.revenue()),
            previous_transactions: previous.transactions,
            revenue_growth: round2(percentage_growth(current.revenue(), previous.revenue())),
            transaction_growth: round2(percentage_growth(
                current.transactions as f64,
                previous.transactions as f64,
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tx(id: &str, date: NaiveDate, region: &str, cents: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            customer_id: "C1".to_string(),
            product_id: "P1".to_string(),
            quantity: 1,
            unit_price_cents: cents,
            amount_cents: cents,
            timestamp: Utc.from_utc_datetime(&date.and_hms_opt(9, 0, 0).unwrap()),
            region: region.to_string(),
            category: "Software".to_string(),
            channel: "Online".to_string(),
        }
    }

    #[test]
    fn test_two_transactions_empty_previous_window() {
        let txs = vec![
            tx("T1", d(2024, 1, 5), "Europe", 10_000),
            tx("T2", d(2024, 2, 10), "Europe", 30_000),
        ];
        let window = MetricWindow::new(d(2024, 1, 1), d(2024, 2, 28)).unwrap();
        let summary = sales_summary(&txs, &window.comparison(), &RegionFilter::All, 0);

        assert_eq!(summary.total_revenue, 400.0);
        assert_eq!(summary.total_transactions, 2);
        assert_eq!(summary.average_order_value, 200.0);
        assert_eq!(summary.conversion_rate, 0.0);
        assert_eq!(summary.period_comparison.previous_revenue, 0.0);
        assert_eq!(summary.period_comparison.revenue_growth, 0.0);
        assert_eq!(summary.period_comparison.transaction_growth, 0.0);
        assert_eq!(summary.region, "all");
    }

    #[test]
    fn test_growth_against_previous_window() {
        let txs = vec![
            tx("T0", d(2024, 1, 20), "Europe", 20_000),
            tx("T1", d(2024, 2, 5), "Europe", 25_000),
            tx("T2", d(2024, 2, 6), "Europe", 5_000),
        ];
        let window = MetricWindow::new(d(2024, 2, 1), d(2024, 2, 10)).unwrap();
        let pair = window.comparison();
        // Jan 20 falls outside the 10-day previous window (Jan 22..Jan 31)
        let summary = sales_summary(&txs, &pair, &RegionFilter::All, 50);
        assert_eq!(summary.period_comparison.previous_transactions, 0);

        let window = MetricWindow::new(d(2024, 2, 1), d(2024, 2, 15)).unwrap();
        let summary = sales_summary(&txs, &window.comparison(), &RegionFilter::All, 50);
        assert_eq!(summary.period_comparison.previous_revenue, 200.0);
        assert_eq!(summary.period_comparison.revenue_growth, 50.0);
        assert_eq!(summary.period_comparison.transaction_growth, 100.0);
        assert_eq!(summary.conversion_rate, 4.0);
    }

    #[test]
    fn test_window_boundaries_inclusive() {
        let txs = vec![
            tx("T1", d(2024, 3, 1), "Europe", 100),
            tx("T2", d(2024, 3, 31), "Europe", 100),
            tx("T3", d(2024, 4, 1), "Europe", 100),
        ];
        let march = MetricWindow::new(d(2024, 3, 1), d(2024, 3, 31)).unwrap();
        assert_eq!(totals(&txs, &march, &RegionFilter::All).transactions, 2);
    }

    #[test]
    fn test_region_partition_sums_to_total() {
        let regions = ["Europe", "North America", "Asia-Pacific"];
        let txs: Vec<Transaction> = (0..30)
            .map(|i| {
                tx(
                    &format!("T{:02}", i),
                    d(2024, 5, 1 + (i % 28) as u32),
                    regions[i % regions.len()],
                    1_000 + (i as i64 * 37),
                )
            })
            .collect();
        let window = MetricWindow::new(d(2024, 5, 1), d(2024, 5, 31)).unwrap();

        let all = totals(&txs, &window, &RegionFilter::All);
        let parts: Vec<WindowTotals> = regions
            .iter()
            .map(|r| totals(&txs, &window, &RegionFilter::Only(r.to_string())))
            .collect();

        assert_eq!(
            parts.iter().map(|p| p.revenue_cents).sum::<i64>(),
            all.revenue_cents
        );
        assert_eq!(
            parts.iter().map(|p| p.transactions).sum::<i64>(),
            all.transactions
        );
    }

    #[test]
    fn test_empty_window_is_zeroed() {
        let window = MetricWindow::day(d(2024, 1, 1));
        let summary = sales_summary(&[], &window.comparison(), &RegionFilter::All, 0);
        assert_eq!(summary.total_revenue, 0.0);
        assert_eq!(summary.average_order_value, 0.0);
        assert_eq!(summary.period_comparison.revenue_growth, 0.0);
    }
}
