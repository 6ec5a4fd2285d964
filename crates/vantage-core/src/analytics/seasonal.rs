//! Seasonal decomposition: calendar-month trends, quarterly buckets and
//! peak detection

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{Error, Result};
use crate::metrics::{cents_to_amount, percentage_growth, round2};
use crate::models::{PeakPeriod, TrendPoint, Transaction};
use crate::window::{month_start, MetricWindow};

/// First day of each of the `n_months` calendar months ending with the
/// month containing `as_of`, oldest first
fn month_starts(as_of: NaiveDate, n_months: u32) -> Result<Vec<NaiveDate>> {
    let last = month_start(as_of);
    (0..n_months)
        .rev()
        .map(|back| {
            last.checked_sub_months(Months::new(back))
                .ok_or_else(|| Error::InvalidData(format!("date out of range: {}", as_of)))
        })
        .collect()
}

/// The window a monthly series covers: start of the oldest month through `as_of`
pub fn trend_window(as_of: NaiveDate, n_months: u32) -> Result<MetricWindow> {
    let starts = month_starts(as_of, n_months.max(1))?;
    let start = starts.first().copied().unwrap_or_else(|| month_start(as_of));
    MetricWindow::new(start, as_of)
}

/// First day of the calendar quarter containing `date`
fn quarter_start(date: NaiveDate) -> Result<NaiveDate> {
    month_start(date)
        .checked_sub_months(Months::new(date.month0() % 3))
        .ok_or_else(|| Error::InvalidData(format!("date out of range: {}", date)))
}

/// The window the quarterly buckets cover: the trend window widened back to
/// the start of its first quarter, so no quarter is cut short at the old end
pub fn quarter_window(as_of: NaiveDate, n_months: u32) -> Result<MetricWindow> {
    let trend = trend_window(as_of, n_months)?;
    MetricWindow::new(quarter_start(trend.start())?, as_of)
}

/// Revenue and transactions per calendar month, zero-filled. Labels are
/// `YYYY-MM`. Transactions outside the series are ignored.
pub fn monthly_trends(
    transactions: &[Transaction],
    as_of: NaiveDate,
    n_months: u32,
) -> Result<Vec<TrendPoint>> {
    let starts = month_starts(as_of, n_months)?;
    let mut buckets = vec![(0i64, 0i64); starts.len()];

    for t in transactions {
        let date = t.date();
        if date > as_of {
            continue;
        }
        let key = (date.year(), date.month());
        if let Some(idx) = starts.iter().position(|s| (s.year(), s.month()) == key) {
            buckets[idx].0 += t.amount_cents;
            buckets[idx].1 += 1;
        }
    }

    Ok(starts
        .iter()
        .zip(buckets)
        .map(|(start, (cents, count))| TrendPoint {
            label: start.format("%Y-%m").to_string(),
            revenue: round2(cents_to_amount(cents)),
            transactions: count,
        })
        .collect())
}

/// Revenue and transactions per calendar quarter touched by `window`,
/// zero-filled and chronological. Labels are `YYYY-Qn`. Transactions
/// outside the window are ignored.
pub fn seasonal_patterns(
    transactions: &[Transaction],
    window: &MetricWindow,
) -> Result<Vec<TrendPoint>> {
    let mut starts = Vec::new();
    let mut next = quarter_start(window.start())?;
    while next <= window.end() {
        starts.push(next);
        next = next
            .checked_add_months(Months::new(3))
            .ok_or_else(|| Error::InvalidData(format!("date out of range: {}", next)))?;
    }

    let key = |date: NaiveDate| (date.year(), date.month0() / 3);
    let mut buckets = vec![(0i64, 0i64); starts.len()];
    for t in transactions {
        let date = t.date();
        if !window.contains(date) {
            continue;
        }
        if let Some(idx) = starts.iter().position(|s| key(*s) == key(date)) {
            buckets[idx].0 += t.amount_cents;
            buckets[idx].1 += 1;
        }
    }

    Ok(starts
        .iter()
        .zip(buckets)
        .map(|(start, (cents, count))| TrendPoint {
            label: format!("{}-Q{}", start.year(), start.month0() / 3 + 1),
            revenue: round2(cents_to_amount(cents)),
            transactions: count,
        })
        .collect())
}

/// Mean monthly revenue of a series, `0.0` when empty
pub fn mean_revenue(monthly: &[TrendPoint]) -> f64 {
    if monthly.is_empty() {
        0.0
    } else {
        monthly.iter().map(|p| p.revenue).sum::<f64>() / monthly.len() as f64
    }
}

/// Months whose revenue exceeds `mean * (1 + threshold_pct / 100)`.
///
/// Needs at least two months and a positive mean, otherwise nothing is a peak.
pub fn peak_periods(monthly: &[TrendPoint], threshold_pct: f64) -> Vec<PeakPeriod> {
    if monthly.len() < 2 {
        return Vec::new();
    }
    let mean = mean_revenue(monthly);
    if mean <= 0.0 {
        return Vec::new();
    }
    let cutoff = mean * (1.0 + threshold_pct / 100.0);

    monthly
        .iter()
        .filter(|p| p.revenue > cutoff && p.revenue > mean)
        .map(|p| PeakPeriod {
            label: p.label.clone(),
            revenue: p.revenue,
            above_average: round2(percentage_growth(p.revenue, mean)),
        })
        .collect()
}
