//! Metric primitives shared by every aggregator
//!
//! Currency is carried as integer cents until it crosses the API boundary,
//! so partition sums are exact. The ratio helpers return `0.0` instead of
//! dividing by zero: an empty period is a valid state, not a fault.

/// Sum of amounts in cents
pub fn sum<I>(amounts: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    amounts.into_iter().sum()
}

/// Number of items in a record set
pub fn count<I>(items: I) -> i64
where
    I: IntoIterator,
{
    items.into_iter().count() as i64
}

/// `total / count`, or `0.0` when there is nothing to average
pub fn average(total: f64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// `(current - previous) / previous * 100`, or `0.0` when previous is zero
pub fn percentage_growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// `part / whole * 100`, or `0.0` when whole is zero
pub fn percentage_share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Round to two decimal places (currency and percentage precision)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert cents to a decimal currency amount
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Convert a decimal currency amount to cents, rounding half away from zero
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_and_count() {
        assert_eq!(sum(vec![10_000, 30_000]), 40_000);
        assert_eq!(sum(Vec::<i64>::new()), 0);
        assert_eq!(count(vec!["a", "b", "c"]), 3);
    }

    #[test]
    fn test_average_zero_count() {
        assert_eq!(average(400.0, 2), 200.0);
        assert_eq!(average(400.0, 0), 0.0);
    }

    #[test]
    fn test_growth_zero_previous() {
        assert_eq!(percentage_growth(400.0, 0.0), 0.0);
        assert_eq!(percentage_growth(0.0, 0.0), 0.0);
        assert_eq!(percentage_growth(150.0, 100.0), 50.0);
        assert_eq!(percentage_growth(50.0, 100.0), -50.0);
    }

    #[test]
    fn test_share() {
        assert_eq!(percentage_share(25.0, 100.0), 25.0);
        assert_eq!(percentage_share(25.0, 0.0), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(128.571428), 128.57);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(-3.14159), -3.14);
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(cents_to_amount(12_345), 123.45);
        assert_eq!(amount_to_cents(123.45), 12_345);
        assert_eq!(amount_to_cents(0.1 + 0.2), 30);
    }
}
