//! Segmentation: customer segments, retention, rankings, category rollups
//! and inventory labels

use std::collections::{BTreeMap, HashMap};

use crate::config::{InventoryConfig, SegmentConfig};
use crate::metrics::{cents_to_amount, percentage_share, round2};
use crate::models::{
    CategoryPerformance, Customer, CustomerHistory, CustomerRanking, FlaggedProduct,
    InventoryInsights, InventoryLabel, Product, ProductRanking, SegmentBucket, Transaction,
};

/// Per-customer figures inside the filtered set
#[derive(Debug, Clone, Copy, Default)]
struct CustomerTotals {
    revenue_cents: i64,
    transactions: i64,
}

/// Per-product figures inside the filtered set
#[derive(Debug, Clone, Copy, Default)]
struct ProductTotals {
    revenue_cents: i64,
    units: i64,
    transactions: i64,
    unit_price_cents: i64,
}

fn by_customer(transactions: &[Transaction]) -> BTreeMap<&str, CustomerTotals> {
    let mut totals: BTreeMap<&str, CustomerTotals> = BTreeMap::new();
    for t in transactions {
        let entry = totals.entry(t.customer_id.as_str()).or_default();
        entry.revenue_cents += t.amount_cents;
        entry.transactions += 1;
    }
    totals
}

fn by_product(transactions: &[Transaction]) -> BTreeMap<&str, ProductTotals> {
    let mut totals: BTreeMap<&str, ProductTotals> = BTreeMap::new();
    for t in transactions {
        let entry = totals.entry(t.product_id.as_str()).or_default();
        entry.revenue_cents += t.amount_cents;
        entry.units += t.quantity;
        entry.transactions += 1;
        entry.unit_price_cents += t.unit_price_cents;
    }
    totals
}

/// Segment label for a customer's lifetime figures. The first matching rule
/// wins; the fallback catches everything else.
pub fn classify<'a>(config: &'a SegmentConfig, history: Option<&CustomerHistory>) -> &'a str {
    let (count, revenue) = history
        .map(|h| (h.transaction_count, h.lifetime_revenue_cents))
        .unwrap_or((0, 0));
    config
        .rules
        .iter()
        .find(|rule| rule.matches(count, revenue))
        .map(|rule| rule.label.as_str())
        .unwrap_or(config.fallback.as_str())
}

/// Partition the customers active in `transactions` by lifetime segment.
///
/// Buckets come back in rule order with the fallback last, including empty
/// ones. Counts sum to the active customers and revenues to the total
/// revenue of `transactions`.
pub fn segment_breakdown(
    transactions: &[Transaction],
    history: &[CustomerHistory],
    config: &SegmentConfig,
) -> Vec<SegmentBucket> {
    let lifetime: HashMap<&str, &CustomerHistory> =
        history.iter().map(|h| (h.customer_id.as_str(), h)).collect();

    let labels: Vec<&str> = config
        .rules
        .iter()
        .map(|r| r.label.as_str())
        .chain(std::iter::once(config.fallback.as_str()))
        .collect();
    let mut buckets: Vec<(i64, i64)> = vec![(0, 0); labels.len()];

    for (customer_id, totals) in by_customer(transactions) {
        let label = classify(config, lifetime.get(customer_id).copied());
        // Labels are unique after validation, so position finds the right bucket
        if let Some(idx) = labels.iter().position(|l| *l == label) {
            buckets[idx].0 += 1;
            buckets[idx].1 += totals.revenue_cents;
        }
    }

    labels
        .into_iter()
        .zip(buckets)
        .map(|(label, (count, revenue_cents))| SegmentBucket {
            label: label.to_string(),
            count,
            revenue: round2(cents_to_amount(revenue_cents)),
        })
        .collect()
}

/// Active customer counts for retention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retention {
    pub total_customers: i64,
    pub returning_customers: i64,
    pub rate: f64,
}

/// A customer is returning with at least two transactions across their full
/// history. The denominator is the customers active in `transactions`.
pub fn retention(transactions: &[Transaction], history: &[CustomerHistory]) -> Retention {
    let lifetime: HashMap<&str, i64> = history
        .iter()
        .map(|h| (h.customer_id.as_str(), h.transaction_count))
        .collect();
    let active = by_customer(transactions);

    let total_customers = active.len() as i64;
    let returning_customers = active
        .keys()
        .filter(|id| lifetime.get(*id).copied().unwrap_or(0) >= 2)
        .count() as i64;

    Retention {
        total_customers,
        returning_customers,
        rate: round2(percentage_share(
            returning_customers as f64,
            total_customers as f64,
        )),
    }
}

/// Highest-revenue customers, ties broken by id ascending
pub fn top_customers(
    transactions: &[Transaction],
    customers: &[Customer],
    n: usize,
) -> Vec<CustomerRanking> {
    let names: HashMap<&str, &str> = customers
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    // BTreeMap iterates in id order; the stable sort keeps that for ties
    let mut ranked: Vec<(&str, CustomerTotals)> = by_customer(transactions).into_iter().collect();
    ranked.sort_by(|a, b| b.1.revenue_cents.cmp(&a.1.revenue_cents));

    ranked
        .into_iter()
        .take(n)
        .map(|(id, totals)| CustomerRanking {
            customer_id: id.to_string(),
            name: names.get(id).map(|n| n.to_string()).unwrap_or_default(),
            revenue: round2(cents_to_amount(totals.revenue_cents)),
            transactions: totals.transactions,
        })
        .collect()
}

/// Highest-revenue products, ties broken by id ascending.
/// `avg_price` is the mean unit price over the product's transactions.
pub fn top_products(
    transactions: &[Transaction],
    products: &[Product],
    n: usize,
) -> Vec<ProductRanking> {
    let catalog: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut ranked: Vec<(&str, ProductTotals)> = by_product(transactions).into_iter().collect();
    ranked.sort_by(|a, b| b.1.revenue_cents.cmp(&a.1.revenue_cents));

    ranked
        .into_iter()
        .take(n)
        .map(|(id, totals)| {
            let product = catalog.get(id);
            ProductRanking {
                product_id: id.to_string(),
                name: product.map(|p| p.name.clone()).unwrap_or_default(),
                category: product.map(|p| p.category.clone()).unwrap_or_default(),
                revenue: round2(cents_to_amount(totals.revenue_cents)),
                units_sold: totals.units,
                avg_price: round2(
                    cents_to_amount(totals.unit_price_cents) / totals.transactions.max(1) as f64,
                ),
            }
        })
        .collect()
}

/// Revenue, units and transactions per category, by revenue descending then
/// category name
pub fn category_performance(transactions: &[Transaction]) -> Vec<CategoryPerformance> {
    let mut rollup: BTreeMap<&str, ProductTotals> = BTreeMap::new();
    let mut total_cents = 0i64;
    for t in transactions {
        let entry = rollup.entry(t.category.as_str()).or_default();
        entry.revenue_cents += t.amount_cents;
        entry.units += t.quantity;
        entry.transactions += 1;
        total_cents += t.amount_cents;
    }

    let mut rows: Vec<(&str, ProductTotals)> = rollup.into_iter().collect();
    rows.sort_by(|a, b| b.1.revenue_cents.cmp(&a.1.revenue_cents));

    rows.into_iter()
        .map(|(category, totals)| CategoryPerformance {
            category: category.to_string(),
            revenue: round2(cents_to_amount(totals.revenue_cents)),
            units_sold: totals.units,
            transactions: totals.transactions,
            revenue_share: round2(percentage_share(
                totals.revenue_cents as f64,
                total_cents as f64,
            )),
        })
        .collect()
}

/// Label every product by stock level and recent sales velocity.
///
/// `recent` holds the transactions of the velocity window. Labels are
/// evaluated independently, so a product can carry several; products with
/// no label are left out of `products`.
pub fn inventory_insights(
    products: &[Product],
    recent: &[Transaction],
    config: &InventoryConfig,
) -> InventoryInsights {
    let mut units: HashMap<&str, i64> = HashMap::new();
    for t in recent {
        *units.entry(t.product_id.as_str()).or_default() += t.quantity;
    }

    let mut insights = InventoryInsights::default();
    for product in products {
        let sold = units.get(product.id.as_str()).copied().unwrap_or(0);
        let mut labels = Vec::new();

        if product.stock_level < config.low_stock_threshold {
            labels.push(InventoryLabel::LowStock);
            insights.low_stock += 1;
        }
        if sold > config.fast_moving_threshold {
            labels.push(InventoryLabel::FastMoving);
            insights.fast_moving += 1;
        }
        if sold < config.slow_moving_threshold {
            labels.push(InventoryLabel::SlowMoving);
            insights.slow_moving += 1;
        }

        if !labels.is_empty() {
            insights.products.push(FlaggedProduct {
                product_id: product.id.clone(),
                name: product.name.clone(),
                stock_level: product.stock_level,
                recent_units_sold: sold,
                labels,
            });
        }
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentRule;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn tx(id: &str, customer: &str, product: &str, category: &str, qty: i64, cents: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            customer_id: customer.to_string(),
            product_id: product.to_string(),
            quantity: qty,
            unit_price_cents: cents / qty.max(1),
            amount_cents: cents,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            region: "Europe".to_string(),
            category: category.to_string(),
            channel: "Online".to_string(),
        }
    }

    fn history(id: &str, count: i64, cents: i64) -> CustomerHistory {
        CustomerHistory {
            customer_id: id.to_string(),
            transaction_count: count,
            lifetime_revenue_cents: cents,
            first_seen: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        }
    }

    fn segment_config() -> SegmentConfig {
        SegmentConfig {
            rules: vec![
                SegmentRule {
                    label: "VIP".into(),
                    min_transactions: Some(3),
                    min_revenue: Some(400.0),
                },
                SegmentRule {
                    label: "Returning".into(),
                    min_transactions: Some(2),
                    min_revenue: None,
                },
            ],
            fallback: "New".into(),
        }
    }

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: "Software".to_string(),
            unit_price_cents: 1_000,
            stock_level: stock,
        }
    }

    #[test]
    fn test_retention_one_of_two() {
        let txs = vec![
            tx("T1", "1", "P1", "Software", 1, 5_000),
            tx("T2", "2", "P1", "Software", 1, 20_000),
        ];
        let hist = vec![history("1", 1, 5_000), history("2", 3, 50_000)];
        let r = retention(&txs, &hist);
        assert_eq!(r.total_customers, 2);
        assert_eq!(r.returning_customers, 1);
        assert_eq!(r.rate, 50.0);
    }

    #[test]
    fn test_retention_empty() {
        let r = retention(&[], &[]);
        assert_eq!(r.total_customers, 0);
        assert_eq!(r.rate, 0.0);
    }

    #[test]
    fn test_classify_first_match_wins() {
        let config = segment_config();
        assert_eq!(classify(&config, Some(&history("a", 5, 100_000))), "VIP");
        assert_eq!(classify(&config, Some(&history("b", 5, 100))), "Returning");
        assert_eq!(classify(&config, Some(&history("c", 1, 100_000))), "New");
        assert_eq!(classify(&config, None), "New");
    }

    #[test]
    fn test_segment_breakdown_partitions_exactly() {
        let config = segment_config();
        let txs = vec![
            tx("T1", "a", "P1", "Software", 1, 10_000),
            tx("T2", "a", "P1", "Software", 1, 2_500),
            tx("T3", "b", "P2", "Storage", 1, 700),
            tx("T4", "c", "P2", "Storage", 1, 333),
            tx("T5", "d", "P1", "Software", 1, 1_000),
        ];
        let hist = vec![
            history("a", 4, 90_000),
            history("b", 2, 700),
            history("c", 1, 333),
            history("d", 1, 1_000),
        ];
        let buckets = segment_breakdown(&txs, &hist, &config);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["VIP", "Returning", "New"]);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<i64>(), 4);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[0].revenue, 125.0);
        assert_eq!(buckets[2].count, 2);

        let total: f64 = buckets.iter().map(|b| b.revenue).sum();
        assert!((total - 145.33).abs() < 1e-9);
    }

    #[test]
    fn test_empty_segments_still_listed() {
        let buckets = segment_breakdown(&[], &[], &segment_config());
        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.count == 0 && b.revenue == 0.0));
    }

    #[test]
    fn test_top_customers_ties_by_id() {
        let txs = vec![
            tx("T1", "C3", "P1", "Software", 1, 1_000),
            tx("T2", "C1", "P1", "Software", 1, 1_000),
            tx("T3", "C2", "P1", "Software", 1, 5_000),
        ];
        let customers = vec![Customer {
            id: "C2".into(),
            name: "Bigco".into(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        }];

        let top = top_customers(&txs, &customers, 10);
        let ids: Vec<&str> = top.iter().map(|c| c.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["C2", "C1", "C3"]);
        assert_eq!(top[0].name, "Bigco");
        assert_eq!(top_customers(&txs, &customers, 10), top);

        assert_eq!(top_customers(&txs, &customers, 2).len(), 2);
        assert!(top_customers(&txs, &customers, 0).is_empty());
    }

    #[test]
    fn test_top_products_with_avg_price() {
        let txs = vec![
            tx("T1", "C1", "P2", "Storage", 2, 2_000),
            tx("T2", "C1", "P2", "Storage", 1, 3_000),
            tx("T3", "C1", "P1", "Software", 5, 5_000),
        ];
        let products = vec![product("P1", 10), product("P2", 10)];
        let top = top_products(&txs, &products, 5);

        assert_eq!(top[0].product_id, "P1");
        assert_eq!(top[1].product_id, "P2");
        assert_eq!(top[0].revenue, 50.0);
        assert_eq!(top[1].units_sold, 3);
        // (10.00 + 30.00) / 2
        assert_eq!(top[1].avg_price, 20.0);
        assert_eq!(top[1].name, "Product P2");
    }

    #[test]
    fn test_category_performance_order_and_share() {
        let txs = vec![
            tx("T1", "C1", "P1", "Software", 1, 3_000),
            tx("T2", "C1", "P2", "Analytics", 1, 3_000),
            tx("T3", "C1", "P3", "Storage", 2, 4_000),
        ];
        let rows = category_performance(&txs);
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Storage", "Analytics", "Software"]);
        assert_eq!(rows[0].revenue_share, 40.0);
        assert_eq!(rows[0].units_sold, 2);
        assert_eq!(
            rows.iter().map(|r| r.transactions).sum::<i64>(),
            txs.len() as i64
        );
    }

    #[test]
    fn test_inventory_multi_label() {
        let config = InventoryConfig {
            low_stock_threshold: 10,
            fast_moving_threshold: 20,
            slow_moving_threshold: 5,
            velocity_window_days: 30,
        };
        let products = vec![product("P1", 3), product("P2", 100), product("P3", 100)];
        let recent = vec![
            tx("T1", "C1", "P1", "Software", 25, 2_500),
            tx("T2", "C1", "P3", "Software", 10, 1_000),
        ];
        let insights = inventory_insights(&products, &recent, &config);

        assert_eq!(insights.low_stock, 1);
        assert_eq!(insights.fast_moving, 1);
        assert_eq!(insights.slow_moving, 1);
        assert_eq!(insights.products.len(), 2);
        assert_eq!(
            insights.products[0].labels,
            vec![InventoryLabel::LowStock, InventoryLabel::FastMoving]
        );
        assert_eq!(insights.products[1].product_id, "P2");
        assert_eq!(insights.products[1].labels, vec![InventoryLabel::SlowMoving]);
    }
}
