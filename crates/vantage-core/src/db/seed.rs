//! Deterministic sample data generator
//!
//! Produces roughly two years of sales with a Q4 peak, a summer dip and
//! quieter weekends. The same seed and `today` always produce the same rows.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::metrics::amount_to_cents;
use crate::models::{Customer, Product, Transaction, VisitCount};

pub const DEFAULT_SEED: u64 = 42;

/// (id, name, category, price range in currency units)
const CATALOG: &[(&str, &str, &str, (f64, f64))] = &[
    ("PROD001", "CloudSync Pro", "Software", (99.0, 299.0)),
    ("PROD002", "DataVault Enterprise", "Software", (199.0, 799.0)),
    ("PROD003", "SmartAnalytics Suite", "Analytics", (149.0, 499.0)),
    ("PROD004", "SecureShield Advanced", "Security", (79.0, 249.0)),
    ("PROD005", "WorkFlow Optimizer", "Productivity", (59.0, 199.0)),
    ("PROD006", "Mobile Connect API", "Integration", (29.0, 99.0)),
    ("PROD007", "AI Assistant Premium", "AI/ML", (199.0, 599.0)),
    ("PROD008", "Cloud Storage Plus", "Storage", (19.0, 89.0)),
];

const CHANNELS: &[&str] = &["Online", "Retail", "Direct Sales", "Partner"];

const NAME_STEMS: &[&str] = &[
    "Acme", "Northwind", "Bluefin", "Granite", "Helix", "Juniper", "Keystone", "Lumen", "Meridian",
    "Nimbus", "Orchid", "Pinnacle", "Quarry", "Redwood", "Summit", "Tidal", "Vertex", "Willow",
    "Zephyr", "Beacon",
];

const NAME_SUFFIXES: &[&str] = &[
    "Labs", "Group", "Systems", "Holdings", "Partners", "Works", "Logistics", "Retail", "Health",
    "Studios",
];

/// Buying tier, only used to shape generated prices
#[derive(Clone, Copy)]
enum Tier {
    Enterprise,
    Smb,
    Individual,
}

struct SeedCustomer {
    customer: Customer,
    region: String,
    tier: Tier,
}

/// Sample data generation parameters
#[derive(Debug, Clone)]
pub struct SampleDataOptions {
    pub seed: u64,
    /// Last day of generated history
    pub today: NaiveDate,
    pub days: i64,
    pub customers: usize,
    pub regions: Vec<String>,
}

impl SampleDataOptions {
    pub fn new(today: NaiveDate, regions: Vec<String>) -> Self {
        Self {
            seed: DEFAULT_SEED,
            today,
            days: 730,
            customers: 500,
            regions,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a sample data request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    /// False when records already existed and nothing was written
    pub created: bool,
    pub transactions: i64,
}

impl SeedResult {
    pub fn message(&self) -> String {
        if self.created {
            format!("Generated {} sales records successfully", self.transactions)
        } else {
            format!("Sample data already exists ({} records)", self.transactions)
        }
    }
}

impl Database {
    /// Populate an empty store with sample data. A store that already has
    /// transactions is left untouched.
    pub fn generate_sample_data(&self, options: &SampleDataOptions) -> Result<SeedResult> {
        let existing = self.counts()?.transactions;
        if existing > 0 {
            info!(existing, "Sample data already present, skipping");
            return Ok(SeedResult {
                created: false,
                transactions: existing,
            });
        }

        if options.regions.is_empty() {
            return Err(Error::InvalidData("sample data needs at least one region".into()));
        }
        if options.customers == 0 || options.days < 1 {
            return Err(Error::InvalidData(
                "sample data needs at least one customer and one day".into(),
            ));
        }

        let mut rng = Pcg64Mcg::seed_from_u64(options.seed);
        let start = options.today - Duration::days(options.days - 1);

        let products = build_products(&mut rng);
        let customers = build_customers(&mut rng, options, start);
        let (transactions, visits) =
            build_sales(&mut rng, options, start, &products, &customers);

        let plain_customers: Vec<Customer> =
            customers.into_iter().map(|c| c.customer).collect();
        self.insert_records(&plain_customers, &products, &transactions, &visits)?;

        info!(
            customers = plain_customers.len(),
            products = products.len(),
            transactions = transactions.len(),
            "Sample data generated"
        );

        Ok(SeedResult {
            created: true,
            transactions: transactions.len() as i64,
        })
    }
}

fn build_products(rng: &mut Pcg64Mcg) -> Vec<Product> {
    CATALOG
        .iter()
        .map(|(id, name, category, (low, high))| Product {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            unit_price_cents: amount_to_cents((low + high) / 2.0),
            stock_level: rng.gen_range(0..=500),
        })
        .collect()
}

fn build_customers(
    rng: &mut Pcg64Mcg,
    options: &SampleDataOptions,
    start: NaiveDate,
) -> Vec<SeedCustomer> {
    (0..options.customers)
        .map(|i| {
            let stem = NAME_STEMS[rng.gen_range(0..NAME_STEMS.len())];
            let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
            let created = start + Duration::days(rng.gen_range(0..options.days));
            let tier = match rng.gen_range(0..3) {
                0 => Tier::Enterprise,
                1 => Tier::Smb,
                _ => Tier::Individual,
            };
            SeedCustomer {
                customer: Customer {
                    id: format!("CUST{:04}", i + 1),
                    name: format!("{} {}", stem, suffix),
                    created_at: Utc.from_utc_datetime(&created.and_time(NaiveTime::MIN)),
                },
                region: options.regions[rng.gen_range(0..options.regions.len())].clone(),
                tier,
            }
        })
        .collect()
}

/// Base daily transaction count: Q4 peak, summer dip, weekend dampening
fn daily_transaction_count(rng: &mut Pcg64Mcg, date: NaiveDate) -> usize {
    let base: usize = match date.month() {
        11 | 12 => rng.gen_range(15..=35),
        6..=8 => rng.gen_range(5..=15),
        _ => rng.gen_range(8..=20),
    };
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        (base as f64 * 0.6) as usize
    } else {
        base
    }
}

fn build_sales(
    rng: &mut Pcg64Mcg,
    options: &SampleDataOptions,
    start: NaiveDate,
    products: &[Product],
    customers: &[SeedCustomer],
) -> (Vec<Transaction>, Vec<VisitCount>) {
    let mut transactions = Vec::new();
    let mut visits = Vec::new();

    for offset in 0..options.days {
        let date = start + Duration::days(offset);
        let mut per_region = vec![0i64; options.regions.len()];

        for _ in 0..daily_transaction_count(rng, date) {
            let buyer = &customers[rng.gen_range(0..customers.len())];
            let (product_idx, product) = {
                let idx = rng.gen_range(0..products.len());
                (idx, &products[idx])
            };
            let (low, high) = CATALOG[product_idx].3;

            let mut unit_price = rng.gen_range(low..high);
            unit_price *= match buyer.tier {
                Tier::Enterprise => rng.gen_range(1.2..1.8),
                Tier::Individual => rng.gen_range(0.7..0.9),
                Tier::Smb => 1.0,
            };
            let unit_price_cents = amount_to_cents(unit_price);
            let quantity: i64 = rng.gen_range(1..=10);
            let seconds = rng.gen_range(0..86_400);
            let timestamp =
                Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::seconds(seconds);

            if let Some(pos) = options.regions.iter().position(|r| *r == buyer.region) {
                per_region[pos] += 1;
            }

            transactions.push(Transaction {
                id: format!("TXN{:06}", transactions.len() + 1),
                customer_id: buyer.customer.id.clone(),
                product_id: product.id.clone(),
                quantity,
                unit_price_cents,
                amount_cents: quantity * unit_price_cents,
                timestamp,
                region: buyer.region.clone(),
                category: product.category.clone(),
                channel: CHANNELS[rng.gen_range(0..CHANNELS.len())].to_string(),
            });
        }

        for (region, sold) in options.regions.iter().zip(per_region) {
            // Roughly 2.5-8% conversion, plus background traffic
            let per_sale = rng.gen_range(12..=40);
            visits.push(VisitCount {
                date,
                region: region.clone(),
                visits: sold * per_sale + rng.gen_range(20..=80),
            });
        }
    }

    (transactions, visits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;
    use crate::window::RecordQuery;

    fn options(days: i64) -> SampleDataOptions {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut opts = SampleDataOptions::new(today, vec!["Europe".into(), "North America".into()]);
        opts.days = days;
        opts.customers = 25;
        opts
    }

    #[test]
    fn test_generate_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let first = db.generate_sample_data(&options(30)).unwrap();
        assert!(first.created);
        assert!(first.transactions > 0);

        let second = db.generate_sample_data(&options(30)).unwrap();
        assert!(!second.created);
        assert_eq!(second.transactions, first.transactions);
        assert_eq!(db.counts().unwrap().transactions, first.transactions);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = Database::in_memory().unwrap();
        let b = Database::in_memory().unwrap();
        a.generate_sample_data(&options(20)).unwrap();
        b.generate_sample_data(&options(20)).unwrap();

        assert_eq!(
            a.transactions(&RecordQuery::all()).unwrap(),
            b.transactions(&RecordQuery::all()).unwrap()
        );
        assert_eq!(a.products().unwrap(), b.products().unwrap());
    }

    #[test]
    fn test_generated_records_are_consistent() {
        let db = Database::in_memory().unwrap();
        let opts = options(60);
        db.generate_sample_data(&opts).unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts.products, 8);
        assert_eq!(counts.customers, 25);
        assert_eq!(counts.visit_days, 60 * 2);

        let start = opts.today - Duration::days(59);
        for tx in db.transactions(&RecordQuery::all()).unwrap() {
            assert_eq!(tx.amount_cents, tx.quantity * tx.unit_price_cents);
            assert!((1..=10).contains(&tx.quantity));
            assert!(tx.date() >= start && tx.date() <= opts.today);
            assert!(opts.regions.contains(&tx.region));
            assert!(CHANNELS.contains(&tx.channel.as_str()));
        }

        let visits = db.visit_count(&RecordQuery::all()).unwrap();
        assert!(visits > counts.transactions);
    }

    #[test]
    fn test_q4_busier_than_summer() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let december: usize = (1..=28)
            .map(|d| daily_transaction_count(&mut rng, NaiveDate::from_ymd_opt(2024, 12, d).unwrap()))
            .sum();
        let july: usize = (1..=28)
            .map(|d| daily_transaction_count(&mut rng, NaiveDate::from_ymd_opt(2024, 7, d).unwrap()))
            .sum();
        assert!(december > july, "{} vs {}", december, july);
    }

    #[test]
    fn test_rejects_empty_regions() {
        let db = Database::in_memory().unwrap();
        let mut opts = options(5);
        opts.regions.clear();
        assert!(matches!(
            db.generate_sample_data(&opts),
            Err(Error::InvalidData(_))
        ));
    }
}
