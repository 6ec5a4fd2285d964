//! Record store abstraction
//!
//! The analytics engine reads records only through this trait. `Database`
//! is the shipped implementation; tests and embedders can supply their own.

use crate::error::Result;
use crate::models::{Customer, CustomerHistory, Product, Transaction};
use crate::window::RecordQuery;

/// Read access to sales records
///
/// Implementations must return complete result sets: aggregation starts only
/// after every query has returned.
pub trait RecordStore: Send + Sync {
    /// Transactions inside the query window (all time if `None`) and region,
    /// ordered by timestamp then id
    fn transactions(&self, query: &RecordQuery) -> Result<Vec<Transaction>>;

    /// All customers, ordered by id
    fn customers(&self) -> Result<Vec<Customer>>;

    /// All products, ordered by id
    fn products(&self) -> Result<Vec<Product>>;

    /// Lifetime statistics per customer over the full history, ignoring any
    /// window or region. Customers with no transactions are omitted.
    fn customer_history(&self) -> Result<Vec<CustomerHistory>>;

    /// Visit (opportunity) count for the same window and region, used as the
    /// conversion rate denominator
    fn visit_count(&self, query: &RecordQuery) -> Result<i64>;
}
