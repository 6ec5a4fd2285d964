//! Record inserts and `RecordStore` queries

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, ToSql};
use serde::Serialize;

use super::{format_timestamp, parse_timestamp, Database};
use crate::error::Result;
use crate::models::{Customer, CustomerHistory, Product, Transaction, VisitCount};
use crate::store::RecordStore;
use crate::window::{RecordQuery, RegionFilter};

/// Row counts per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub customers: i64,
    pub products: i64,
    pub transactions: i64,
    pub visit_days: i64,
}

impl Database {
    pub fn insert_customer(&self, customer: &Customer) -> Result<()> {
        let conn = self.conn()?;
        insert_customer(&conn, customer)
    }

    pub fn insert_product(&self, product: &Product) -> Result<()> {
        let conn = self.conn()?;
        insert_product(&conn, product)
    }

    pub fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        insert_transaction(&conn, tx)
    }

    pub fn insert_visits(&self, visits: &VisitCount) -> Result<()> {
        let conn = self.conn()?;
        insert_visits(&conn, visits)
    }

    /// Insert a full record set in one SQLite transaction
    pub fn insert_records(
        &self,
        customers: &[Customer],
        products: &[Product],
        transactions: &[Transaction],
        visits: &[VisitCount],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for c in customers {
            insert_customer(&tx, c)?;
        }
        for p in products {
            insert_product(&tx, p)?;
        }
        for t in transactions {
            insert_transaction(&tx, t)?;
        }
        for v in visits {
            insert_visits(&tx, v)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };
        Ok(StoreCounts {
            customers: count("customers")?,
            products: count("products")?,
            transactions: count("transactions")?,
            visit_days: count("visits")?,
        })
    }

    /// Distinct regions present in the transaction table
    pub fn regions_in_use(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT region FROM transactions ORDER BY region")?;
        let regions = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(regions)
    }
}

impl RecordStore for Database {
    fn transactions(&self, query: &RecordQuery) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let (where_clause, params) = build_filter(query);
        let sql = format!(
            r#"
            SELECT id, customer_id, product_id, quantity, unit_price_cents, amount_cents,
                   timestamp, region, category, channel
            FROM transactions
            {}
            ORDER BY timestamp, id
            "#,
            where_clause
        );
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(refs.as_slice(), row_to_transaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn customers(&self) -> Result<Vec<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM customers ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at: String = row.get(2)?;
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_timestamp(2, &created_at)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn products(&self) -> Result<Vec<Product>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category, unit_price_cents, stock_level FROM products ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Product {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    unit_price_cents: row.get(3)?,
                    stock_level: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn customer_history(&self) -> Result<Vec<CustomerHistory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT customer_id, COUNT(*), COALESCE(SUM(amount_cents), 0), MIN(date)
            FROM transactions
            GROUP BY customer_id
            ORDER BY customer_id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let first_seen: String = row.get(3)?;
                Ok(CustomerHistory {
                    customer_id: row.get(0)?,
                    transaction_count: row.get(1)?,
                    lifetime_revenue_cents: row.get(2)?,
                    first_seen: parse_date_column(3, &first_seen)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn visit_count(&self, query: &RecordQuery) -> Result<i64> {
        let conn = self.conn()?;
        let (where_clause, params) = build_filter(query);
        let sql = format!("SELECT COALESCE(SUM(visits), 0) FROM visits {}", where_clause);
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let visits: i64 = conn.query_row(&sql, refs.as_slice(), |row| row.get(0))?;
        Ok(visits)
    }
}

/// WHERE clause over the `date` and `region` columns shared by
/// `transactions` and `visits`
fn build_filter(query: &RecordQuery) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(window) = query.window {
        conditions.push(format!(
            "date BETWEEN ?{} AND ?{}",
            params.len() + 1,
            params.len() + 2
        ));
        params.push(Box::new(window.start().to_string()));
        params.push(Box::new(window.end().to_string()));
    }

    if let RegionFilter::Only(region) = &query.region {
        conditions.push(format!("region = ?{}", params.len() + 1));
        params.push(Box::new(region.clone()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, params)
}

fn parse_date_column(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let timestamp: String = row.get(6)?;
    Ok(Transaction {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price_cents: row.get(4)?,
        amount_cents: row.get(5)?,
        timestamp: parse_timestamp(6, &timestamp)?,
        region: row.get(7)?,
        category: row.get(8)?,
        channel: row.get(9)?,
    })
}

fn insert_customer(conn: &Connection, customer: &Customer) -> Result<()> {
    conn.execute(
        "INSERT INTO customers (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![
            customer.id,
            customer.name,
            format_timestamp(&customer.created_at)
        ],
    )?;
    Ok(())
}

fn insert_product(conn: &Connection, product: &Product) -> Result<()> {
    conn.execute(
        "INSERT INTO products (id, name, category, unit_price_cents, stock_level) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            product.id,
            product.name,
            product.category,
            product.unit_price_cents,
            product.stock_level
        ],
    )?;
    Ok(())
}

fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO transactions
            (id, customer_id, product_id, quantity, unit_price_cents, amount_cents,
             timestamp, date, region, category, channel)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            tx.id,
            tx.customer_id,
            tx.product_id,
            tx.quantity,
            tx.unit_price_cents,
            tx.amount_cents,
            format_timestamp(&tx.timestamp),
            tx.date().to_string(),
            tx.region,
            tx.category,
            tx.channel
        ],
    )?;
    Ok(())
}

fn insert_visits(conn: &Connection, visits: &VisitCount) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO visits (date, region, visits) VALUES (?1, ?2, ?3)
        ON CONFLICT(date, region) DO UPDATE SET visits = excluded.visits
        "#,
        params![visits.date.to_string(), visits.region, visits.visits],
    )?;
    Ok(())
}
