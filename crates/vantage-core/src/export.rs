//! Sales report export
//!
//! Builds one row per transaction in a window, joined with its customer,
//! segment and product, and serializes the table to CSV or JSON.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::segments::classify;
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::metrics::{cents_to_amount, round2};
use crate::store::RecordStore;
use crate::window::{MetricWindow, RecordQuery, RegionFilter};

/// Column headers, in output order
pub const SALES_REPORT_HEADERS: [&str; 11] = [
    "Transaction ID",
    "Date",
    "Customer Name",
    "Customer Segment",
    "Product Name",
    "Category",
    "Quantity",
    "Unit Price",
    "Total Amount",
    "Region",
    "Channel",
];

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One exported transaction. Field order matches [`SALES_REPORT_HEADERS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReportRow {
    #[serde(rename = "Transaction ID")]
    pub transaction_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Customer Segment")]
    pub customer_segment: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "Unit Price")]
    pub unit_price: f64,
    #[serde(rename = "Total Amount")]
    pub total_amount: f64,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Channel")]
    pub channel: String,
}

/// A finished report, ready to serialize
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub window: MetricWindow,
    pub region: String,
    pub rows: Vec<SalesReportRow>,
}

impl ReportTable {
    pub fn headers(&self) -> &'static [&'static str] {
        &SALES_REPORT_HEADERS
    }

    /// Serialize the table. An empty table still carries its header row.
    pub fn render(&self, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => self.to_json(),
        }
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(SALES_REPORT_HEADERS)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.rows)?)
    }

    /// Attachment file name, e.g. `sales_report_2024-01-01_2024-01-31.csv`
    pub fn filename(&self, format: ExportFormat) -> String {
        format!(
            "sales_report_{}_{}.{}",
            self.window.start(),
            self.window.end(),
            format.extension()
        )
    }
}

/// Build the sales report for a window and region
pub fn build_sales_report(
    store: &dyn RecordStore,
    window: MetricWindow,
    region: &RegionFilter,
    config: &AnalyticsConfig,
) -> Result<ReportTable> {
    let transactions = store.transactions(&RecordQuery::new(window, region.clone()))?;
    let customers: HashMap<_, _> = store
        .customers()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let products: HashMap<_, _> = store
        .products()?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let history: HashMap<_, _> = store
        .customer_history()?
        .into_iter()
        .map(|h| (h.customer_id.clone(), h))
        .collect();

    let rows = transactions
        .into_iter()
        .map(|tx| SalesReportRow {
            date: tx.date(),
            unit_price: round2(cents_to_amount(tx.unit_price_cents)),
            total_amount: round2(tx.amount()),
            customer_name: customers
                .get(&tx.customer_id)
                .cloned()
                .unwrap_or_default(),
            customer_segment: classify(&config.segments, history.get(&tx.customer_id))
                .to_string(),
            product_name: products.get(&tx.product_id).cloned().unwrap_or_default(),
            transaction_id: tx.id,
            category: tx.category,
            quantity: tx.quantity,
            region: tx.region,
            channel: tx.channel,
        })
        .collect::<Vec<_>>();

    tracing::debug!(rows = rows.len(), window = %window, "Built sales report");

    Ok(ReportTable {
        window,
        region: region.label().to_string(),
        rows,
    })
}
