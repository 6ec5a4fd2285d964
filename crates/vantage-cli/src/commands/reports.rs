//! Report command implementations

use anyhow::Result;
use vantage_core::db::Database;
use vantage_core::models::ReportPeriod;
use vantage_core::{window, Analytics, AnalyticsConfig};

use super::{resolve_window, today, truncate};
use crate::cli::WindowArgs;

const RULE: &str = "   ─────────────────────────────────────────────────────────────";

fn print_header(title: &str, period: &ReportPeriod, region: &str) {
    println!();
    println!("{}", title);
    println!(
        "   Period: {} to {}  │  Region: {}",
        period.start_date, period.end_date, region
    );
    println!("{}", RULE);
}

/// Format a growth percentage with an explicit sign
fn signed_pct(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.1}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

pub fn cmd_report_sales(db: &Database, config: &AnalyticsConfig, args: &WindowArgs) -> Result<()> {
    let (window, region) = resolve_window(config, args, today())?;
    let summary = Analytics::new(db, config).sales_summary(window, &region)?;

    print_header("📊 Sales Summary", &summary.period, &summary.region);

    if summary.total_transactions == 0 {
        println!("   No sales found in this period.");
        return Ok(());
    }

    let cmp = &summary.period_comparison;
    println!("   Revenue:          ${:>12.2}   ({} vs previous)", summary.total_revenue, signed_pct(cmp.revenue_growth));
    println!("   Transactions:     {:>13}   ({} vs previous)", summary.total_transactions, signed_pct(cmp.transaction_growth));
    println!("   Avg order value:  ${:>12.2}", summary.average_order_value);
    println!("   Visits:           {:>13}", summary.visits);
    println!("   Conversion rate:  {:>12.2}%", summary.conversion_rate);
    println!();
    println!(
        "   Previous period {} to {}: ${:.2} across {} transactions",
        cmp.previous_period.start_date,
        cmp.previous_period.end_date,
        cmp.previous_revenue,
        cmp.previous_transactions
    );

    Ok(())
}

pub fn cmd_report_customers(
    db: &Database,
    config: &AnalyticsConfig,
    args: &WindowArgs,
    limit: Option<usize>,
) -> Result<()> {
    let (window, region) = resolve_window(config, args, today())?;
    let summary = Analytics::new(db, config).customer_summary(window, &region, limit)?;

    print_header("👥 Customer Analytics", &summary.period, &summary.region);

    if summary.total_customers == 0 {
        println!("   No customers purchased in this period.");
        return Ok(());
    }

    println!("   Active customers:    {}", summary.total_customers);
    println!("   Returning:           {}", summary.returning_customers);
    println!("   Retention rate:      {:.1}%", summary.customer_retention_rate);
    println!();
    println!("   {:20} │ {:>7} │ {:>12}", "Segment", "Count", "Revenue");
    println!("   ─────────────────────┼─────────┼──────────────");
    for bucket in &summary.segment_breakdown {
        println!(
            "   {:20} │ {:>7} │ {:>12.2}",
            truncate(&bucket.label, 20),
            bucket.count,
            bucket.revenue
        );
    }

    println!();
    println!("   {:3} {:30} │ {:>12} │ {:>5}", "#", "Top Customer", "Revenue", "Txns");
    println!("   ───────────────────────────────────┼──────────────┼───────");
    for (i, customer) in summary.top_customers.iter().enumerate() {
        println!(
            "   {:3} {:30} │ {:>12.2} │ {:>5}",
            i + 1,
            truncate(&customer.name, 30),
            customer.revenue,
            customer.transactions
        );
    }

    Ok(())
}

pub fn cmd_report_products(
    db: &Database,
    config: &AnalyticsConfig,
    args: &WindowArgs,
    limit: Option<usize>,
) -> Result<()> {
    let (window, region) = resolve_window(config, args, today())?;
    let summary = Analytics::new(db, config).product_summary(window, &region, limit)?;

    print_header("📦 Product Performance", &summary.period, &summary.region);

    if summary.top_products.is_empty() {
        println!("   No product sales in this period.");
    } else {
        println!(
            "   {:3} {:28} │ {:>12} │ {:>6} │ {:>9}",
            "#", "Product", "Revenue", "Units", "Avg Price"
        );
        println!("   ────────────────────────────────┼──────────────┼────────┼───────────");
        for (i, product) in summary.top_products.iter().enumerate() {
            println!(
                "   {:3} {:28} │ {:>12.2} │ {:>6} │ {:>9.2}",
                i + 1,
                truncate(&product.name, 28),
                product.revenue,
                product.units_sold,
                product.avg_price
            );
        }

        println!();
        println!("   {:20} │ {:>12} │ {:>6} │ {:>6}", "Category", "Revenue", "Units", "Share");
        println!("   ─────────────────────┼──────────────┼────────┼────────");
        for cat in &summary.category_performance {
            println!(
                "   {:20} │ {:>12.2} │ {:>6} │ {:>5.1}%",
                truncate(&cat.category, 20),
                cat.revenue,
                cat.units_sold,
                cat.revenue_share
            );
        }
    }

    let inventory = &summary.inventory_insights;
    println!();
    println!(
        "   Inventory: {} low stock, {} fast moving, {} slow moving",
        inventory.low_stock, inventory.fast_moving, inventory.slow_moving
    );
    for product in &inventory.products {
        let labels: Vec<&str> = product.labels.iter().map(|l| l.as_str()).collect();
        println!(
            "   ⚠️  {:28} stock {:>5}, {:>5} sold recently [{}]",
            truncate(&product.name, 28),
            product.stock_level,
            product.recent_units_sold,
            labels.join(", ")
        );
    }

    Ok(())
}

pub fn cmd_report_seasonal(
    db: &Database,
    config: &AnalyticsConfig,
    end: Option<&str>,
    region: Option<&str>,
    months: Option<u32>,
    threshold: Option<f64>,
) -> Result<()> {
    if months == Some(0) {
        anyhow::bail!("--months must be at least 1");
    }
    if threshold.is_some_and(|t| !t.is_finite() || t < 0.0) {
        anyhow::bail!("--threshold must be a non-negative number");
    }

    let analytics = Analytics::new(db, config);
    let as_of = match end {
        Some(raw) => window::parse_date(raw)?,
        None => today(),
    };
    let region = analytics.region(region)?;
    let summary = analytics.seasonal_summary(as_of, &region, months, threshold)?;

    println!();
    println!("📈 Seasonal Trends");
    println!(
        "   {} months ending {}  │  Region: {}",
        summary.months, summary.as_of, summary.region
    );
    println!("{}", RULE);
    println!("   Mean monthly revenue: ${:.2}", summary.mean_monthly_revenue);
    println!();

    let max = summary
        .monthly_trends
        .iter()
        .map(|t| t.revenue)
        .fold(0.0_f64, f64::max);
    for point in &summary.monthly_trends {
        let bar_len = if max > 0.0 {
            ((point.revenue / max) * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "   {:8} │ {:>12.2} │ {}",
            point.label,
            point.revenue,
            "█".repeat(bar_len)
        );
    }

    if !summary.seasonal_patterns.is_empty() {
        println!();
        println!("   Quarters:");
        for quarter in &summary.seasonal_patterns {
            println!(
                "   {:8} │ {:>12.2} │ {:>6} txns",
                quarter.label, quarter.revenue, quarter.transactions
            );
        }
    }

    println!();
    if summary.peak_periods.is_empty() {
        println!(
            "   No months exceed the mean by more than {:.0}%.",
            summary.threshold_pct
        );
    } else {
        println!("   Peak months (>{:.0}% above mean):", summary.threshold_pct);
        for peak in &summary.peak_periods {
            println!(
                "   🔥 {:8} ${:.2} ({})",
                peak.label,
                peak.revenue,
                signed_pct(peak.above_average)
            );
        }
    }

    Ok(())
}
