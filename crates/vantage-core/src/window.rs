//! Metric windows, comparison windows and region filters
//!
//! Every aggregation takes its window and region explicitly. There is no
//! ambient "current filter".

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::ReportPeriod;

/// Closed date interval `[start, end]`, both days included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl MetricWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The window of equal length ending the day before this one starts
    pub fn previous(&self) -> Self {
        let end = self.start - Duration::days(1);
        let start = self.start - Duration::days(self.days());
        Self { start, end }
    }

    pub fn comparison(&self) -> ComparisonPair {
        ComparisonPair {
            current: *self,
            previous: self.previous(),
        }
    }

    pub fn period(&self) -> ReportPeriod {
        ReportPeriod {
            start_date: self.start,
            end_date: self.end,
        }
    }
}

impl std::fmt::Display for MetricWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A window and the preceding window of identical length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonPair {
    pub current: MetricWindow,
    pub previous: MetricWindow,
}

/// Region restriction for a query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Only(String),
}

impl RegionFilter {
    /// Wildcard accepted in place of a region name
    pub const WILDCARD: &'static str = "all";

    /// Resolve a raw region parameter against the known region set.
    ///
    /// Missing, empty or `all` means every region. Names match
    /// case-insensitively and come back in their canonical spelling.
    pub fn parse(raw: Option<&str>, known: &[String]) -> Result<Self> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::All),
            Some(r) if r.eq_ignore_ascii_case(Self::WILDCARD) => return Ok(Self::All),
            Some(r) => r,
        };

        known
            .iter()
            .find(|k| k.eq_ignore_ascii_case(raw))
            .map(|k| Self::Only(k.clone()))
            .ok_or_else(|| Error::UnknownRegion {
                region: raw.to_string(),
                known: known.to_vec(),
            })
    }

    pub fn matches(&self, region: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(r) => r == region,
        }
    }

    /// `all` or the region name
    pub fn label(&self) -> &str {
        match self {
            Self::All => Self::WILDCARD,
            Self::Only(r) => r,
        }
    }
}

/// Record store query: an optional window plus a region filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub window: Option<MetricWindow>,
    pub region: RegionFilter,
}

impl RecordQuery {
    pub fn new(window: MetricWindow, region: RegionFilter) -> Self {
        Self {
            window: Some(window),
            region,
        }
    }

    /// Everything, all regions
    pub fn all() -> Self {
        Self::default()
    }
}

/// Named period presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    Last30Days,
    Last90Days,
    Last12Months,
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThisMonth => "this-month",
            Self::LastMonth => "last-month",
            Self::ThisYear => "this-year",
            Self::LastYear => "last-year",
            Self::Last30Days => "last-30-days",
            Self::Last90Days => "last-90-days",
            Self::Last12Months => "last-12-months",
            Self::All => "all",
        }
    }

    pub fn all() -> &'static [Period] {
        &[
            Self::ThisMonth,
            Self::LastMonth,
            Self::ThisYear,
            Self::LastYear,
            Self::Last30Days,
            Self::Last90Days,
            Self::Last12Months,
            Self::All,
        ]
    }

    /// Resolve the preset relative to `today`
    pub fn window(&self, today: NaiveDate) -> Result<MetricWindow> {
        let (start, end) = match self {
            Self::ThisMonth => (month_start(today), today),
            Self::LastMonth => {
                let end = month_start(today) - Duration::days(1);
                (month_start(end), end)
            }
            Self::ThisYear => (year_start(today), today),
            Self::LastYear => {
                let end = year_start(today) - Duration::days(1);
                (year_start(end), end)
            }
            Self::Last30Days => (today - Duration::days(29), today),
            Self::Last90Days => (today - Duration::days(89), today),
            Self::Last12Months => {
                let start = month_start(today)
                    .checked_sub_months(Months::new(11))
                    .ok_or_else(|| Error::InvalidData(format!("date out of range: {}", today)))?;
                (start, today)
            }
            Self::All => {
                let start = NaiveDate::from_ymd_opt(2000, 1, 1)
                    .ok_or_else(|| Error::InvalidData("invalid epoch date".into()))?;
                (start.min(today), today)
            }
        };
        MetricWindow::new(start, end)
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .find(|p| p.as_str() == lower)
            .copied()
            .ok_or_else(|| {
                format!(
                    "Unknown period: {}. Available: {}",
                    s,
                    Self::all()
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Resolve a window from explicit dates, falling back to a period preset.
///
/// Both `from` and `to` must be given for the explicit range to apply.
pub fn resolve_window(
    period: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<MetricWindow> {
    if let (Some(from), Some(to)) = (from, to) {
        let start = parse_date(from)?;
        let end = parse_date(to)?;
        return MetricWindow::new(start, end);
    }

    let period: Period = period
        .unwrap_or(Period::ThisMonth.as_str())
        .parse()
        .map_err(Error::InvalidData)?;
    period.window(today)
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidData(format!("Invalid date '{}' (use YYYY-MM-DD)", s)))
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

fn year_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.ordinal0() as i64)
}
