use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::{
    config::{WindowConfig, WindowStyle},
    error::{ReportError, Result},
};

/// First day of the month a [`ReportingWindow::ExclusiveMonth`] stops at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthBound(NaiveDate);

impl MonthBound {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Parse a `YYYY-MM` month
    pub fn parse(text: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ReportError::Config(format!("invalid month bound '{}', expected YYYY-MM", text)))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for MonthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

/// Date range deciding which milestones count for a report run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingWindow {
    /// `start <= date <= end`
    ClosedInterval { start: NaiveDate, end: NaiveDate },
    /// Year-month of the date strictly before the bound month, no lower bound
    ExclusiveMonth { bound: MonthBound },
}

impl ReportingWindow {
    pub fn closed_interval(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ReportError::Config(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self::ClosedInterval { start, end })
    }

    pub fn exclusive_month(bound: MonthBound) -> Self {
        Self::ExclusiveMonth { bound }
    }

    /// Missing dates are never inside the window
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };

        match self {
            ReportingWindow::ClosedInterval { start, end } => *start <= date && date <= *end,
            // comparing against the first of the bound month is the same as
            // comparing year-month pairs
            ReportingWindow::ExclusiveMonth { bound } => date < bound.first_day(),
        }
    }

    /// Short tag suitable for file names
    pub fn tag(&self) -> String {
        match self {
            ReportingWindow::ClosedInterval { end, .. } => format!("until_{}", end),
            ReportingWindow::ExclusiveMonth { bound } => format!("before_{}", bound),
        }
    }
}

impl fmt::Display for ReportingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportingWindow::ClosedInterval { start, end } => write!(f, "{} to {}", start, end),
            ReportingWindow::ExclusiveMonth { bound } => write!(f, "before {}", bound),
        }
    }
}

fn parse_config_date(field: &str, value: Option<&str>) -> Result<NaiveDate> {
    let value = value.ok_or_else(|| {
        ReportError::Config(format!("closed-interval window requires '{}'", field))
    })?;

    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ReportError::Config(format!(
            "window {} '{}' is not a YYYY-MM-DD date",
            field, value
        ))
    })
}

impl TryFrom<&WindowConfig> for ReportingWindow {
    type Error = ReportError;

    fn try_from(config: &WindowConfig) -> Result<Self> {
        match config.style {
            WindowStyle::ClosedInterval => {
                if config.month_bound.is_some() {
                    return Err(ReportError::Config(
                        "closed-interval window cannot also set month_bound".to_string(),
                    ));
                }
                let start = parse_config_date("start", config.start.as_deref())?;
                let end = parse_config_date("end", config.end.as_deref())?;
                Self::closed_interval(start, end)
            }
            WindowStyle::ExclusiveMonth => {
                if config.start.is_some() || config.end.is_some() {
                    return Err(ReportError::Config(
                        "exclusive-month window cannot also set start or end".to_string(),
                    ));
                }
                let bound = config.month_bound.as_deref().ok_or_else(|| {
                    ReportError::Config("exclusive-month window requires 'month_bound'".to_string())
                })?;
                Ok(Self::exclusive_month(MonthBound::parse(bound)?))
            }
        }
    }
}
