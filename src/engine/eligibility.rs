use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

use crate::{
    engine::{
        dates::normalize_date,
        types::{Milestone, PerMilestone},
        window::ReportingWindow,
    },
    source::CaseRecord,
};

/// Normalized milestone dates of a record and their in-window flags
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilestoneFlags {
    pub dates: PerMilestone<Option<NaiveDate>>,
    pub in_window: PerMilestone<bool>,
}

impl MilestoneFlags {
    pub fn any_in_window(&self) -> bool {
        self.in_window.0.iter().any(|flag| *flag)
    }

    /// Date of a milestone if it falls inside the window
    pub fn qualifying_date(&self, milestone: Milestone) -> Option<NaiveDate> {
        if self.in_window[milestone] {
            self.dates[milestone]
        } else {
            None
        }
    }
}

/// Outcome of the eligibility filter for one record
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    /// Stage status is in the exclusion set
    Excluded { status: String },
    /// No milestone date falls inside the window
    NoMilestoneInWindow(MilestoneFlags),
    Eligible(MilestoneFlags),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible(_))
    }

    pub fn flags(&self) -> Option<&MilestoneFlags> {
        match self {
            Eligibility::Excluded { .. } => None,
            Eligibility::NoMilestoneInWindow(flags) | Eligibility::Eligible(flags) => Some(flags),
        }
    }

    /// Human-readable explanation
    pub fn reason(&self) -> String {
        match self {
            Eligibility::Excluded { status } => {
                format!("Stage status '{}' is excluded from reporting", status)
            }
            Eligibility::NoMilestoneInWindow(_) => "No milestone date falls inside the reporting window".to_string(),
            Eligibility::Eligible(flags) => {
                let qualifying: Vec<&str> = Milestone::ALL
                    .iter()
                    .filter(|m| flags.in_window[**m])
                    .map(|m| m.label())
                    .collect();
                format!("In window: {}", qualifying.join(", "))
            }
        }
    }
}

/// Decides whether a record is reportable for the run's window
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    exclusions: HashSet<String>,
    window: ReportingWindow,
}

impl EligibilityFilter {
    pub fn new<I, S>(exclusions: I, window: ReportingWindow) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exclusions: exclusions
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .collect(),
            window,
        }
    }

    pub fn window(&self) -> &ReportingWindow {
        &self.window
    }

    pub fn is_excluded_status(&self, status: &str) -> bool {
        self.exclusions.contains(status.trim())
    }

    /// Normalized milestone dates; Final falls back to the alternate column
    /// when the primary cell yields no date
    pub fn milestone_dates(record: &CaseRecord) -> PerMilestone<Option<NaiveDate>> {
        PerMilestone::from_fn(|m| {
            let date = normalize_date(record.date_cell(m));
            match m {
                Milestone::Final => date.or_else(|| normalize_date(&record.final_date_fallback)),
                _ => date,
            }
        })
    }

    pub fn flags(&self, record: &CaseRecord) -> MilestoneFlags {
        let dates = Self::milestone_dates(record);
        let in_window = PerMilestone::from_fn(|m| self.window.contains(dates[m]));
        MilestoneFlags { dates, in_window }
    }

    /// Check a record.
    ///
    /// The status check runs first and ignores dates and category entirely.
    pub fn check(&self, record: &CaseRecord) -> Eligibility {
        let status = record.stage_status();
        if self.is_excluded_status(&status) {
            debug!("Case {} excluded by status '{}'", record.case_id(), status);
            return Eligibility::Excluded { status };
        }

        let flags = self.flags(record);
        if flags.any_in_window() {
            Eligibility::Eligible(flags)
        } else {
            debug!("Case {} has no milestone in window {}", record.case_id(), self.window);
            Eligibility::NoMilestoneInWindow(flags)
        }
    }
}
