use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::ReportConfig,
    engine::{
        aggregate::AggregateTotals,
        eligibility::{Eligibility, EligibilityFilter},
        payment::{category_label, CategoryRules},
        types::CaseComputation,
        window::ReportingWindow,
    },
    error::Result,
    source::CaseRecord,
};

/// What happened to one record
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Excluded { status: String },
    NoMilestoneInWindow,
    UnknownCategory { award_type: String },
    /// Dates are in window but none of them is paid under the category's policy
    NoPaidMilestone { category: String },
    Included(CaseComputation),
}

impl CaseOutcome {
    pub fn computation(&self) -> Option<&CaseComputation> {
        match self {
            CaseOutcome::Included(case) => Some(case),
            _ => None,
        }
    }
}

/// Counts of how records were dispatched during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_records: usize,
    pub excluded_by_status: usize,
    pub outside_window: usize,
    pub unknown_category: usize,
    pub included: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &CaseOutcome) {
        self.total_records += 1;
        match outcome {
            CaseOutcome::Excluded { .. } => self.excluded_by_status += 1,
            CaseOutcome::NoMilestoneInWindow | CaseOutcome::NoPaidMilestone { .. } => {
                self.outside_window += 1
            }
            CaseOutcome::UnknownCategory { .. } => self.unknown_category += 1,
            CaseOutcome::Included(_) => self.included += 1,
        }
    }

    /// Print a formatted summary to console
    pub fn print_summary(&self) {
        println!("\n{}", "=== Run Summary ===".bold());
        println!("Records read:        {}", self.total_records);
        println!("Excluded by status:  {}", self.excluded_by_status);
        println!("Outside window:      {}", self.outside_window);
        println!("Unknown category:    {}", self.unknown_category);
        println!("Included:            {} ✓", self.included.to_string().green());
        println!("===================");
    }
}

/// Result of one engine pass over a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRun {
    pub window: ReportingWindow,
    pub cases: Vec<CaseComputation>,
    pub totals: AggregateTotals,
    pub summary: RunSummary,
}

/// Eligibility filtering, payment computation and aggregation over one snapshot
#[derive(Debug, Clone)]
pub struct PayoutEngine {
    filter: EligibilityFilter,
    categories: CategoryRules,
}

impl PayoutEngine {
    pub fn new(filter: EligibilityFilter, categories: CategoryRules) -> Self {
        Self { filter, categories }
    }

    /// Build an engine from the report section of the configuration
    pub fn from_config(report: &ReportConfig) -> Result<Self> {
        let window = ReportingWindow::try_from(&report.window)?;
        Self::with_window(report, window)
    }

    /// Build an engine with a window chosen for this run
    pub fn with_window(report: &ReportConfig, window: ReportingWindow) -> Result<Self> {
        let filter = EligibilityFilter::new(&report.exclusion_statuses, window);
        let categories = CategoryRules::from_config(&report.categories, &report.fixed_split)?;
        Ok(Self::new(filter, categories))
    }

    pub fn window(&self) -> &ReportingWindow {
        self.filter.window()
    }

    pub fn filter(&self) -> &EligibilityFilter {
        &self.filter
    }

    /// Decide and compute a single record
    pub fn evaluate(&self, record: &CaseRecord) -> CaseOutcome {
        let flags = match self.filter.check(record) {
            Eligibility::Excluded { status } => return CaseOutcome::Excluded { status },
            Eligibility::NoMilestoneInWindow(_) => return CaseOutcome::NoMilestoneInWindow,
            Eligibility::Eligible(flags) => flags,
        };

        let award_type = record.award_type();
        let Some(policy) = self.categories.policy_for(&award_type) else {
            debug!("Case {} has unrecognized award type '{}'", record.case_id(), award_type);
            return CaseOutcome::UnknownCategory { award_type };
        };

        let category = category_label(&award_type);
        match policy.compute(record, &flags) {
            Some(milestones) => CaseOutcome::Included(CaseComputation {
                case_id: record.case_id(),
                category,
                milestones,
            }),
            None => CaseOutcome::NoPaidMilestone { category },
        }
    }

    /// Run the full pipeline; output order follows input order
    pub fn run(&self, records: &[CaseRecord]) -> PayoutRun {
        info!(
            "Evaluating {} records for window {}",
            records.len(),
            self.filter.window()
        );

        let mut summary = RunSummary::default();
        let mut cases = Vec::new();

        for record in records {
            let outcome = self.evaluate(record);
            summary.record(&outcome);
            if let CaseOutcome::Included(case) = outcome {
                debug!("Case {} included, total {:.2}", case.case_id, case.total());
                cases.push(case);
            }
        }

        let totals = AggregateTotals::from_cases(&cases);

        info!(
            "Run complete: {} included, {} excluded by status, {} outside window, {} unknown category",
            summary.included, summary.excluded_by_status, summary.outside_window, summary.unknown_category
        );

        PayoutRun {
            window: *self.filter.window(),
            cases,
            totals,
            summary,
        }
    }
}
