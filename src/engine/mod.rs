pub mod aggregate;
pub mod dates;
pub mod eligibility;
pub mod payment;
pub mod runner;
pub mod types;
pub mod window;

pub use aggregate::AggregateTotals;
pub use dates::normalize_date;
pub use eligibility::{Eligibility, EligibilityFilter, MilestoneFlags};
pub use payment::{to_money, CategoryRules, PaymentPolicy, SplitRule};
pub use runner::{CaseOutcome, PayoutEngine, PayoutRun, RunSummary};
pub use types::{CaseComputation, Milestone, MilestonePayment, PerMilestone};
pub use window::{MonthBound, ReportingWindow};
