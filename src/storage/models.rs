use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{Milestone, PayoutRun};

/// Audit line for one completed report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub generated_at: DateTime<Utc>,
    pub window: String,
    pub source: String,
    pub records_read: usize,
    pub case_count: usize,
    pub ntp_total: f64,
    pub structure_total: f64,
    pub final_total: f64,
    pub grand_total: f64,
}

impl RunRecord {
    pub fn from_run(run: &PayoutRun, source: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            id: 0, // assigned by the database
            generated_at,
            window: run.window.to_string(),
            source: source.to_string(),
            records_read: run.summary.total_records,
            case_count: run.cases.len(),
            ntp_total: run.totals.milestone(Milestone::Ntp),
            structure_total: run.totals.milestone(Milestone::Structure),
            final_total: run.totals.milestone(Milestone::Final),
            grand_total: run.totals.total,
        }
    }
}
