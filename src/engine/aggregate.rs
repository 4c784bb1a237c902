use crate::engine::types::{CaseComputation, Milestone, PerMilestone};

/// Column sums over the included cases
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateTotals {
    pub milestones: PerMilestone<f64>,
    pub total: f64,
}

impl AggregateTotals {
    /// Sum each milestone column in a single pass, then the grand total
    /// as the sum of the column sums
    pub fn from_cases(cases: &[CaseComputation]) -> Self {
        let mut milestones = PerMilestone::<f64>::default();

        for case in cases {
            for milestone in Milestone::ALL {
                milestones[milestone] += case.amount(milestone);
            }
        }

        let total = milestones.0.iter().sum();
        Self { milestones, total }
    }

    pub fn milestone(&self, milestone: Milestone) -> f64 {
        self.milestones[milestone]
    }
}
