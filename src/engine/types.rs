use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::error::ReportError;

/// Staged milestone a payment can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    /// Notice to proceed
    Ntp,
    /// Structure inspection passed
    Structure,
    /// Final inspection passed
    Final,
}

impl Milestone {
    /// All milestones in report order
    pub const ALL: [Milestone; 3] = [Milestone::Ntp, Milestone::Structure, Milestone::Final];

    pub fn index(self) -> usize {
        match self {
            Milestone::Ntp => 0,
            Milestone::Structure => 1,
            Milestone::Final => 2,
        }
    }

    /// Column label used in rendered reports
    pub fn label(self) -> &'static str {
        match self {
            Milestone::Ntp => "NTP",
            Milestone::Structure => "Structure",
            Milestone::Final => "Final",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Milestone {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ntp" => Ok(Milestone::Ntp),
            "structure" => Ok(Milestone::Structure),
            "final" => Ok(Milestone::Final),
            other => Err(ReportError::Config(format!("unknown milestone '{}'", other))),
        }
    }
}

/// One value per milestone, indexable by [`Milestone`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerMilestone<T>(pub [T; 3]);

impl<T> PerMilestone<T> {
    pub fn from_fn(mut f: impl FnMut(Milestone) -> T) -> Self {
        Self([
            f(Milestone::Ntp),
            f(Milestone::Structure),
            f(Milestone::Final),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Milestone, &T)> {
        Milestone::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Milestone> for PerMilestone<T> {
    type Output = T;

    fn index(&self, milestone: Milestone) -> &T {
        &self.0[milestone.index()]
    }
}

impl<T> IndexMut<Milestone> for PerMilestone<T> {
    fn index_mut(&mut self, milestone: Milestone) -> &mut T {
        &mut self.0[milestone.index()]
    }
}

/// Date and amount attributed to one milestone of a case
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MilestonePayment {
    /// Empty when the milestone did not qualify
    pub date: Option<NaiveDate>,
    pub amount: f64,
}

/// Payment breakdown for one qualifying case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseComputation {
    pub case_id: String,
    /// Normalized category label, e.g. "Relocation"
    pub category: String,
    pub milestones: PerMilestone<MilestonePayment>,
}

impl CaseComputation {
    pub fn amount(&self, milestone: Milestone) -> f64 {
        self.milestones[milestone].amount
    }

    pub fn date(&self, milestone: Milestone) -> Option<NaiveDate> {
        self.milestones[milestone].date
    }

    /// Sum of the three milestone payments at full precision
    pub fn total(&self) -> f64 {
        Milestone::ALL.iter().map(|m| self.amount(*m)).sum()
    }
}
