use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::{
    config::{CategoryConfig, FixedSplitConfig, PolicyKind},
    engine::{
        eligibility::MilestoneFlags,
        types::{Milestone, MilestonePayment, PerMilestone},
    },
    error::{ReportError, Result},
    source::{CaseRecord, CellValue},
};

/// Coerce a raw payment cell to an amount.
///
/// Plain decimal text and finite numbers pass through; everything else,
/// including grouped text such as `"12,345"`, is 0.
pub fn to_money(value: &CellValue) -> f64 {
    if value.is_null() {
        return 0.0;
    }

    let amount = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// Constant total divided across milestones by weight
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRule {
    pub base: f64,
    /// Milestones without a weight are not paid under this rule
    pub weights: BTreeMap<Milestone, f64>,
}

impl SplitRule {
    pub fn weight(&self, milestone: Milestone) -> Option<f64> {
        self.weights.get(&milestone).copied()
    }
}

impl TryFrom<&FixedSplitConfig> for SplitRule {
    type Error = ReportError;

    fn try_from(config: &FixedSplitConfig) -> Result<Self> {
        if !config.base.is_finite() {
            return Err(ReportError::Config(format!(
                "fixed split base {} is not a finite number",
                config.base
            )));
        }

        let mut weights = BTreeMap::new();
        for (name, weight) in &config.weights {
            let milestone: Milestone = name.parse()?;
            if !weight.is_finite() {
                return Err(ReportError::Config(format!(
                    "fixed split weight for {} is not a finite number: {}",
                    milestone, weight
                )));
            }
            weights.insert(milestone, *weight);
        }

        Ok(Self {
            base: config.base,
            weights,
        })
    }
}

/// How a category attributes money to its milestones
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentPolicy {
    FixedSplit(SplitRule),
    /// Amounts come from the record's own payment columns
    RealPayment,
}

impl PaymentPolicy {
    /// Payments for every milestone, or `None` when no milestone this policy
    /// tracks is inside the window
    pub fn compute(
        &self,
        record: &CaseRecord,
        flags: &MilestoneFlags,
    ) -> Option<PerMilestone<MilestonePayment>> {
        let mut include = false;

        let payments = PerMilestone::from_fn(|m| {
            let Some(date) = flags.qualifying_date(m) else {
                return MilestonePayment::default();
            };

            let amount = match self {
                PaymentPolicy::FixedSplit(rule) => match rule.weight(m) {
                    Some(weight) => rule.base * weight,
                    None => return MilestonePayment::default(),
                },
                PaymentPolicy::RealPayment => to_money(record.payment_cell(m)),
            };

            include = true;
            MilestonePayment {
                date: Some(date),
                amount,
            }
        });

        include.then_some(payments)
    }
}

/// Category vocabulary resolved to payment policies
#[derive(Debug, Clone)]
pub struct CategoryRules {
    policies: HashMap<String, PaymentPolicy>,
}

impl CategoryRules {
    pub fn from_config(categories: &[CategoryConfig], split: &FixedSplitConfig) -> Result<Self> {
        let rule = SplitRule::try_from(split)?;
        let mut policies = HashMap::new();

        for category in categories {
            let key = category.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(ReportError::Config("category name cannot be empty".to_string()));
            }

            let policy = match category.policy {
                PolicyKind::FixedSplit => PaymentPolicy::FixedSplit(rule.clone()),
                PolicyKind::RealPayment => PaymentPolicy::RealPayment,
            };

            if policies.insert(key.clone(), policy).is_some() {
                return Err(ReportError::Config(format!(
                    "category '{}' is configured more than once",
                    key
                )));
            }
        }

        debug!("Configured {} award categories", policies.len());
        Ok(Self { policies })
    }

    /// Look up a raw award type, ignoring case and surrounding whitespace
    pub fn policy_for(&self, award_type: &str) -> Option<&PaymentPolicy> {
        self.policies.get(&award_type.trim().to_lowercase())
    }
}

/// Display label for a raw award type: first letter upper case, the rest lower
pub fn category_label(award_type: &str) -> String {
    let lower = award_type.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EligibilityFilter;
    use crate::engine::ReportingWindow;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flags_for(record: &CaseRecord) -> MilestoneFlags {
        let window = ReportingWindow::closed_interval(date(2024, 10, 23), date(2025, 5, 31)).unwrap();
        EligibilityFilter::new(Vec::<String>::new(), window).flags(record)
    }

    fn dated(ntp: &str, structure: &str, fin: &str) -> CaseRecord {
        CaseRecord {
            case_id: "C-9".into(),
            dates: PerMilestone([ntp.into(), structure.into(), fin.into()]),
            ..CaseRecord::default()
        }
    }

    fn split(weights: &[(Milestone, f64)]) -> PaymentPolicy {
        PaymentPolicy::FixedSplit(SplitRule {
            base: 65000.0,
            weights: weights.iter().copied().collect(),
        })
    }

    fn default_split() -> PaymentPolicy {
        split(&[(Milestone::Ntp, 0.5), (Milestone::Structure, 0.5), (Milestone::Final, 0.0)])
    }

    #[test]
    fn test_to_money() {
        assert_eq!(to_money(&CellValue::Number(1500.25)), 1500.25);
        assert_eq!(to_money(&CellValue::from("12345")), 12345.0);
        assert_eq!(to_money(&CellValue::from(" 99.5 ")), 99.5);
        assert_eq!(to_money(&CellValue::from("-20")), -20.0);
    }

    #[test]
    fn test_to_money_non_numeric_is_zero() {
        assert_eq!(to_money(&CellValue::from("12,345")), 0.0);
        assert_eq!(to_money(&CellValue::from("$500")), 0.0);
        assert_eq!(to_money(&CellValue::from("NaN")), 0.0);
        assert_eq!(to_money(&CellValue::from("inf")), 0.0);
        assert_eq!(to_money(&CellValue::from("")), 0.0);
        assert_eq!(to_money(&CellValue::from("   ")), 0.0);
        assert_eq!(to_money(&CellValue::Null), 0.0);
        assert_eq!(to_money(&CellValue::Bool(true)), 0.0);
        assert_eq!(to_money(&CellValue::Number(f64::NAN)), 0.0);
        assert_eq!(to_money(&CellValue::Date(date(2025, 1, 1))), 0.0);
    }

    #[test]
    fn test_fixed_split_single_milestone() {
        let record = dated("2025-01-10", "", "");
        let payments = default_split().compute(&record, &flags_for(&record)).unwrap();

        assert_eq!(payments[Milestone::Ntp].amount, 32500.0);
        assert_eq!(payments[Milestone::Ntp].date, Some(date(2025, 1, 10)));
        assert_eq!(payments[Milestone::Structure], MilestonePayment::default());
        assert_eq!(payments[Milestone::Final], MilestonePayment::default());
    }

    #[test]
    fn test_fixed_split_full_base() {
        let record = dated("2025-01-10", "2025-03-02", "");
        let payments = default_split().compute(&record, &flags_for(&record)).unwrap();

        let total: f64 = payments.0.iter().map(|p| p.amount).sum();
        assert_eq!(total, 65000.0);
    }

    #[test]
    fn test_zero_weight_still_qualifies_and_shows_date() {
        let record = dated("", "", "2025-04-04");
        let payments = default_split().compute(&record, &flags_for(&record)).unwrap();

        assert_eq!(payments[Milestone::Final].amount, 0.0);
        assert_eq!(payments[Milestone::Final].date, Some(date(2025, 4, 4)));
    }

    #[test]
    fn test_untracked_milestone_does_not_qualify() {
        let two_milestone = split(&[(Milestone::Ntp, 0.5), (Milestone::Final, 0.5)]);

        let record = dated("", "2025-02-02", "");
        assert_eq!(two_milestone.compute(&record, &flags_for(&record)), None);

        let record = dated("", "2025-02-02", "2025-05-31");
        let payments = two_milestone.compute(&record, &flags_for(&record)).unwrap();
        assert_eq!(payments[Milestone::Structure], MilestonePayment::default());
        assert_eq!(payments[Milestone::Final].amount, 32500.0);
    }

    #[test]
    fn test_real_payment_reads_columns_in_window_only() {
        let mut record = dated("2023-05-05", "2025-02-02", "");
        record.payments = PerMilestone([
            CellValue::Number(9999.0),
            CellValue::from("4100.75"),
            CellValue::Number(500.0),
        ]);

        let payments = PaymentPolicy::RealPayment
            .compute(&record, &flags_for(&record))
            .unwrap();

        assert_eq!(payments[Milestone::Ntp].amount, 0.0);
        assert_eq!(payments[Milestone::Structure].amount, 4100.75);
        assert_eq!(payments[Milestone::Final].amount, 0.0);
    }

    #[test]
    fn test_real_payment_malformed_amount_is_zero() {
        let mut record = dated("", "2025-02-02", "");
        record.payments[Milestone::Structure] = CellValue::from("12,345");

        let payments = PaymentPolicy::RealPayment
            .compute(&record, &flags_for(&record))
            .unwrap();
        assert_eq!(payments[Milestone::Structure].amount, 0.0);
        assert_eq!(payments[Milestone::Structure].date, Some(date(2025, 2, 2)));
    }

    #[test]
    fn test_category_lookup_is_case_insensitive() {
        let rules = CategoryRules::from_config(
            &[
                CategoryConfig::new("Relocation", PolicyKind::FixedSplit),
                CategoryConfig::new("reconstruction", PolicyKind::RealPayment),
            ],
            &FixedSplitConfig::default(),
        )
        .unwrap();

        assert!(matches!(rules.policy_for(" RELOCATION "), Some(PaymentPolicy::FixedSplit(_))));
        assert_eq!(rules.policy_for("Reconstruction"), Some(&PaymentPolicy::RealPayment));
        assert_eq!(rules.policy_for("elevation"), None);
    }

    #[test]
    fn test_category_config_validation() {
        let duplicate = [
            CategoryConfig::new("repair", PolicyKind::FixedSplit),
            CategoryConfig::new("Repair", PolicyKind::RealPayment),
        ];
        assert!(CategoryRules::from_config(&duplicate, &FixedSplitConfig::default()).is_err());

        let empty = [CategoryConfig::new("  ", PolicyKind::FixedSplit)];
        assert!(CategoryRules::from_config(&empty, &FixedSplitConfig::default()).is_err());

        let bad_split = FixedSplitConfig {
            base: f64::INFINITY,
            ..FixedSplitConfig::default()
        };
        assert!(CategoryRules::from_config(&[], &bad_split).is_err());

        let mut unknown_milestone = FixedSplitConfig::default();
        unknown_milestone.weights.insert("permit".to_string(), 0.1);
        assert!(matches!(
            SplitRule::try_from(&unknown_milestone),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let mut split = FixedSplitConfig::default();
        split.weights.insert("structure".to_string(), f64::NAN);
        assert!(matches!(SplitRule::try_from(&split), Err(ReportError::Config(_))));

        split.weights.insert("structure".to_string(), f64::INFINITY);
        assert!(matches!(SplitRule::try_from(&split), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("RELOCATION"), "Relocation");
        assert_eq!(category_label(" repair "), "Repair");
        assert_eq!(category_label(""), "");
    }
}
