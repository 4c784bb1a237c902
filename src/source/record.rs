use std::collections::HashMap;

use crate::{
    config::FieldMap,
    engine::{Milestone, PerMilestone},
    source::cell::CellValue,
};

/// One sheet row keyed by normalized column title
pub type RawRow = HashMap<String, CellValue>;

/// Normalize a column title: trim and fold embedded line breaks into spaces
pub fn normalize_title(title: &str) -> String {
    title
        .trim()
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// A case row resolved through the configured [`FieldMap`].
///
/// Columns the map names but the row lacks resolve to [`CellValue::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseRecord {
    pub case_id: CellValue,
    pub award_type: CellValue,
    pub stage_status: CellValue,
    pub dates: PerMilestone<CellValue>,
    /// Alternate final date, read only when the primary one yields no date
    pub final_date_fallback: CellValue,
    pub payments: PerMilestone<CellValue>,
}

impl CaseRecord {
    pub fn from_row(row: &RawRow, fields: &FieldMap) -> Self {
        let get = |name: &str| row.get(name).cloned().unwrap_or_default();

        Self {
            case_id: get(&fields.case_id),
            award_type: get(&fields.award_type),
            stage_status: get(&fields.stage_status),
            dates: PerMilestone::from_fn(|m| get(fields.date_field(m))),
            final_date_fallback: fields
                .final_date_fallback
                .as_deref()
                .map(get)
                .unwrap_or_default(),
            payments: PerMilestone::from_fn(|m| get(fields.payment_field(m))),
        }
    }

    pub fn case_id(&self) -> String {
        self.case_id.to_display()
    }

    pub fn stage_status(&self) -> String {
        self.stage_status.to_display()
    }

    pub fn award_type(&self) -> String {
        self.award_type.to_display()
    }

    pub fn date_cell(&self, milestone: Milestone) -> &CellValue {
        &self.dates[milestone]
    }

    pub fn payment_cell(&self, milestone: Milestone) -> &CellValue {
        &self.payments[milestone]
    }
}

/// Resolve every raw row of a snapshot once
pub fn resolve_records(rows: &[RawRow], fields: &FieldMap) -> Vec<CaseRecord> {
    rows.iter().map(|row| CaseRecord::from_row(row, fields)).collect()
}
