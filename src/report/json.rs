use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

use crate::{
    engine::RunSummary,
    error::{ReportError, Result},
    report::{ensure_parent, Report, ReportRow, ReportSink, TotalsRow},
};

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub title: String,
    pub generated_on: NaiveDate,
    pub window: String,
    pub rows: Vec<ReportRow>,
    pub totals: TotalsRow,
    pub summary: RunSummary,
}

impl From<&Report> for JsonReport {
    fn from(report: &Report) -> Self {
        Self {
            title: report.title.clone(),
            generated_on: report.generated_on,
            window: report.run.window.to_string(),
            rows: report.rows(),
            totals: report.totals(),
            summary: report.run.summary,
        }
    }
}

/// Writes the report as a pretty-printed JSON document
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn document(report: &Report) -> Result<String> {
        Ok(serde_json::to_string_pretty(&JsonReport::from(report))?)
    }
}

impl ReportSink for JsonSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, report: &Report) -> Result<Option<PathBuf>> {
        let body = Self::document(report)?;

        ensure_parent(&self.path)?;
        std::fs::write(&self.path, body).map_err(|e| {
            ReportError::Sink(format!("cannot write {}: {}", self.path.display(), e))
        })?;

        Ok(Some(self.path.clone()))
    }
}
