pub mod console;
pub mod html;
pub mod json;

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    config::OutputFormat,
    engine::{Milestone, PayoutRun},
    error::Result,
    utils::format_date,
};

pub use console::ConsoleSink;
pub use html::HtmlSink;
pub use json::JsonSink;

/// One rendered report row, in the column order every sink uses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Case ID")]
    pub case_id: String,
    #[serde(rename = "Type")]
    pub category: String,
    #[serde(rename = "NTP Date")]
    pub ntp_date: String,
    #[serde(rename = "NTP $")]
    pub ntp_amount: f64,
    #[serde(rename = "Structure Date")]
    pub structure_date: String,
    #[serde(rename = "Structure $")]
    pub structure_amount: f64,
    #[serde(rename = "Final Date")]
    pub final_date: String,
    #[serde(rename = "Final $")]
    pub final_amount: f64,
    #[serde(rename = "Total")]
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalsRow {
    #[serde(rename = "NTP")]
    pub ntp: f64,
    #[serde(rename = "Structure")]
    pub structure: f64,
    #[serde(rename = "Final")]
    pub final_amount: f64,
    #[serde(rename = "Total")]
    pub total: f64,
}

pub const COLUMNS: [&str; 9] = [
    "Case ID",
    "Type",
    "NTP Date",
    "NTP $",
    "Structure Date",
    "Structure $",
    "Final Date",
    "Final $",
    "Total",
];

/// Engine output plus the presentation details sinks need
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub generated_on: NaiveDate,
    pub run: PayoutRun,
}

impl Report {
    pub fn new(title: impl Into<String>, generated_on: NaiveDate, run: PayoutRun) -> Self {
        Self {
            title: title.into(),
            generated_on,
            run,
        }
    }

    /// Heading shared by all document sinks
    pub fn heading(&self) -> String {
        format!(
            "{} ({}) — {} cases",
            self.title,
            self.run.window,
            self.run.cases.len()
        )
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.run
            .cases
            .iter()
            .map(|case| ReportRow {
                case_id: case.case_id.clone(),
                category: case.category.clone(),
                ntp_date: format_date(case.date(Milestone::Ntp)),
                ntp_amount: case.amount(Milestone::Ntp),
                structure_date: format_date(case.date(Milestone::Structure)),
                structure_amount: case.amount(Milestone::Structure),
                final_date: format_date(case.date(Milestone::Final)),
                final_amount: case.amount(Milestone::Final),
                total: case.total(),
            })
            .collect()
    }

    pub fn totals(&self) -> TotalsRow {
        let totals = &self.run.totals;
        TotalsRow {
            ntp: totals.milestone(Milestone::Ntp),
            structure: totals.milestone(Milestone::Structure),
            final_amount: totals.milestone(Milestone::Final),
            total: totals.total,
        }
    }
}

/// Renders a finished report somewhere
#[cfg_attr(test, mockall::automock)]
pub trait ReportSink {
    fn name(&self) -> &'static str;

    /// Render the report, returning the written file if there is one
    fn render(&self, report: &Report) -> Result<Option<PathBuf>>;
}

/// Default output file stem for a run
pub fn default_file_stem(run: &PayoutRun) -> String {
    format!("payout_summary_{}", run.window.tag())
}

/// Build the sinks for the requested formats
pub fn build_sinks(
    formats: &[OutputFormat],
    dir: &Path,
    file_stem: &str,
    show_summary: bool,
) -> Vec<Box<dyn ReportSink>> {
    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    for format in formats {
        let sink: Box<dyn ReportSink> = match format {
            OutputFormat::Console => Box::new(ConsoleSink::new(show_summary)),
            OutputFormat::Html => Box::new(HtmlSink::new(dir.join(format!("{}.html", file_stem)))),
            OutputFormat::Json => Box::new(JsonSink::new(dir.join(format!("{}.json", file_stem)))),
        };
        sinks.push(sink);
    }
    sinks
}

/// Render through every sink; the first failure aborts the run
pub fn render_all(sinks: &[Box<dyn ReportSink>], report: &Report) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for sink in sinks {
        if let Some(path) = sink.render(report)? {
            info!("{} report written to {}", sink.name(), path.display());
            written.push(path);
        }
    }
    Ok(written)
}

/// Create the parent directory of an output file
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use fixtures::sample_report;

    #[test]
    fn test_rows_follow_outbound_contract() {
        let report = sample_report();
        let rows = report.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ntp_date, "2024-11-05");
        assert_eq!(rows[0].final_date, "");
        assert_eq!(rows[0].total, 65000.0);
        assert_eq!(rows[1].structure_amount, 4100.75);

        let json = serde_json::to_value(&rows[0]).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), COLUMNS.len());
        for column in COLUMNS {
            assert!(json.get(column).is_some(), "missing column {}", column);
        }
    }

    #[test]
    fn test_totals_row_matches_rows() {
        let report = sample_report();
        let rows = report.rows();
        let totals = report.totals();

        assert_eq!(totals.ntp, rows.iter().map(|r| r.ntp_amount).sum::<f64>());
        assert_eq!(totals.structure, rows.iter().map(|r| r.structure_amount).sum::<f64>());
        assert_eq!(totals.final_amount, 0.0);
        assert_eq!(totals.total, totals.ntp + totals.structure + totals.final_amount);
    }

    #[test]
    fn test_heading_and_stem() {
        let report = sample_report();
        assert_eq!(
            report.heading(),
            "Payout summary (2024-10-23 to 2025-05-31) — 2 cases"
        );
        assert_eq!(default_file_stem(&report.run), "payout_summary_until_2025-05-31");
    }

    #[test]
    fn test_render_all_collects_written_paths() {
        let mut console = MockReportSink::new();
        console.expect_name().return_const("console");
        console.expect_render().times(1).returning(|_| Ok(None));

        let mut json = MockReportSink::new();
        json.expect_name().return_const("json");
        json.expect_render()
            .times(1)
            .returning(|_| Ok(Some(PathBuf::from("out/report.json"))));

        let sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(console), Box::new(json)];
        let written = render_all(&sinks, &sample_report()).unwrap();

        assert_eq!(written, vec![PathBuf::from("out/report.json")]);
    }

    #[test]
    fn test_render_all_stops_on_failure() {
        let mut failing = MockReportSink::new();
        failing.expect_name().return_const("html");
        failing
            .expect_render()
            .times(1)
            .returning(|_| Err(ReportError::Sink("disk full".to_string())));

        let mut never = MockReportSink::new();
        never.expect_name().return_const("json");
        never.expect_render().times(0);

        let sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(failing), Box::new(never)];
        assert!(matches!(
            render_all(&sinks, &sample_report()),
            Err(ReportError::Sink(_))
        ));
    }

    #[test]
    fn test_build_sinks_order() {
        let sinks = build_sinks(
            &[OutputFormat::Json, OutputFormat::Console, OutputFormat::Html],
            Path::new("out"),
            "stem",
            false,
        );
        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["json", "console", "html"]);
    }
}
