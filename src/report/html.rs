use std::fmt::Write as _;
use std::path::PathBuf;

use crate::{
    error::{ReportError, Result},
    report::{ensure_parent, Report, ReportSink, COLUMNS},
    utils::{escape_html, format_money},
};

/// Writes the report as a plain HTML table document
pub struct HtmlSink {
    path: PathBuf,
}

impl HtmlSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Build the document text
    pub fn document(report: &Report) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
        let _ = write!(html, "<title>{}</title>", escape_html(&report.title));
        html.push_str("</head><body>\n");
        let _ = writeln!(html, "<h1>{}</h1>", escape_html(&report.heading()));
        let _ = writeln!(html, "<p>Generated {}</p>", report.generated_on.format("%Y-%m-%d"));

        html.push_str("<table>\n<thead><tr>");
        for column in COLUMNS {
            let _ = write!(html, "<th>{}</th>", escape_html(column));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        for row in report.rows() {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&row.case_id),
                escape_html(&row.category),
                row.ntp_date,
                format_money(row.ntp_amount),
                row.structure_date,
                format_money(row.structure_amount),
                row.final_date,
                format_money(row.final_amount),
                format_money(row.total),
            );
        }

        let totals = report.totals();
        let _ = writeln!(
            html,
            "</tbody>\n<tfoot><tr><td colspan=\"3\"><strong>Totals:</strong></td>\
             <td><strong>{}</strong></td><td></td>\
             <td><strong>{}</strong></td><td></td>\
             <td><strong>{}</strong></td>\
             <td><strong>{}</strong></td></tr></tfoot>",
            format_money(totals.ntp),
            format_money(totals.structure),
            format_money(totals.final_amount),
            format_money(totals.total),
        );
        html.push_str("</table>\n</body></html>\n");

        html
    }
}

impl ReportSink for HtmlSink {
    fn name(&self) -> &'static str {
        "html"
    }

    fn render(&self, report: &Report) -> Result<Option<PathBuf>> {
        let html = Self::document(report);

        ensure_parent(&self.path)?;
        std::fs::write(&self.path, html).map_err(|e| {
            ReportError::Sink(format!("cannot write {}: {}", self.path.display(), e))
        })?;

        Ok(Some(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;

    #[test]
    fn test_document_contains_rows_and_totals() {
        let html = HtmlSink::document(&sample_report());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<th>Structure $</th>"));
        assert!(html.contains("<td>R-100</td><td>Relocation</td><td>2024-11-05</td><td>$32,500.00</td>"));
        assert!(html.contains("<td>$65,000.00</td></tr>"));
        assert!(html.contains("<td><strong>$69,100.75</strong></td></tr></tfoot>"));
        assert!(html.contains("— 2 cases</h1>"));
    }

    #[test]
    fn test_document_escapes_text() {
        let html = HtmlSink::document(&sample_report());

        assert!(html.contains("<td>&lt;C&amp;7&gt;</td>"));
        assert!(!html.contains("<C&7>"));
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.html");

        let written = HtmlSink::new(path.clone()).render(&sample_report()).unwrap();

        assert_eq!(written, Some(path.clone()));
        assert!(std::fs::read_to_string(path).unwrap().contains("<tfoot>"));
    }
}
