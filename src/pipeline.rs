use chrono::NaiveDate;
use tracing::info;

use crate::{
    config::{Config, ReportConfig},
    engine::{CaseOutcome, MonthBound, PayoutEngine, ReportingWindow},
    error::{ReportError, Result},
    report::Report,
    source::{resolve_records, CaseRecord, SnapshotSource},
};

/// Per-run window chosen on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowOverride {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub before_month: Option<String>,
}

impl WindowOverride {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.before_month.is_none()
    }
}

/// Pick the run's window: an override replaces the configured one entirely
pub fn resolve_window(report: &ReportConfig, overrides: &WindowOverride) -> Result<ReportingWindow> {
    if overrides.is_empty() {
        return ReportingWindow::try_from(&report.window);
    }

    match (overrides.start, overrides.end, overrides.before_month.as_deref()) {
        (Some(start), Some(end), None) => ReportingWindow::closed_interval(start, end),
        (None, None, Some(month)) => Ok(ReportingWindow::exclusive_month(MonthBound::parse(month)?)),
        _ => Err(ReportError::Config(
            "use either --start with --end, or --before-month, but not both".to_string(),
        )),
    }
}

/// Snapshot path from the command line, falling back to the configuration
pub fn resolve_source(config: &Config, cli_path: Option<&str>) -> Result<SnapshotSource> {
    cli_path
        .or(config.source.path.as_deref())
        .map(SnapshotSource::new)
        .ok_or_else(|| {
            ReportError::Config("no snapshot given: pass --source or set source.path".to_string())
        })
}

/// Load a snapshot and resolve its rows through the configured field map
pub async fn load_records(source: &SnapshotSource, report: &ReportConfig) -> Result<Vec<CaseRecord>> {
    let rows = source.load().await?;
    Ok(resolve_records(&rows, &report.fields))
}

/// Fetch, compute and wrap one report
pub async fn generate_report(
    report: &ReportConfig,
    window: ReportingWindow,
    source: &SnapshotSource,
    generated_on: NaiveDate,
) -> Result<Report> {
    let engine = PayoutEngine::with_window(report, window)?;
    let records = load_records(source, report).await?;
    let run = engine.run(&records);

    info!(
        "Report '{}' has {} cases totalling {:.2}",
        report.title,
        run.cases.len(),
        run.totals.total
    );

    Ok(Report::new(report.title.clone(), generated_on, run))
}

/// Every record in the snapshot whose case id matches, with its outcome
pub fn explain_case(
    engine: &PayoutEngine,
    records: &[CaseRecord],
    case_id: &str,
) -> Result<Vec<(CaseRecord, CaseOutcome)>> {
    let matches: Vec<(CaseRecord, CaseOutcome)> = records
        .iter()
        .filter(|record| record.case_id() == case_id.trim())
        .map(|record| (record.clone(), engine.evaluate(record)))
        .collect();

    if matches.is_empty() {
        return Err(ReportError::CaseNotFound(case_id.to_string()));
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_window_defaults_to_config() {
        let report = ReportConfig {
            window: WindowConfig::exclusive_month("2025-06"),
            ..ReportConfig::default()
        };

        let window = resolve_window(&report, &WindowOverride::default()).unwrap();
        assert_eq!(window.to_string(), "before 2025-06");
    }

    #[test]
    fn test_resolve_window_override_replaces_style() {
        let overrides = WindowOverride {
            start: Some(date(2025, 1, 1)),
            end: Some(date(2025, 3, 31)),
            before_month: None,
        };

        let window = resolve_window(&ReportConfig::default(), &overrides).unwrap();
        assert_eq!(
            window,
            ReportingWindow::closed_interval(date(2025, 1, 1), date(2025, 3, 31)).unwrap()
        );

        let overrides = WindowOverride {
            before_month: Some("2025-04".to_string()),
            ..WindowOverride::default()
        };
        let window = resolve_window(&ReportConfig::default(), &overrides).unwrap();
        assert_eq!(window.tag(), "before_2025-04");
    }

    #[test]
    fn test_resolve_window_rejects_mixed_overrides() {
        let overrides = WindowOverride {
            start: Some(date(2025, 1, 1)),
            end: None,
            before_month: Some("2025-04".to_string()),
        };
        assert!(matches!(
            resolve_window(&ReportConfig::default(), &overrides),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_source() {
        let mut config = Config::default();
        assert!(resolve_source(&config, None).is_err());

        config.source.path = Some("from_config.json".to_string());
        assert_eq!(
            resolve_source(&config, None).unwrap().path().to_str(),
            Some("from_config.json")
        );
        assert_eq!(
            resolve_source(&config, Some("cli.json")).unwrap().path().to_str(),
            Some("cli.json")
        );
    }
}
