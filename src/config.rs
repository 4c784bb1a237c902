use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::engine::Milestone;

const DEFAULT_CONFIG_PATH: &str = "config/default";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Rules for one report run
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    /// Stage statuses that are never reported, regardless of dates
    pub exclusion_statuses: Vec<String>,
    pub window: WindowConfig,
    pub fields: FieldMap,
    pub fixed_split: FixedSplitConfig,
    pub categories: Vec<CategoryConfig>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Payout summary".to_string(),
            exclusion_statuses: [
                "01 - Initial Scoping",
                "03 - Design & Permitting",
                "00 - Reassigned",
                "02 - Pending Task Order",
                "00 - Assigned Offline",
                "16 - Inactive",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            window: WindowConfig::default(),
            fields: FieldMap::default(),
            fixed_split: FixedSplitConfig::default(),
            categories: vec![
                CategoryConfig::new("relocation", PolicyKind::FixedSplit),
                CategoryConfig::new("repair", PolicyKind::FixedSplit),
                CategoryConfig::new("reconstruction", PolicyKind::RealPayment),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WindowStyle {
    ClosedInterval,
    ExclusiveMonth,
}

/// Raw reporting window settings, validated into a
/// [`ReportingWindow`](crate::engine::ReportingWindow) before use
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WindowConfig {
    pub style: WindowStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// `YYYY-MM`, dates must fall in an earlier month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_bound: Option<String>,
}

impl WindowConfig {
    pub fn closed_interval(start: &str, end: &str) -> Self {
        Self {
            style: WindowStyle::ClosedInterval,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            month_bound: None,
        }
    }

    pub fn exclusive_month(bound: &str) -> Self {
        Self {
            style: WindowStyle::ExclusiveMonth,
            start: None,
            end: None,
            month_bound: Some(bound.to_string()),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::closed_interval("2024-10-23", "2025-05-31")
    }
}

/// Source column names for every logical field the engine reads
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FieldMap {
    pub case_id: String,
    pub award_type: String,
    pub stage_status: String,
    pub ntp_date: String,
    pub structure_date: String,
    pub final_date: String,
    /// Read when the primary final date is missing or unparseable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_date_fallback: Option<String>,
    pub ntp_payment: String,
    pub structure_payment: String,
    pub final_payment: String,
}

impl FieldMap {
    pub fn date_field(&self, milestone: Milestone) -> &str {
        match milestone {
            Milestone::Ntp => &self.ntp_date,
            Milestone::Structure => &self.structure_date,
            Milestone::Final => &self.final_date,
        }
    }

    pub fn payment_field(&self, milestone: Milestone) -> &str {
        match milestone {
            Milestone::Ntp => &self.ntp_payment,
            Milestone::Structure => &self.structure_payment,
            Milestone::Final => &self.final_payment,
        }
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            case_id: "Case ID".to_string(),
            award_type: "Award Type Equivalent".to_string(),
            stage_status: "Stage Status".to_string(),
            ntp_date: "Date of Notice to Proceed".to_string(),
            structure_date: "Structure Inspection Passed".to_string(),
            final_date: "Final Inspection Passed".to_string(),
            final_date_fallback: Some("Relo or Repair Final Inspection Passed".to_string()),
            ntp_payment: "Payment Notice to Proceed".to_string(),
            structure_payment: "Payment Structure".to_string(),
            final_payment: "Payment Final".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FixedSplitConfig {
    pub base: f64,
    /// Keyed by milestone name; milestones missing here are not paid under
    /// the fixed split
    pub weights: BTreeMap<String, f64>,
}

impl Default for FixedSplitConfig {
    fn default() -> Self {
        Self {
            base: 65000.0,
            weights: BTreeMap::from([
                ("ntp".to_string(), 0.5),
                ("structure".to_string(), 0.5),
                ("final".to_string(), 0.0),
            ]),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    FixedSplit,
    RealPayment,
}

/// Maps a raw award type (case-insensitive) to its payment policy
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CategoryConfig {
    pub name: String,
    pub policy: PolicyKind,
}

impl CategoryConfig {
    pub fn new(name: &str, policy: PolicyKind) -> Self {
        Self {
            name: name.to_string(),
            policy,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// Snapshot file; may be supplied on the command line instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Html,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub formats: Vec<OutputFormat>,
    /// Defaults to `payout_summary_<window tag>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_stem: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "out".to_string(),
            formats: vec![OutputFormat::Console, OutputFormat::Html, OutputFormat::Json],
            file_stem: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "payout_history.db".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file layered with `PAYOUT__*` environment variables.
    ///
    /// Without an explicit path the default file is optional and built-in
    /// defaults fill every missing section.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let file = match path {
            Some(p) => config::File::with_name(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("PAYOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        debug!("Loaded configuration: {:?}", loaded);
        Ok(loaded)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dated_window_variant() {
        let config = Config::default();
        let split = &config.report.fixed_split;

        assert_eq!(split.base, 65000.0);
        assert_eq!(split.weights.get("ntp"), Some(&0.5));
        assert_eq!(split.weights.get("structure"), Some(&0.5));
        assert_eq!(split.weights.get("final"), Some(&0.0));
        assert_eq!(config.report.window.style, WindowStyle::ClosedInterval);
        assert_eq!(config.report.exclusion_statuses.len(), 6);
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = Config::from_toml_str(
            r#"
            [report]
            title = "Monthly"

            [report.window]
            style = "exclusive-month"
            month_bound = "2025-06"

            [report.fixed_split]
            base = 65000

            [report.fixed_split.weights]
            ntp = 0.5
            final = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.report.title, "Monthly");
        assert_eq!(config.report.window, WindowConfig::exclusive_month("2025-06"));
        assert_eq!(config.report.fixed_split.base, 65000.0);
        assert_eq!(config.report.fixed_split.weights.len(), 2);
        assert!(!config.report.fixed_split.weights.contains_key("structure"));
        // untouched sections keep their defaults
        assert_eq!(config.report.fields, FieldMap::default());
        assert_eq!(config.database.path, "payout_history.db");
    }

    #[test]
    fn test_categories_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [[report.categories]]
            name = "Relocation"
            policy = "fixed-split"

            [[report.categories]]
            name = "reconstruction"
            policy = "real-payment"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.report.categories,
            vec![
                CategoryConfig::new("Relocation", PolicyKind::FixedSplit),
                CategoryConfig::new("reconstruction", PolicyKind::RealPayment),
            ]
        );
    }

    #[test]
    fn test_unknown_policy_name_rejected() {
        let result = Config::from_toml_str(
            r#"
            [[report.categories]]
            name = "elevation"
            policy = "bogus"
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_to_toml_roundtrips_through_loader() {
        let text = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();

        assert_eq!(parsed.report.fields, FieldMap::default());
        assert_eq!(parsed.report.window, WindowConfig::default());
    }
}
