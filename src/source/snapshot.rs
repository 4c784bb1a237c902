use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{
    error::{ReportError, Result},
    source::{
        cell::CellValue,
        record::{normalize_title, RawRow},
    },
};

/// Sheet export shape: column definitions plus rows of cells keyed by column id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSnapshot {
    pub columns: Vec<SheetColumn>,
    #[serde(default)]
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Deserialize)]
pub struct SheetColumn {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetRow {
    #[serde(default)]
    pub cells: Vec<SheetCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetCell {
    pub column_id: i64,
    #[serde(default)]
    pub value: Value,
}

impl SheetSnapshot {
    /// Flatten rows into title-keyed maps, dropping cells of unknown columns.
    ///
    /// Columns whose normalized titles repeat share one key; the cell listed
    /// last in the row wins.
    pub fn into_rows(self) -> Vec<RawRow> {
        let titles = column_titles(self.columns);

        self.rows
            .into_iter()
            .map(|row| {
                row.cells
                    .iter()
                    .filter_map(|cell| {
                        let title = titles.get(&cell.column_id)?;
                        Some((title.clone(), CellValue::from(&cell.value)))
                    })
                    .collect()
            })
            .collect()
    }
}

fn column_titles(columns: Vec<SheetColumn>) -> HashMap<i64, String> {
    let mut seen = HashSet::new();
    let mut titles = HashMap::with_capacity(columns.len());

    for column in columns {
        let title = normalize_title(&column.title);
        if !seen.insert(title.clone()) {
            warn!(
                "Column {} repeats title '{}'; only one of their cells is kept per row",
                column.id, title
            );
        }
        titles.insert(column.id, title);
    }

    titles
}

/// Parse snapshot text in either the sheet-export shape or a flat array of row objects
pub fn parse_snapshot(text: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ReportError::Source(format!("snapshot is not valid JSON: {}", e)))?;

    let is_sheet_export = value
        .as_object()
        .map_or(false, |map| map.contains_key("columns"));

    if is_sheet_export {
        let sheet: SheetSnapshot = serde_json::from_value(value)
            .map_err(|e| ReportError::Source(format!("malformed sheet export: {}", e)))?;
        debug!(
            "Sheet export with {} columns and {} rows",
            sheet.columns.len(),
            sheet.rows.len()
        );
        return Ok(sheet.into_rows());
    }

    match value {
        Value::Array(items) => {
            let mut rows = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Object(fields) => rows.push(
                        fields
                            .iter()
                            .map(|(k, v)| (normalize_title(k), CellValue::from(v)))
                            .collect(),
                    ),
                    _ => {
                        return Err(ReportError::Source(format!(
                            "row {} is not an object",
                            i + 1
                        )))
                    }
                }
            }
            Ok(rows)
        }
        _ => Err(ReportError::Source(
            "expected a sheet export object or an array of rows".to_string(),
        )),
    }
}

/// Reads one snapshot per run from a file on disk
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full snapshot
    pub async fn load(&self) -> Result<Vec<RawRow>> {
        info!("Loading snapshot from {}", self.path.display());

        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ReportError::Source(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let rows = parse_snapshot(&text)?;
        if rows.is_empty() {
            warn!("Snapshot {} contains no rows", self.path.display());
        }

        info!("Loaded {} rows", rows.len());
        Ok(rows)
    }
}
