use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{CellValue, SheetBatch, SheetTable};

/// Fetches named ranges from a spreadsheet.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch(&self, ranges: &[String]) -> Result<SheetBatch, FetchError>;
}

/// Picks a source for `path`: `.json` files are batch exports, anything else
/// is treated as a directory of per-sheet CSV files.
pub fn open_source(path: &Path) -> Arc<dyn SheetSource> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Arc::new(JsonBatchSource::new(path))
    } else {
        Arc::new(CsvDirSource::new(path))
    }
}

/// Sheet name part of an A1 range such as `'Master'!A1:H50`.
pub fn sheet_name(range: &str) -> String {
    range
        .split('!')
        .next()
        .unwrap_or(range)
        .replace('\'', "")
        .trim()
        .to_string()
}

fn io_error(path: &Path, err: std::io::Error) -> FetchError {
    let detail = format!("{}: {err}", path.display());
    match err.kind() {
        std::io::ErrorKind::NotFound => FetchError::NotFound(detail),
        std::io::ErrorKind::PermissionDenied => FetchError::Auth(detail),
        _ => FetchError::Network(detail),
    }
}

fn text_cell(raw: &str) -> CellValue {
    if raw.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(raw.to_string())
    }
}

pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_sheet(&self, name: &str) -> Result<SheetTable, FetchError> {
        let path = self.dir.join(format!("{name}.csv"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(sheet = name, "no csv file for sheet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(io_error(&path, err)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut table = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|err| FetchError::Malformed(format!("{}: {err}", path.display())))?;
            table.push(record.iter().map(text_cell).collect());
        }
        Ok(table)
    }
}

#[async_trait]
impl SheetSource for CsvDirSource {
    async fn fetch(&self, ranges: &[String]) -> Result<SheetBatch, FetchError> {
        let metadata = tokio::fs::metadata(&self.dir)
            .await
            .map_err(|err| io_error(&self.dir, err))?;
        if !metadata.is_dir() {
            return Err(FetchError::NotFound(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        let mut batch = SheetBatch::new();
        for range in ranges {
            let name = sheet_name(range);
            let table = self.read_sheet(&name).await?;
            batch.insert(name, table);
        }
        Ok(batch)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchExport {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Deserialize)]
struct ValueRange {
    range: String,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn json_cell(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Empty,
        serde_json::Value::String(text) => text_cell(text),
        serde_json::Value::Number(number) => number
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or(CellValue::Empty),
        other => CellValue::Text(other.to_string()),
    }
}

/// Reads a saved `spreadsheets.values.batchGet` response.
pub struct JsonBatchSource {
    path: PathBuf,
}

impl JsonBatchSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SheetSource for JsonBatchSource {
    async fn fetch(&self, ranges: &[String]) -> Result<SheetBatch, FetchError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| io_error(&self.path, err))?;
        let export: BatchExport = serde_json::from_str(&raw)
            .map_err(|err| FetchError::Malformed(format!("{}: {err}", self.path.display())))?;

        let wanted: Vec<String> = ranges.iter().map(|range| sheet_name(range)).collect();
        let mut batch = SheetBatch::new();
        for value_range in export.value_ranges {
            let name = sheet_name(&value_range.range);
            if !wanted.contains(&name) {
                continue;
            }
            let table = value_range
                .values
                .iter()
                .map(|row| row.iter().map(json_cell).collect())
                .collect();
            batch.insert(name, table);
        }
        Ok(batch)
    }
}
