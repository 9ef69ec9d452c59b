use crate::models::{CellValue, RawRow, SheetTable, TaskRecord, TaskStatus};
use crate::period::parse_sheet_date;

pub const NAME_KEY: &str = "name";
pub const STATUS_KEY: &str = "status";
pub const REVISIONS_KEY: &str = "totalrevisions";
pub const REVISION_DATE_KEY: &str = "latestrevision";

/// Lower-cases a header and keeps only `[a-z0-9_]`. Non-text or blank
/// headers fall back to `column_<index>`.
pub fn header_key(cell: Option<&CellValue>, index: usize) -> String {
    let sanitized: String = cell
        .and_then(CellValue::as_text)
        .map(|text| {
            text.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
                .collect()
        })
        .unwrap_or_default();

    if sanitized.is_empty() {
        format!("column_{index}")
    } else {
        sanitized
    }
}

pub fn normalize_sheet(table: &SheetTable) -> Vec<RawRow> {
    let Some((header, data)) = table.split_first() else {
        return Vec::new();
    };

    let keys: Vec<String> = (0..header.len())
        .map(|index| header_key(header.get(index), index))
        .collect();

    data.iter()
        .filter_map(|row| {
            let mut mapped = RawRow::with_capacity(keys.len());
            for (index, key) in keys.iter().enumerate() {
                let value = row.get(index).cloned().unwrap_or(CellValue::Empty);
                mapped.insert(key.clone(), value);
            }

            mapped
                .values()
                .any(CellValue::is_populated)
                .then_some(mapped)
        })
        .collect()
}

/// Leading decimal digits of the trimmed text; anything else counts as zero.
pub fn parse_revision_count(cell: Option<&CellValue>) -> u32 {
    match cell {
        Some(CellValue::Number(value)) if value.is_finite() && *value >= 0.0 => {
            value.trunc().min(u32::MAX as f64) as u32
        }
        Some(CellValue::Text(text)) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

pub fn task_from_row(row: &RawRow) -> TaskRecord {
    let performer = row
        .get(NAME_KEY)
        .and_then(CellValue::as_text)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string);

    let status = row
        .get(STATUS_KEY)
        .and_then(CellValue::as_text)
        .map(TaskStatus::parse)
        .unwrap_or(TaskStatus::Unrecognized);

    let revision_date = row
        .get(REVISION_DATE_KEY)
        .and_then(CellValue::as_text)
        .and_then(parse_sheet_date);

    TaskRecord {
        performer,
        status,
        revisions: parse_revision_count(row.get(REVISIONS_KEY)),
        revision_date,
    }
}
