use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

/// One cell as delivered by a sheet source.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_populated(&self) -> bool {
        match self {
            CellValue::Text(text) => !text.trim().is_empty(),
            CellValue::Number(_) => true,
            CellValue::Empty => false,
        }
    }
}

/// Header row followed by data rows, exactly as fetched.
pub type SheetTable = Vec<Vec<CellValue>>;

/// Sheet name to table, one entry per requested range.
pub type SheetBatch = BTreeMap<String, SheetTable>;

pub type RawRow = HashMap<String, CellValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Pending,
    Overdue,
    Unrecognized,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "completed" => TaskStatus::Completed,
            "pending" => TaskStatus::Pending,
            "overdue" => TaskStatus::Overdue,
            _ => TaskStatus::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub performer: Option<String>,
    pub status: TaskStatus,
    pub revisions: u32,
    pub revision_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodAggregate {
    pub completed: u32,
    pub revisions: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformerRecord {
    pub completed: u32,
    pub revisions: u32,
    pub overdue: u32,
    pub last_completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPerformer {
    pub id: String,
    pub name: String,
    pub score: i64,
    pub completed: u32,
    pub revisions: u32,
    pub overdue: u32,
    pub last_completion_date: Option<NaiveDate>,
    pub profile_pic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VelocityLabel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for VelocityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VelocityLabel::Low => "Low",
            VelocityLabel::Medium => "Medium",
            VelocityLabel::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSnapshot {
    pub velocity_change_percent: i64,
    pub quality_score: f64,
    pub velocity_label: VelocityLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub month_name: String,
    pub total_tasks: u32,
    pub completed: u32,
    pub revisions: u32,
    pub overdue: u32,
    pub completion_percentage: u32,
    pub days_into_month: u32,
}

/// Combined result of one pipeline pass. This is what the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub performers: Vec<RankedPerformer>,
    pub stats: PeriodStats,
    pub trend: TrendSnapshot,
}

impl Leaderboard {
    pub fn leader(&self) -> Option<&RankedPerformer> {
        self.performers.first()
    }
}

/// Raised once when the top-ranked performer differs from the previous computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderChange {
    pub id: Uuid,
    pub previous: String,
    pub current: String,
    pub detected_at: NaiveDateTime,
}

/// Wire shape handed to the serving layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse<'a> {
    pub performers: &'a [RankedPerformer],
    pub stats: &'a PeriodStats,
    pub trend: &'a TrendSnapshot,
    pub leader_changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(TaskStatus::parse("Completed"), TaskStatus::Completed);
        assert_eq!(TaskStatus::parse(" PENDING "), TaskStatus::Pending);
        assert_eq!(TaskStatus::parse("overdue"), TaskStatus::Overdue);
        assert_eq!(TaskStatus::parse("in review"), TaskStatus::Unrecognized);
        assert_eq!(TaskStatus::parse(""), TaskStatus::Unrecognized);
    }

    #[test]
    fn populated_cells_ignore_blank_text() {
        assert!(CellValue::Text("x".to_string()).is_populated());
        assert!(CellValue::Number(0.0).is_populated());
        assert!(!CellValue::Text("   ".to_string()).is_populated());
        assert!(!CellValue::Empty.is_populated());
    }
}
