use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime, NaiveTime};

use crate::models::{
    PerformerRecord, PeriodAggregate, PeriodStats, RankedPerformer, TaskRecord, TaskStatus,
};

const COMPLETED_POINTS: i64 = 10;
const REVISION_PENALTY: i64 = 1;
const OVERDUE_PENALTY: i64 = 2;

/// Text before the first separator, trimmed. Blank keys are rejected.
pub fn canonical_key(name: &str, separator: &str) -> Option<String> {
    let prefix = if separator.is_empty() {
        name
    } else {
        name.split(separator).next().unwrap_or(name)
    };
    let key = prefix.trim();
    (!key.is_empty()).then(|| key.to_string())
}

pub fn score(record: &PerformerRecord) -> i64 {
    i64::from(record.completed) * COMPLETED_POINTS
        - i64::from(record.revisions) * REVISION_PENALTY
        - i64::from(record.overdue) * OVERDUE_PENALTY
}

pub fn aggregate_period(tasks: &[TaskRecord]) -> PeriodAggregate {
    tasks.iter().fold(PeriodAggregate::default(), |mut acc, task| {
        if task.status == TaskStatus::Completed {
            acc.completed += 1;
        }
        acc.revisions = acc.revisions.saturating_add(task.revisions);
        acc
    })
}

/// Folds current-period tasks into per-performer records, keeping the order
/// in which performers first appear.
pub fn accumulate_performers(
    tasks: &[TaskRecord],
    now: NaiveDateTime,
    separator: &str,
) -> Vec<(String, PerformerRecord)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<(String, PerformerRecord)> = Vec::new();

    for task in tasks {
        let Some(key) = task
            .performer
            .as_deref()
            .and_then(|name| canonical_key(name, separator))
        else {
            continue;
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            records.push((key, PerformerRecord::default()));
            records.len() - 1
        });
        let entry = &mut records[slot].1;

        entry.revisions = entry.revisions.saturating_add(task.revisions);
        match task.status {
            TaskStatus::Completed => {
                entry.completed += 1;
                if task.revision_date > entry.last_completion_date {
                    entry.last_completion_date = task.revision_date;
                }
            }
            TaskStatus::Pending => {
                let past_due = task
                    .revision_date
                    .is_some_and(|date| date.and_time(NaiveTime::MIN) < now);
                if past_due {
                    entry.overdue += 1;
                }
            }
            TaskStatus::Overdue => entry.overdue += 1,
            TaskStatus::Unrecognized => {}
        }
    }

    records
}

pub fn rank_order(a: &RankedPerformer, b: &RankedPerformer) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| match (a.last_completion_date, b.last_completion_date) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn rank_performers(
    tasks: &[TaskRecord],
    now: NaiveDateTime,
    separator: &str,
) -> Vec<RankedPerformer> {
    let mut ranked: Vec<RankedPerformer> = accumulate_performers(tasks, now, separator)
        .into_iter()
        .map(|(key, record)| RankedPerformer {
            score: score(&record),
            profile_pic: avatar_url(&key),
            id: key.clone(),
            name: key,
            completed: record.completed,
            revisions: record.revisions,
            overdue: record.overdue,
            last_completion_date: record.last_completion_date,
        })
        .collect();

    // sort_by is stable, so equal entries keep first-appearance order
    ranked.sort_by(rank_order);
    ranked
}

pub fn period_stats(
    current: &PeriodAggregate,
    total_tasks: usize,
    performers: &[RankedPerformer],
    now: NaiveDateTime,
) -> PeriodStats {
    let completion_percentage = if total_tasks == 0 {
        0
    } else {
        round_half_up(f64::from(current.completed) / total_tasks as f64 * 100.0).clamp(0, 100)
            as u32
    };

    PeriodStats {
        month_name: now.format("%B").to_string(),
        total_tasks: u32::try_from(total_tasks).unwrap_or(u32::MAX),
        completed: current.completed,
        revisions: current.revisions,
        overdue: performers.iter().map(|p| p.overdue).sum(),
        completion_percentage,
        days_into_month: now.day(),
    }
}

pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn avatar_url(key: &str) -> String {
    let seed: String = key.chars().filter(|c| !c.is_whitespace()).collect();
    format!("https://i.pravatar.cc/40?u={seed}")
}
