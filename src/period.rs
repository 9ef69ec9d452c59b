use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::models::TaskRecord;

/// Parses `d/m/yyyy`, optionally followed by a whitespace-separated time that
/// is ignored. Out-of-range day or month values roll over into neighbouring
/// months (31/02 is 3 March); any other shape yields `None`.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let token = raw.split_whitespace().next()?;
    let mut parts = token.split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let numeric = |part: &str, min: usize, max: usize| {
        (part.len() >= min && part.len() <= max && part.bytes().all(|b| b.is_ascii_digit()))
            .then(|| part.parse::<u32>().ok())
            .flatten()
    };

    let day = numeric(day, 1, 2)?;
    let month = numeric(month, 1, 2)?;
    let year = numeric(year, 4, 4)?;
    rolled_date(year as i32, month as i32, day as i64)
}

/// Day `day` of month `month`, carrying overflow in either direction.
fn rolled_date(year: i32, month: i32, day: i64) -> Option<NaiveDate> {
    let month_index = month - 1;
    let first = NaiveDate::from_ymd_opt(
        year + month_index.div_euclid(12),
        month_index.rem_euclid(12) as u32 + 1,
        1,
    )?;
    first.checked_add_signed(Duration::days(day - 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn preceding(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PeriodBuckets {
    pub current: Vec<TaskRecord>,
    pub previous: Vec<TaskRecord>,
}

pub fn classify_tasks<I>(tasks: I, now: NaiveDateTime) -> PeriodBuckets
where
    I: IntoIterator<Item = TaskRecord>,
{
    let current_month = MonthKey::of(now.date());
    let previous_month = current_month.preceding();
    let mut buckets = PeriodBuckets::default();

    for task in tasks {
        let Some(date) = task.revision_date else {
            continue;
        };
        let month = MonthKey::of(date);
        if month == current_month {
            buckets.current.push(task);
        } else if month == previous_month {
            buckets.previous.push(task);
        }
    }

    buckets
}
