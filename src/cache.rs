use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::models::Leaderboard;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<Leaderboard>,
    pub computed_at: NaiveDateTime,
}

impl CacheEntry {
    pub fn new(payload: Leaderboard, computed_at: NaiveDateTime) -> Self {
        Self {
            payload: Arc::new(payload),
            computed_at,
        }
    }

    /// Fresh while `now - computed_at` is below the window. A clock that
    /// moved backwards still counts as fresh.
    pub fn is_fresh(&self, now: NaiveDateTime, window: Duration) -> bool {
        let age = now.signed_duration_since(self.computed_at);
        match chrono::Duration::from_std(window) {
            Ok(window) => age < window,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeriodStats, TrendSnapshot, VelocityLabel};
    use chrono::NaiveDate;

    fn empty_board() -> Leaderboard {
        Leaderboard {
            performers: Vec::new(),
            stats: PeriodStats {
                month_name: "June".to_string(),
                total_tasks: 0,
                completed: 0,
                revisions: 0,
                overdue: 0,
                completion_percentage: 0,
                days_into_month: 15,
            },
            trend: TrendSnapshot {
                velocity_change_percent: 0,
                quality_score: 0.0,
                velocity_label: VelocityLabel::Low,
            },
        }
    }

    fn at(minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(10, minute, second)
            .unwrap()
    }

    #[test]
    fn fresh_until_window_elapses() {
        let entry = CacheEntry::new(empty_board(), at(0, 0));
        let window = Duration::from_secs(300);

        assert!(entry.is_fresh(at(0, 0), window));
        assert!(entry.is_fresh(at(4, 59), window));
        assert!(!entry.is_fresh(at(5, 0), window));
        assert!(!entry.is_fresh(at(30, 0), window));
    }

    #[test]
    fn zero_window_is_always_stale() {
        let entry = CacheEntry::new(empty_board(), at(0, 0));
        assert!(!entry.is_fresh(at(0, 0), Duration::ZERO));
    }
}
