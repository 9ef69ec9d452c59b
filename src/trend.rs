use crate::models::{PeriodAggregate, TrendSnapshot, VelocityLabel};
use crate::scoring::round_half_up;

pub fn quality_score(current: &PeriodAggregate) -> f64 {
    if current.completed == 0 {
        return 0.0;
    }
    let completed = f64::from(current.completed);
    let raw = (completed - f64::from(current.revisions)) / completed * 10.0;
    // halves round away from zero so negative scores mirror positive ones
    raw.signum() * round_half_up(raw.abs() * 10.0) as f64 / 10.0
}

pub fn velocity_change_percent(current: &PeriodAggregate, previous: &PeriodAggregate) -> i64 {
    match (previous.completed, current.completed) {
        (0, 0) => 0,
        (0, _) => 100,
        (before, now) => {
            let before = f64::from(before);
            round_half_up((f64::from(now) - before) / before * 100.0)
        }
    }
}

pub fn velocity_label(completed: u32) -> VelocityLabel {
    match completed {
        21.. => VelocityLabel::High,
        11..=20 => VelocityLabel::Medium,
        _ => VelocityLabel::Low,
    }
}

pub fn compute_trend(current: &PeriodAggregate, previous: &PeriodAggregate) -> TrendSnapshot {
    TrendSnapshot {
        velocity_change_percent: velocity_change_percent(current, previous),
        quality_score: quality_score(current),
        velocity_label: velocity_label(current.completed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(completed: u32, revisions: u32) -> PeriodAggregate {
        PeriodAggregate {
            completed,
            revisions,
        }
    }

    #[test]
    fn quality_score_rounds_to_one_decimal() {
        assert_eq!(quality_score(&aggregate(3, 1)), 6.7);
        assert_eq!(quality_score(&aggregate(4, 0)), 10.0);
        assert_eq!(quality_score(&aggregate(2, 5)), -15.0);
        assert_eq!(quality_score(&aggregate(0, 7)), 0.0);
    }

    #[test]
    fn negative_quality_halves_round_away_from_zero() {
        assert_eq!(quality_score(&aggregate(8, 9)), -1.3);
        assert_eq!(quality_score(&aggregate(8, 7)), 1.3);
        assert_eq!(quality_score(&aggregate(4, 4)), 0.0);
    }

    #[test]
    fn velocity_handles_zero_previous_period() {
        assert_eq!(velocity_change_percent(&aggregate(5, 0), &aggregate(0, 0)), 100);
        assert_eq!(velocity_change_percent(&aggregate(0, 0), &aggregate(0, 3)), 0);
    }

    #[test]
    fn velocity_change_is_relative_to_previous() {
        assert_eq!(velocity_change_percent(&aggregate(15, 0), &aggregate(10, 0)), 50);
        assert_eq!(velocity_change_percent(&aggregate(2, 0), &aggregate(3, 0)), -33);
        assert_eq!(velocity_change_percent(&aggregate(0, 0), &aggregate(4, 0)), -100);
    }

    #[test]
    fn labels_follow_completed_thresholds() {
        assert_eq!(velocity_label(0), VelocityLabel::Low);
        assert_eq!(velocity_label(10), VelocityLabel::Low);
        assert_eq!(velocity_label(11), VelocityLabel::Medium);
        assert_eq!(velocity_label(20), VelocityLabel::Medium);
        assert_eq!(velocity_label(21), VelocityLabel::High);
    }

    #[test]
    fn trend_combines_all_metrics() {
        let trend = compute_trend(&aggregate(12, 3), &aggregate(8, 1));
        assert_eq!(trend.velocity_change_percent, 50);
        assert_eq!(trend.quality_score, 7.5);
        assert_eq!(trend.velocity_label, VelocityLabel::Medium);
    }
}
