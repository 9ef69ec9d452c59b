use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::models::{Leaderboard, RankedPerformer};

pub fn needs_attention(performers: &[RankedPerformer]) -> Vec<&RankedPerformer> {
    let mut flagged: Vec<&RankedPerformer> =
        performers.iter().filter(|p| p.overdue > 0).collect();
    flagged.sort_by(|a, b| b.overdue.cmp(&a.overdue));
    flagged
}

pub fn format_standing(rank: usize, performer: &RankedPerformer) -> String {
    format!(
        "{}. {} score {} ({} completed, {} revisions, {} overdue)",
        rank, performer.name, performer.score, performer.completed, performer.revisions, performer.overdue
    )
}

pub fn build_report(board: &Leaderboard, generated_at: NaiveDateTime, limit: usize) -> String {
    let stats = &board.stats;
    let trend = &board.trend;
    let mut output = String::new();

    let _ = writeln!(output, "# Team Leaderboard: {}", stats.month_name);
    let _ = writeln!(
        output,
        "Generated {} (day {} of the month)",
        generated_at.format("%Y-%m-%d %H:%M"),
        stats.days_into_month
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Month at a Glance");
    let _ = writeln!(output, "- Tasks logged: {}", stats.total_tasks);
    let _ = writeln!(
        output,
        "- Completed: {} ({}%)",
        stats.completed, stats.completion_percentage
    );
    let _ = writeln!(output, "- Revisions: {}", stats.revisions);
    let _ = writeln!(output, "- Overdue: {}", stats.overdue);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trend");
    let _ = writeln!(
        output,
        "- Velocity: {} ({:+}% vs last month)",
        trend.velocity_label, trend.velocity_change_percent
    );
    let _ = writeln!(output, "- Quality score: {:.1}", trend.quality_score);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Standings");

    if board.performers.is_empty() {
        let _ = writeln!(output, "No completed or open tasks logged this month.");
    } else {
        for (index, performer) in board.performers.iter().take(limit).enumerate() {
            let _ = writeln!(output, "{}", format_standing(index + 1, performer));
        }
    }

    let flagged = needs_attention(&board.performers);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Needs Attention");

    if flagged.is_empty() {
        let _ = writeln!(output, "Nobody has overdue work.");
    } else {
        for performer in flagged {
            let _ = writeln!(
                output,
                "- {}: {} overdue",
                performer.name, performer.overdue
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeriodStats, TrendSnapshot, VelocityLabel};
    use chrono::NaiveDate;

    fn performer(name: &str, score: i64, overdue: u32) -> RankedPerformer {
        RankedPerformer {
            id: name.to_string(),
            name: name.to_string(),
            score,
            completed: 3,
            revisions: 1,
            overdue,
            last_completion_date: None,
            profile_pic: String::new(),
        }
    }

    fn board(performers: Vec<RankedPerformer>) -> Leaderboard {
        Leaderboard {
            performers,
            stats: PeriodStats {
                month_name: "June".to_string(),
                total_tasks: 8,
                completed: 6,
                revisions: 2,
                overdue: 3,
                completion_percentage: 75,
                days_into_month: 15,
            },
            trend: TrendSnapshot {
                velocity_change_percent: -20,
                quality_score: 6.7,
                velocity_label: VelocityLabel::Low,
            },
        }
    }

    fn generated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn report_lists_standings_and_overdue() {
        let report = build_report(
            &board(vec![
                performer("Ann", 27, 1),
                performer("Bo", 20, 2),
                performer("Cy", 5, 0),
            ]),
            generated(),
            2,
        );

        assert!(report.starts_with("# Team Leaderboard: June"));
        assert!(report.contains("- Completed: 6 (75%)"));
        assert!(report.contains("- Velocity: Low (-20% vs last month)"));
        assert!(report.contains("1. Ann score 27"));
        assert!(report.contains("2. Bo score 20"));
        assert!(!report.contains("3. Cy"));

        let bo = report.find("- Bo: 2 overdue").unwrap();
        let ann = report.find("- Ann: 1 overdue").unwrap();
        assert!(bo < ann);
    }

    #[test]
    fn empty_board_says_so() {
        let report = build_report(&board(Vec::new()), generated(), 10);
        assert!(report.contains("No completed or open tasks logged this month."));
        assert!(report.contains("Nobody has overdue work."));
    }
}
