//! Read-only views derived from the statistics.

use crate::models::{Achievement, TaskCategory, UserStats};
use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Minutes of focus that make up one level.
const MINUTES_PER_LEVEL: u32 = 5 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Total focus time in hours, rounded to one decimal.
    pub total_hours: f64,
    pub level: u32,
    pub completed_tasks: u32,
    pub streak_days: u32,
}

pub fn summary(stats: &UserStats) -> Summary {
    let hours = stats.total_focus_minutes as f64 / 60.0;
    Summary {
        total_hours: (hours * 10.0).round() / 10.0,
        level: stats.total_focus_minutes / MINUTES_PER_LEVEL + 1,
        completed_tasks: stats.completed_tasks_count,
        streak_days: stats.consecutive_days,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMinutes {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub minutes: u32,
}

/// Minutes per day for the Monday-to-Sunday week containing `today`.
pub fn weekly_series(stats: &UserStats, today: NaiveDate) -> Vec<DayMinutes> {
    let offset = u64::from(today.weekday().num_days_from_monday());
    let Some(monday) = today.checked_sub_days(Days::new(offset)) else {
        return Vec::new();
    };

    (0..7)
        .filter_map(|i| monday.checked_add_days(Days::new(i)))
        .map(|date| DayMinutes {
            date,
            weekday: date.weekday(),
            minutes: stats.minutes_on(date),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekMinutes {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub minutes: u32,
}

/// Four rolling seven-day windows, oldest first, the last one ending today.
pub fn monthly_series(stats: &UserStats, today: NaiveDate) -> Vec<WeekMinutes> {
    (0..4u64)
        .rev()
        .filter_map(|weeks_ago| {
            let end = today.checked_sub_days(Days::new(weeks_ago * 7))?;
            let start = end.checked_sub_days(Days::new(6))?;
            let minutes = stats
                .daily_history
                .range(start..=end)
                .fold(0u32, |acc, (_, mins)| acc.saturating_add(*mins));
            Some(WeekMinutes { start, end, minutes })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: TaskCategory,
    pub minutes: u32,
    /// Whole percentage of all focus minutes.
    pub percent: u32,
}

/// Categories with recorded minutes and their share of the total.
pub fn category_breakdown(stats: &UserStats) -> Vec<CategoryShare> {
    let dist = &stats.category_distribution;
    let total = dist.total();
    if total == 0 {
        return Vec::new();
    }

    TaskCategory::ALL
        .into_iter()
        .filter(|c| dist.get(*c) > 0)
        .map(|category| {
            let minutes = dist.get(category);
            CategoryShare {
                category,
                minutes,
                percent: ((minutes as f64 / total as f64) * 100.0).round() as u32,
            }
        })
        .collect()
}

/// Unlocked achievements first, otherwise in their stored order.
pub fn achievements_by_recency(achievements: &[Achievement]) -> Vec<&Achievement> {
    let mut sorted: Vec<&Achievement> = achievements.iter().collect();
    sorted.sort_by_key(|a| !a.unlocked);
    sorted
}
