//! Session ledger: statistics accounting and achievement evaluation.
//!
//! Both entry points are pure: they take the committed stats and achievements
//! and return the next versions, leaving the inputs untouched.

use crate::models::{Achievement, AchievementId, TaskCategory, UserStats};
use chrono::{DateTime, NaiveDate, Utc};

/// Streak length that unlocks `focus_master`.
pub const FOCUS_MASTER_DAYS: u32 = 7;
/// Cumulative minutes (100 hours) that unlock `time_guardian`.
pub const TIME_GUARDIAN_MINUTES: u32 = 6000;
/// Completed tasks that unlock `task_master`.
pub const TASK_MASTER_TASKS: u32 = 20;

/// Metrics a trigger changed. Unset fields are not evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub consecutive_days: Option<u32>,
    pub total_focus_minutes: Option<u32>,
    pub completed_tasks_count: Option<u32>,
}

/// A completed focus session handed to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusCompletion {
    pub minutes: u32,
    /// Category of the active task, if one was set.
    pub category: Option<TaskCategory>,
    pub today: NaiveDate,
    pub at: DateTime<Utc>,
}

/// Next committed stats and achievements after a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerUpdate {
    pub stats: UserStats,
    pub achievements: Vec<Achievement>,
    /// Achievements unlocked by this update.
    pub unlocked: Vec<AchievementId>,
}

/// Accounts for one completed focus session.
pub fn record_focus_session(
    stats: &UserStats,
    achievements: &[Achievement],
    completion: FocusCompletion,
) -> LedgerUpdate {
    let mut stats = stats.clone();
    let mut achievements = achievements.to_vec();
    let minutes = completion.minutes;
    let today = completion.today;

    stats.total_focus_minutes = stats.total_focus_minutes.saturating_add(minutes);

    let day = stats.daily_history.entry(today).or_insert(0);
    *day = day.saturating_add(minutes);

    stats
        .category_distribution
        .add(completion.category.unwrap_or_default(), minutes);

    // At most one streak update per calendar day.
    if stats.last_focus_date != Some(today) {
        let continues = matches!(stats.last_focus_date, Some(last) if Some(last) == today.pred_opt());
        stats.consecutive_days = if continues {
            stats.consecutive_days.saturating_add(1)
        } else {
            1
        };
        stats.last_focus_date = Some(today);
    }

    let unlocked = evaluate_achievements(
        &mut achievements,
        Metrics {
            consecutive_days: Some(stats.consecutive_days),
            total_focus_minutes: Some(stats.total_focus_minutes),
            completed_tasks_count: None,
        },
        completion.at,
    );

    LedgerUpdate {
        stats,
        achievements,
        unlocked,
    }
}

/// Accounts for a task being marked done (`completed == true`) or reopened.
pub fn record_task_toggle(
    stats: &UserStats,
    achievements: &[Achievement],
    completed: bool,
    at: DateTime<Utc>,
) -> LedgerUpdate {
    let mut stats = stats.clone();
    let mut achievements = achievements.to_vec();

    stats.completed_tasks_count = if completed {
        stats.completed_tasks_count.saturating_add(1)
    } else {
        stats.completed_tasks_count.saturating_sub(1)
    };

    let unlocked = if completed {
        evaluate_achievements(
            &mut achievements,
            Metrics {
                completed_tasks_count: Some(stats.completed_tasks_count),
                ..Metrics::default()
            },
            at,
        )
    } else {
        Vec::new()
    };

    LedgerUpdate {
        stats,
        achievements,
        unlocked,
    }
}

/// The single achievement evaluation point shared by every trigger.
///
/// Already unlocked achievements are never touched. Returns the ids newly
/// unlocked.
pub fn evaluate_achievements(
    achievements: &mut [Achievement],
    metrics: Metrics,
    now: DateTime<Utc>,
) -> Vec<AchievementId> {
    let mut unlocked = Vec::new();
    for achievement in achievements.iter_mut() {
        let reached = match achievement.id {
            AchievementId::FocusMaster => metrics
                .consecutive_days
                .is_some_and(|days| days >= FOCUS_MASTER_DAYS),
            AchievementId::TimeGuardian => metrics
                .total_focus_minutes
                .is_some_and(|mins| mins >= TIME_GUARDIAN_MINUTES),
            AchievementId::TaskMaster => metrics
                .completed_tasks_count
                .is_some_and(|count| count >= TASK_MASTER_TASKS),
        };
        if reached && achievement.unlock(now) {
            log::info!("achievement unlocked: {}", achievement.title);
            unlocked.push(achievement.id);
        }
    }
    unlocked
}

/// Drops duplicate entries and re-inserts any canonical achievement that is
/// missing, locked, in canonical order.
pub fn ensure_canonical_achievements(achievements: Vec<Achievement>) -> Vec<Achievement> {
    AchievementId::ALL
        .into_iter()
        .map(|id| {
            achievements
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .unwrap_or_else(|| Achievement::canonical(id))
        })
        .collect()
}
