//! Console command handling.

use crate::app::{App, AppError, CompletionEvent};
use crate::insights;
use crate::models::{AchievementId, TaskCategory};
use crate::timer::format_title;
use chrono::{Datelike, Local};

/// Result of handling a command line.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Nothing to report.
    Continue,
    /// User requested quit.
    Quit,
    /// Text to show the user.
    Output(String),
}

pub const HELP: &str = "\
commands:
  start | pause | resume | stop | confirm | status
  add [work|study|reading|other] <title>
  tasks | toggle <n> | delete <n> | active <n|none>
  focus <minutes> | break <minutes> | costume <name|none>
  stats | reset | help | quit";

/// Handles one command line and updates the app accordingly.
pub fn handle_command(app: &mut App, line: &str) -> EventResult {
    let line = line.trim();
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));

    let result = match command {
        "" => return EventResult::Continue,
        "quit" | "exit" => return EventResult::Quit,
        "help" => Ok(HELP.to_string()),
        "status" => Ok(format!(
            "{} ({:.0}% done)",
            format_title(app.timer()),
            app.timer().progress_percent() * 100.0
        )),
        "start" => app.start().map(|_| format_title(app.timer())),
        "pause" => app.pause().map(|_| format_title(app.timer())),
        "resume" => app.resume().map(|_| format_title(app.timer())),
        "stop" => app.stop().map(|_| "session abandoned".to_string()),
        "confirm" => match app.confirm_completion() {
            Ok(event) => Ok(describe_completion(app, &event)),
            Err(e) => Err(e),
        },
        "add" => add_task(app, rest),
        "tasks" => Ok(list_tasks(app)),
        "toggle" => with_task(app, rest, |app, id| {
            let unlocked = app.toggle_task(&id)?;
            Ok(describe_unlocks("task updated", app, &unlocked))
        }),
        "delete" => with_task(app, rest, |app, id| {
            let task = app.delete_task(&id)?;
            Ok(format!("deleted \"{}\"", task.title))
        }),
        "active" if rest == "none" => app
            .set_active_task(None)
            .map(|_| "no active task".to_string()),
        "active" => with_task(app, rest, |app, id| {
            app.set_active_task(Some(&id))?;
            Ok("active task set".to_string())
        }),
        "focus" | "break" => return set_duration(app, command, rest),
        "costume" => {
            let costume = (rest != "none" && !rest.is_empty()).then(|| rest.to_string());
            app.set_costume(costume).map(|_| "costume updated".to_string())
        }
        "stats" => Ok(render_stats(app)),
        "reset" => app.reset_all_data().map(|_| "all data reset".to_string()),
        other => Ok(format!("unknown command: {} (try help)", other)),
    };

    match result {
        Ok(text) => EventResult::Output(text),
        Err(e) => EventResult::Output(format!("error: {}", e)),
    }
}

fn add_task(app: &mut App, rest: &str) -> Result<String, AppError> {
    let (category, title) = match rest.split_once(char::is_whitespace) {
        Some((first, title)) => match TaskCategory::from_name(first) {
            Some(category) => (category, title),
            None => (TaskCategory::Other, rest),
        },
        None => (TaskCategory::Other, rest),
    };
    app.add_task(title, category)?;
    Ok(format!("added task #{}", app.tasks().len()))
}

/// Resolves a 1-based task number and runs `f` with the task id.
fn with_task<F>(app: &mut App, arg: &str, f: F) -> Result<String, AppError>
where
    F: FnOnce(&mut App, String) -> Result<String, AppError>,
{
    let id = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| app.tasks().get(i))
        .map(|task| task.id.clone());
    match id {
        Some(id) => f(app, id),
        None => Ok(format!("no task number {}", arg)),
    }
}

fn set_duration(app: &mut App, which: &str, arg: &str) -> EventResult {
    let Ok(minutes) = arg.parse::<u32>() else {
        return EventResult::Output(format!("usage: {} <minutes>", which));
    };
    let updated = if which == "focus" {
        app.update_settings(|s| s.focus_duration = minutes)
    } else {
        app.update_settings(|s| s.break_duration = minutes)
    };
    if let Err(e) = updated {
        return EventResult::Output(format!("error: {}", e));
    }
    let settings = app.settings();
    EventResult::Output(format!(
        "focus {} min, break {} min",
        settings.focus_duration, settings.break_duration
    ))
}

fn list_tasks(app: &App) -> String {
    if app.tasks().is_empty() {
        return "no tasks".to_string();
    }
    let active = app.state().active_task_id.as_deref();
    app.tasks()
        .iter()
        .enumerate()
        .map(|(i, task)| {
            format!(
                "{:>2}. [{}] {} ({}){}",
                i + 1,
                if task.completed { "x" } else { " " },
                task.title,
                task.category.label(),
                if active == Some(task.id.as_str()) { " *" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_completion(app: &App, event: &CompletionEvent) -> String {
    let headline = format!(
        "{} session of {} min confirmed, next: {}",
        event.mode.label(),
        event.minutes,
        format_title(app.timer())
    );
    describe_unlocks(&headline, app, &event.unlocked)
}

fn describe_unlocks(headline: &str, app: &App, unlocked: &[AchievementId]) -> String {
    let mut lines = vec![headline.to_string()];
    for id in unlocked {
        if let Some(a) = app.achievements().iter().find(|a| a.id == *id) {
            lines.push(format!("{} achievement unlocked: {}", a.icon, a.title));
        }
    }
    lines.join("\n")
}

fn render_stats(app: &App) -> String {
    let stats = app.stats();
    let today = Local::now().date_naive();
    let summary = insights::summary(stats);

    let mut lines = vec![format!(
        "level {} | {:.1} h focused | {} tasks done | {} day streak",
        summary.level, summary.total_hours, summary.completed_tasks, summary.streak_days
    )];

    let week = insights::weekly_series(stats, today)
        .iter()
        .map(|d| format!("{} {}: {}", d.weekday, d.date.day(), d.minutes))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(format!("this week: {}", week));

    let month = insights::monthly_series(stats, today)
        .iter()
        .map(|w| format!("{}..{} {}", w.start.format("%m-%d"), w.end.format("%m-%d"), w.minutes))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("last 4 weeks: {}", month));

    let shares = insights::category_breakdown(stats)
        .iter()
        .map(|s| format!("{} {} min ({}%)", s.category.label(), s.minutes, s.percent))
        .collect::<Vec<_>>();
    if !shares.is_empty() {
        lines.push(format!("categories: {}", shares.join(", ")));
    }

    for a in insights::achievements_by_recency(app.achievements()) {
        let mark = if a.unlocked { a.icon.as_str() } else { "🔒" };
        lines.push(format!("{} {}: {}", mark, a.title, a.description));
    }
    lines.join("\n")
}
