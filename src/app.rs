//! Main application state container and operations.
//!
//! Every mutation runs against a copy of the committed state and replaces it
//! in one step, so a failed operation leaves nothing half applied. Persisted
//! data is written after each commit that changed it; write failures are
//! logged and otherwise ignored.

use crate::ledger::{self, FocusCompletion};
use crate::models::{
    Achievement, AchievementId, AppData, AppState, Settings, Task, TaskCategory, TimerMode,
    TimerSession, UserStats,
};
use crate::persistence::{Database, DatabaseError};
use crate::tasks::TaskError;
use crate::timer::{TickOutcome, TimerError};
use chrono::{DateTime, Local, NaiveDate, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// What a confirmed session amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    /// Mode of the session that ended.
    pub mode: TimerMode,
    pub minutes: u32,
    /// Achievements unlocked by this session.
    pub unlocked: Vec<AchievementId>,
}

pub struct App {
    state: AppState,
    db: Database,
}

impl App {
    /// Opens the default database and loads the stored state.
    pub fn new() -> Result<Self, AppError> {
        Self::with_db(Database::new()?)
    }

    /// Creates an app backed by `db`.
    pub fn with_db(db: Database) -> Result<Self, AppError> {
        let data = db.load_data()?;
        log::debug!(
            "loaded {} tasks, {} focus minutes",
            data.tasks.len(),
            data.stats.total_focus_minutes
        );
        Ok(Self {
            state: AppState::from_data(data),
            db,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn timer(&self) -> &TimerSession {
        &self.state.timer
    }

    pub fn settings(&self) -> &Settings {
        &self.state.data.settings
    }

    pub fn stats(&self) -> &UserStats {
        &self.state.data.stats
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.state.data.achievements
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.data.tasks
    }

    fn commit<T, E>(&mut self, op: impl FnOnce(&mut AppState) -> Result<T, E>) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        let mut next = self.state.clone();
        let out = op(&mut next)?;
        let data_changed = next.data != self.state.data;
        self.state = next;
        if data_changed {
            self.persist();
        }
        Ok(out)
    }

    fn persist(&self) {
        if let Err(e) = self.db.save_data(&self.state.data) {
            log::warn!("failed to save state: {}", e);
        }
    }

    pub fn start(&mut self) -> Result<(), AppError> {
        self.commit(|s| s.timer.start(&s.data.settings))?;
        log::debug!("{} session started", self.state.timer.mode.label());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), AppError> {
        self.commit(|s| s.timer.pause())
    }

    pub fn resume(&mut self) -> Result<(), AppError> {
        self.commit(|s| s.timer.resume())
    }

    /// Abandons the current session without recording anything.
    pub fn stop(&mut self) -> Result<(), AppError> {
        self.commit(|s| s.timer.stop(&s.data.settings))?;
        log::debug!("session abandoned");
        Ok(())
    }

    /// Advances the timer by one second. A no-op unless focusing.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.state.timer.tick();
        if outcome == TickOutcome::Completed {
            log::info!("{} session finished", self.state.timer.mode.label());
        }
        outcome
    }

    /// Confirms a completed session using the local calendar date.
    pub fn confirm_completion(&mut self) -> Result<CompletionEvent, AppError> {
        self.confirm_completion_on(Local::now().date_naive(), Utc::now())
    }

    /// Confirms a completed session as of `today`.
    ///
    /// Focus sessions are accounted in the ledger; breaks never touch stats.
    pub fn confirm_completion_on(
        &mut self,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<CompletionEvent, AppError> {
        let event = self.commit(|s| {
            let category = s.active_task().map(|t| t.category);
            let finished = s.timer.confirm_completion(&s.data.settings)?;

            let mut unlocked = Vec::new();
            if finished.mode == TimerMode::Focus {
                let update = ledger::record_focus_session(
                    &s.data.stats,
                    &s.data.achievements,
                    FocusCompletion {
                        minutes: finished.minutes,
                        category,
                        today,
                        at,
                    },
                );
                s.data.stats = update.stats;
                s.data.achievements = update.achievements;
                unlocked = update.unlocked;
            }

            Ok::<_, TimerError>(CompletionEvent {
                mode: finished.mode,
                minutes: finished.minutes,
                unlocked,
            })
        })?;

        if event.mode == TimerMode::Focus {
            log::info!(
                "recorded {} focus minutes, streak {} days",
                event.minutes,
                self.state.data.stats.consecutive_days
            );
        }
        Ok(event)
    }

    pub fn add_task(&mut self, title: &str, category: TaskCategory) -> Result<String, AppError> {
        self.commit(|s| s.add_task(title, category))
    }

    /// Toggles a task, returning any achievements it unlocked.
    pub fn toggle_task(&mut self, id: &str) -> Result<Vec<AchievementId>, AppError> {
        let now = Utc::now();
        self.commit(|s| s.toggle_task(id, now))
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, AppError> {
        self.commit(|s| s.delete_task(id))
    }

    pub fn set_active_task(&mut self, id: Option<&str>) -> Result<(), AppError> {
        self.commit(|s| s.set_active_task(id))
    }

    pub fn set_costume(&mut self, costume: Option<String>) -> Result<(), AppError> {
        self.commit(|s| {
            s.data.costume = costume;
            Ok::<_, AppError>(())
        })
    }

    /// Updates settings and saves them.
    ///
    /// An idle timer is re-sized to the new length; a running one keeps its
    /// duration.
    pub fn update_settings<F>(&mut self, updater: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Settings),
    {
        self.commit(|s| {
            let mut settings = s.data.settings.clone();
            updater(&mut settings);
            s.data.settings = settings.normalized();
            s.timer.refresh_idle(&s.data.settings);
            Ok::<_, AppError>(())
        })
    }

    /// Restores every piece of state, persisted or not, to its defaults.
    pub fn reset_all_data(&mut self) -> Result<(), AppError> {
        self.db.clear()?;
        self.state = AppState::from_data(AppData::default());
        log::info!("all data reset");
        Ok(())
    }
}
