//! Task list operations and their effect on task statistics.

use crate::ledger;
use crate::models::{AchievementId, AppState, Task, TaskCategory};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("no task with id {0}")]
    NotFound(String),
}

impl AppState {
    /// Adds a task and returns its id.
    pub fn add_task(&mut self, title: &str, category: TaskCategory) -> Result<String, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        let task = Task::new(title, category);
        let id = task.id.clone();
        self.data.tasks.push(task);
        Ok(id)
    }

    /// Flips a task's completion and updates the completed count.
    ///
    /// Returns the achievements this toggle unlocked.
    pub fn toggle_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<Vec<AchievementId>, TaskError> {
        let task = self
            .data
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.completed = !task.completed;
        let completed = task.completed;

        let update = ledger::record_task_toggle(&self.data.stats, &self.data.achievements, completed, now);
        self.data.stats = update.stats;
        self.data.achievements = update.achievements;
        Ok(update.unlocked)
    }

    /// Removes a task, clearing the active task if it pointed at it.
    pub fn delete_task(&mut self, id: &str) -> Result<Task, TaskError> {
        let index = self
            .data
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
        }
        Ok(self.data.tasks.remove(index))
    }

    pub fn set_active_task(&mut self, id: Option<&str>) -> Result<(), TaskError> {
        if let Some(id) = id {
            if self.data.task(id).is_none() {
                return Err(TaskError::NotFound(id.to_string()));
            }
        }
        self.active_task_id = id.map(str::to_string);
        Ok(())
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active_task_id.as_deref().and_then(|id| self.data.task(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_task() {
        let mut state = AppState::default();
        let id = state.add_task("  Write report ", TaskCategory::Work).unwrap();

        let task = state.data.task(&id).unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.category, TaskCategory::Work);
        assert!(!task.completed);
    }

    #[test]
    fn test_add_task_rejects_empty_title() {
        let mut state = AppState::default();
        assert_eq!(state.add_task("   ", TaskCategory::Other), Err(TaskError::EmptyTitle));
        assert!(state.data.tasks.is_empty());
    }

    #[test]
    fn test_toggle_task_updates_count_both_ways() {
        let mut state = AppState::default();
        let id = state.add_task("Read chapter", TaskCategory::Reading).unwrap();

        state.toggle_task(&id, Utc::now()).unwrap();
        assert!(state.data.task(&id).unwrap().completed);
        assert_eq!(state.data.stats.completed_tasks_count, 1);

        state.toggle_task(&id, Utc::now()).unwrap();
        assert!(!state.data.task(&id).unwrap().completed);
        assert_eq!(state.data.stats.completed_tasks_count, 0);
    }

    #[test]
    fn test_toggle_unknown_task() {
        let mut state = AppState::default();
        assert_eq!(
            state.toggle_task("missing", Utc::now()),
            Err(TaskError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_twenty_toggles_unlock_task_master_once() {
        let mut state = AppState::default();
        let ids: Vec<String> = (0..21)
            .map(|i| state.add_task(&format!("task {}", i), TaskCategory::Other).unwrap())
            .collect();

        let mut unlocked = Vec::new();
        for id in &ids[..20] {
            unlocked.extend(state.toggle_task(id, Utc::now()).unwrap());
        }
        assert_eq!(unlocked, vec![AchievementId::TaskMaster]);
        assert_eq!(state.data.stats.completed_tasks_count, 20);

        let achievement = state.data.achievement(AchievementId::TaskMaster).unwrap().clone();
        assert!(achievement.unlocked);
        assert!(achievement.unlocked_at.is_some());

        // Further toggles, in either direction, leave it alone.
        assert!(state.toggle_task(&ids[20], Utc::now()).unwrap().is_empty());
        state.toggle_task(&ids[0], Utc::now()).unwrap();
        state.toggle_task(&ids[1], Utc::now()).unwrap();
        assert_eq!(state.data.stats.completed_tasks_count, 19);
        assert_eq!(state.data.achievement(AchievementId::TaskMaster), Some(&achievement));
    }

    #[test]
    fn test_delete_active_task_clears_selection() {
        let mut state = AppState::default();
        let keep = state.add_task("keep", TaskCategory::Study).unwrap();
        let gone = state.add_task("gone", TaskCategory::Work).unwrap();

        state.set_active_task(Some(&gone)).unwrap();
        assert_eq!(state.active_task().map(|t| t.title.as_str()), Some("gone"));

        let removed = state.delete_task(&gone).unwrap();
        assert_eq!(removed.title, "gone");
        assert!(state.active_task_id.is_none());
        assert_eq!(state.data.tasks.len(), 1);

        state.set_active_task(Some(&keep)).unwrap();
        state.delete_task(&keep).unwrap();
        assert!(state.active_task().is_none());
    }

    #[test]
    fn test_set_active_task_requires_existing_id() {
        let mut state = AppState::default();
        assert!(state.set_active_task(Some("nope")).is_err());
        state.set_active_task(None).unwrap();
        assert!(state.active_task_id.is_none());
    }
}
