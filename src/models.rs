//! Data models for the focus timer, statistics and achievements.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Which kind of interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// A focus session, tracked toward statistics.
    #[default]
    Focus,
    /// A break, never tracked.
    Break,
}

impl TimerMode {
    /// Returns the mode that follows this one after a confirmed completion.
    pub fn toggled(self) -> Self {
        match self {
            Self::Focus => Self::Break,
            Self::Break => Self::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Break => "break",
        }
    }
}

/// Lifecycle status of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Ready to start, nothing counting down.
    #[default]
    Idle,
    /// Counting down.
    Focusing,
    /// Countdown suspended by the user.
    Paused,
    /// Countdown reached zero, waiting for confirmation.
    Completed,
}

impl TimerStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Focusing => "focusing",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

/// The single live timer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub time_left_secs: u32,
    pub duration_secs: u32,
}

impl TimerSession {
    /// Creates an idle session for `mode` sized from the configured length.
    pub fn new(mode: TimerMode, settings: &Settings) -> Self {
        let duration_secs = settings.duration_secs(mode);
        Self {
            mode,
            status: TimerStatus::Idle,
            time_left_secs: duration_secs,
            duration_secs,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == TimerStatus::Idle
    }

    pub fn is_focusing(&self) -> bool {
        self.status == TimerStatus::Focusing
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    #[cfg(test)]
    pub fn is_completed(&self) -> bool {
        self.status == TimerStatus::Completed
    }

    /// Returns the progress (0.0 to 1.0) of the current countdown.
    pub fn progress_percent(&self) -> f32 {
        if self.duration_secs == 0 {
            return 1.0;
        }
        1.0 - (self.time_left_secs as f32 / self.duration_secs as f32)
    }
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new(TimerMode::Focus, &Settings::default())
    }
}

/// User-configurable settings, persisted with the rest of the state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Length of a focus session in minutes.
    pub focus_duration: u32,
    /// Length of a break in minutes.
    pub break_duration: u32,
    pub sound_enabled: bool,
    /// Volume from 0 to 100.
    pub sound_volume: u32,
    pub notification_enabled: bool,
    pub vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_duration: 25,
            break_duration: 5,
            sound_enabled: true,
            sound_volume: 50,
            notification_enabled: true,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    /// Configured length of `mode` in minutes.
    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_duration,
            TimerMode::Break => self.break_duration,
        }
    }

    /// Configured length of `mode` in seconds.
    pub fn duration_secs(&self, mode: TimerMode) -> u32 {
        self.minutes_for(mode).saturating_mul(60)
    }

    /// Clamps every field into its supported range.
    pub fn normalized(mut self) -> Self {
        self.focus_duration = self.focus_duration.clamp(1, 180);
        self.break_duration = self.break_duration.clamp(1, 60);
        self.sound_volume = self.sound_volume.min(100);
        self
    }
}

/// Timestamps are written as RFC 3339 strings. Reading also accepts epoch
/// milliseconds, which is how records from the first storage version hold them.
mod timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Millis(i64),
        Text(String),
    }

    impl Stored {
        fn into_datetime<E: serde::de::Error>(self) -> Result<DateTime<Utc>, E> {
            match self {
                Stored::Millis(ms) => Utc
                    .timestamp_millis_opt(ms)
                    .single()
                    .ok_or_else(|| E::custom(format!("timestamp out of range: {}", ms))),
                Stored::Text(text) => DateTime::parse_from_rfc3339(&text)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(E::custom),
            }
        }
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        at.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        Stored::deserialize(deserializer)?.into_datetime()
    }

    pub mod option {
        use super::Stored;
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            at.serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<Stored>::deserialize(deserializer)?
                .map(Stored::into_datetime)
                .transpose()
        }
    }
}

/// Fixed set of categories focus minutes are attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Study,
    Reading,
    #[default]
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [Self::Work, Self::Study, Self::Reading, Self::Other];

    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Study => "study",
            Self::Reading => "reading",
            Self::Other => "other",
        }
    }

    /// Parses a category name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, category: TaskCategory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
            category,
            created_at: Utc::now(),
        }
    }
}

/// Cumulative focus minutes per category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CategoryDistribution {
    pub work: u32,
    pub study: u32,
    pub reading: u32,
    pub other: u32,
}

impl CategoryDistribution {
    pub fn get(&self, category: TaskCategory) -> u32 {
        match category {
            TaskCategory::Work => self.work,
            TaskCategory::Study => self.study,
            TaskCategory::Reading => self.reading,
            TaskCategory::Other => self.other,
        }
    }

    pub fn add(&mut self, category: TaskCategory, minutes: u32) {
        let slot = match category {
            TaskCategory::Work => &mut self.work,
            TaskCategory::Study => &mut self.study,
            TaskCategory::Reading => &mut self.reading,
            TaskCategory::Other => &mut self.other,
        };
        *slot = slot.saturating_add(minutes);
    }

    pub fn total(&self) -> u32 {
        TaskCategory::ALL
            .into_iter()
            .fold(0u32, |acc, c| acc.saturating_add(self.get(c)))
    }
}

/// Cumulative productivity statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_focus_minutes: u32,
    pub completed_tasks_count: u32,
    /// Current streak of days with at least one completed focus session.
    pub consecutive_days: u32,
    pub last_focus_date: Option<NaiveDate>,
    /// Minutes focused per calendar day.
    pub daily_history: BTreeMap<NaiveDate, u32>,
    pub category_distribution: CategoryDistribution,
}

impl UserStats {
    pub fn minutes_on(&self, date: NaiveDate) -> u32 {
        self.daily_history.get(&date).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FocusMaster,
    TaskMaster,
    TimeGuardian,
}

impl AchievementId {
    pub const ALL: [AchievementId; 3] = [Self::FocusMaster, Self::TaskMaster, Self::TimeGuardian];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    /// The locked, canonical definition of `id`.
    pub fn canonical(id: AchievementId) -> Self {
        let (title, description, icon) = match id {
            AchievementId::FocusMaster => ("Focus Master", "Focus 7 days in a row", "🏆"),
            AchievementId::TaskMaster => ("Task Master", "Complete 20 tasks", "✅"),
            AchievementId::TimeGuardian => ("Time Guardian", "Focus for 100 hours", "⭐"),
        };
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlocked: false,
            unlocked_at: None,
        }
    }

    /// Unlocks the achievement. Returns false if it was already unlocked.
    pub fn unlock(&mut self, now: DateTime<Utc>) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlocked_at = Some(now);
        true
    }
}

pub fn default_achievements() -> Vec<Achievement> {
    AchievementId::ALL
        .into_iter()
        .map(Achievement::canonical)
        .collect()
}

/// The persisted part of the application state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default = "default_achievements")]
    pub achievements: Vec<Achievement>,
    /// Cosmetic selected for the character, if any.
    #[serde(default)]
    pub costume: Option<String>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            settings: Settings::default(),
            stats: UserStats::default(),
            achievements: default_achievements(),
            costume: None,
        }
    }
}

impl AppData {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[cfg(test)]
    pub fn achievement(&self, id: AchievementId) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }
}

/// The full in-memory state: persisted data plus transient fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub data: AppData,
    pub timer: TimerSession,
    /// Task focus minutes are attributed to. Never persisted.
    pub active_task_id: Option<String>,
}

impl AppState {
    /// Builds the state for freshly loaded data, with an idle focus timer.
    pub fn from_data(data: AppData) -> Self {
        let timer = TimerSession::new(TimerMode::Focus, &data.settings);
        Self {
            data,
            timer,
            active_task_id: None,
        }
    }
}
