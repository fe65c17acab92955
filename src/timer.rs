//! Countdown state machine for focus and break sessions.
//!
//! Transition table:
//!
//! | operation  | from                 | to                         |
//! |------------|----------------------|----------------------------|
//! | `start`    | idle                 | focusing                   |
//! | `pause`    | focusing             | paused                     |
//! | `resume`   | paused               | focusing                   |
//! | `stop`     | focusing, paused     | idle (focus mode)          |
//! | `tick`     | focusing             | focusing, completed        |
//! | `confirm`  | completed            | idle (mode flipped)        |
//!
//! Every other combination is rejected with [`TimerError::InvalidStateTransition`],
//! except `tick`, which is a no-op outside `focusing` because the clock fires it
//! unconditionally.

use crate::models::{Settings, TimerMode, TimerSession, TimerStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("cannot {operation} the timer while it is {}", .status.label())]
    InvalidStateTransition {
        operation: &'static str,
        status: TimerStatus,
    },
}

/// Result of a single clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not focusing; nothing changed.
    Ignored,
    /// One second was consumed.
    Counted,
    /// The countdown reached zero on this tick.
    Completed,
}

/// A session that was confirmed as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedSession {
    pub mode: TimerMode,
    pub minutes: u32,
}

impl TimerSession {
    fn guard(&self, operation: &'static str, allowed: &[TimerStatus]) -> Result<(), TimerError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TimerError::InvalidStateTransition {
                operation,
                status: self.status,
            })
        }
    }

    /// Starts a countdown sized from the configured length of the current mode.
    pub fn start(&mut self, settings: &Settings) -> Result<(), TimerError> {
        self.guard("start", &[TimerStatus::Idle])?;
        self.duration_secs = settings.duration_secs(self.mode);
        self.time_left_secs = self.duration_secs;
        self.status = TimerStatus::Focusing;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        self.guard("pause", &[TimerStatus::Focusing])?;
        self.status = TimerStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        self.guard("resume", &[TimerStatus::Paused])?;
        self.status = TimerStatus::Focusing;
        Ok(())
    }

    /// Abandons the running session. Nothing is recorded.
    pub fn stop(&mut self, settings: &Settings) -> Result<(), TimerError> {
        self.guard("stop", &[TimerStatus::Focusing, TimerStatus::Paused])?;
        *self = TimerSession::new(TimerMode::Focus, settings);
        Ok(())
    }

    /// Consumes one second of the countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != TimerStatus::Focusing {
            return TickOutcome::Ignored;
        }
        if self.time_left_secs <= 1 {
            self.time_left_secs = 0;
            self.status = TimerStatus::Completed;
            TickOutcome::Completed
        } else {
            self.time_left_secs -= 1;
            TickOutcome::Counted
        }
    }

    /// Acknowledges a completed session and moves to the next mode.
    ///
    /// Returns the mode and length of the session that just ended so the
    /// caller can account for it.
    pub fn confirm_completion(&mut self, settings: &Settings) -> Result<FinishedSession, TimerError> {
        self.guard("confirm", &[TimerStatus::Completed])?;
        let finished = FinishedSession {
            mode: self.mode,
            minutes: self.duration_secs / 60,
        };
        *self = TimerSession::new(self.mode.toggled(), settings);
        Ok(finished)
    }

    /// Re-sizes an idle timer after the configured lengths changed.
    pub fn refresh_idle(&mut self, settings: &Settings) {
        if self.is_idle() {
            *self = TimerSession::new(self.mode, settings);
        }
    }
}

/// Formats a short status line for the timer.
pub fn format_title(session: &TimerSession) -> String {
    let time = format_time(session.time_left_secs);
    match (session.status, session.mode) {
        (TimerStatus::Idle, TimerMode::Focus) => format!("🍅 ready {}", time),
        (TimerStatus::Idle, TimerMode::Break) => format!("☕ ready {}", time),
        (TimerStatus::Focusing, TimerMode::Focus) => format!("🍅 {}", time),
        (TimerStatus::Focusing, TimerMode::Break) => format!("☕ {}", time),
        (TimerStatus::Paused, _) => format!("⏸ {}", time),
        (TimerStatus::Completed, mode) => format!("✔ {} done, confirm to continue", mode.label()),
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focusing(settings: &Settings) -> TimerSession {
        let mut session = TimerSession::new(TimerMode::Focus, settings);
        session.start(settings).unwrap();
        session
    }

    #[test]
    fn test_start_sizes_from_settings() {
        let settings = Settings {
            focus_duration: 30,
            ..Settings::default()
        };
        let session = focusing(&settings);
        assert!(session.is_focusing());
        assert_eq!(session.duration_secs, 1800);
        assert_eq!(session.time_left_secs, 1800);
    }

    #[test]
    fn test_start_break_uses_break_length() {
        let settings = Settings::default();
        let mut session = TimerSession::new(TimerMode::Break, &settings);
        session.start(&settings).unwrap();
        assert_eq!(session.duration_secs, 300);
    }

    #[test]
    fn test_start_while_focusing_is_rejected() {
        let settings = Settings::default();
        let mut session = focusing(&settings);
        session.tick();
        let err = session.start(&settings).unwrap_err();
        assert_eq!(
            err,
            TimerError::InvalidStateTransition {
                operation: "start",
                status: TimerStatus::Focusing
            }
        );
        assert_eq!(session.time_left_secs, 1499);
    }

    #[test]
    fn test_tick_strictly_decreases_until_completed_once() {
        let settings = Settings {
            focus_duration: 1,
            ..Settings::default()
        };
        let mut session = focusing(&settings);
        let mut previous = session.time_left_secs;
        let mut completions = 0;

        for _ in 0..59 {
            assert_eq!(session.tick(), TickOutcome::Counted);
            assert!(session.time_left_secs < previous);
            previous = session.time_left_secs;
        }
        assert_eq!(session.time_left_secs, 1);

        for _ in 0..5 {
            if session.tick() == TickOutcome::Completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(session.is_completed());
        assert_eq!(session.time_left_secs, 0);
    }

    #[test]
    fn test_full_focus_session_completes_after_1500_ticks() {
        let settings = Settings::default();
        let mut session = focusing(&settings);
        for _ in 0..1500 {
            session.tick();
        }
        assert_eq!(session.status, TimerStatus::Completed);
        assert_eq!(session.time_left_secs, 0);
    }

    #[test]
    fn test_tick_ignored_outside_focusing() {
        let settings = Settings::default();
        let mut session = TimerSession::new(TimerMode::Focus, &settings);
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.time_left_secs, 1500);
        assert!(session.is_idle());
    }

    #[test]
    fn test_pause_resume_preserves_time_left() {
        let settings = Settings::default();
        let mut session = focusing(&settings);
        for _ in 0..10 {
            session.tick();
        }
        session.pause().unwrap();
        let before = session.time_left_secs;

        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.time_left_secs, before);

        session.resume().unwrap();
        assert!(session.is_focusing());
        assert_eq!(session.time_left_secs, before);
    }

    #[test]
    fn test_pause_and_resume_guards() {
        let settings = Settings::default();
        let mut session = TimerSession::new(TimerMode::Focus, &settings);
        assert!(session.pause().is_err());
        assert!(session.resume().is_err());

        session.start(&settings).unwrap();
        assert!(session.resume().is_err());
        session.pause().unwrap();
        assert!(session.pause().is_err());
    }

    #[test]
    fn test_stop_discards_progress_and_uses_current_focus_length() {
        let mut settings = Settings::default();
        let mut session = TimerSession::new(TimerMode::Break, &settings);
        session.start(&settings).unwrap();
        session.tick();
        session.pause().unwrap();

        settings.focus_duration = 40;
        session.stop(&settings).unwrap();

        assert!(session.is_idle());
        assert_eq!(session.mode, TimerMode::Focus);
        assert_eq!(session.duration_secs, 2400);
        assert_eq!(session.time_left_secs, 2400);
    }

    #[test]
    fn test_stop_from_idle_or_completed_is_rejected() {
        let settings = Settings {
            focus_duration: 1,
            ..Settings::default()
        };
        let mut session = TimerSession::new(TimerMode::Focus, &settings);
        assert!(session.stop(&settings).is_err());

        session.start(&settings).unwrap();
        for _ in 0..60 {
            session.tick();
        }
        assert!(session.is_completed());
        assert!(session.stop(&settings).is_err());
        assert!(session.is_completed());
    }

    #[test]
    fn test_confirm_flips_mode_and_resets_to_idle() {
        let settings = Settings::default();
        let mut session = focusing(&settings);
        for _ in 0..1500 {
            session.tick();
        }

        let finished = session.confirm_completion(&settings).unwrap();
        assert_eq!(finished, FinishedSession { mode: TimerMode::Focus, minutes: 25 });
        assert_eq!(session.mode, TimerMode::Break);
        assert!(session.is_idle());
        assert_eq!(session.duration_secs, 300);
        assert_eq!(session.time_left_secs, 300);
    }

    #[test]
    fn test_confirm_requires_completed() {
        let settings = Settings::default();
        let mut session = focusing(&settings);
        assert!(session.confirm_completion(&settings).is_err());
        assert!(session.is_focusing());
    }

    #[test]
    fn test_refresh_idle_only_touches_idle_timer() {
        let mut settings = Settings::default();
        let mut idle = TimerSession::new(TimerMode::Focus, &settings);
        let mut running = focusing(&settings);

        settings.focus_duration = 50;
        idle.refresh_idle(&settings);
        running.refresh_idle(&settings);

        assert_eq!(idle.duration_secs, 3000);
        assert_eq!(running.duration_secs, 1500);
    }

    #[test]
    fn test_format_title() {
        let settings = Settings::default();
        let mut session = TimerSession::new(TimerMode::Focus, &settings);
        assert_eq!(format_title(&session), "🍅 ready 25:00");

        session.start(&settings).unwrap();
        session.tick();
        assert_eq!(format_title(&session), "🍅 24:59");

        session.pause().unwrap();
        assert_eq!(format_title(&session), "⏸ 24:59");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(60), "01:00");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(3599), "59:59");
    }
}
