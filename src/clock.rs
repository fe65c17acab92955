//! Clock that ticks the timer once per second while it is focusing.
//!
//! At most one worker thread exists at a time. [`Ticker::sync`] must be called
//! after every operation that can change the timer status: it arms the worker
//! when the timer enters `focusing` and tears it down when it leaves.

use crate::app::App;
use crate::models::TimerMode;
use crate::timer::{format_title, TickOutcome};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Message sent from the clock thread to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockMessage {
    /// One second elapsed; carries the refreshed status line.
    Tick { title: String },
    /// The countdown reached zero and awaits confirmation.
    Completed { mode: TimerMode },
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct Ticker {
    interval: Duration,
    worker: Option<Worker>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            worker: None,
        }
    }

    /// Returns true while a worker thread is running.
    pub fn is_armed(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Arms or disarms the clock to match the current timer status.
    ///
    /// Must not be called while holding the `app` lock.
    pub fn sync(&mut self, app: &Arc<Mutex<App>>, tx: &Sender<ClockMessage>) {
        let focusing = app
            .lock()
            .map(|app| app.timer().is_focusing())
            .unwrap_or(false);

        if focusing {
            if !self.is_armed() {
                self.disarm();
                self.arm(Arc::clone(app), tx.clone());
            }
        } else {
            self.disarm();
        }
    }

    fn arm(&mut self, app: Arc<Mutex<App>>, tx: Sender<ClockMessage>) {
        let (stop_tx, stop_rx) = mpsc::channel();
        let interval = self.interval;
        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }

                let (outcome, title, mode) = {
                    let Ok(mut app) = app.lock() else { break };
                    let outcome = app.tick();
                    (outcome, format_title(app.timer()), app.timer().mode)
                };

                match outcome {
                    TickOutcome::Ignored => break,
                    TickOutcome::Counted => {
                        let _ = tx.send(ClockMessage::Tick { title });
                    }
                    TickOutcome::Completed => {
                        let _ = tx.send(ClockMessage::Tick { title });
                        let _ = tx.send(ClockMessage::Completed { mode });
                        break;
                    }
                }
            }
        });
        self.worker = Some(Worker { stop_tx, handle });
        log::debug!("clock armed");
    }

    /// Stops the worker thread, if any, and waits for it to exit.
    pub fn disarm(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                log::warn!("clock thread panicked");
            }
            log::debug!("clock disarmed");
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Database;

    fn shared_app(focus_mins: u32) -> Arc<Mutex<App>> {
        let mut app = App::with_db(Database::new_in_memory().unwrap()).unwrap();
        app.update_settings(|s| s.focus_duration = focus_mins).unwrap();
        Arc::new(Mutex::new(app))
    }

    #[test]
    fn test_sync_does_not_arm_when_idle() {
        let app = shared_app(1);
        let (tx, _rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(Duration::from_millis(1));

        ticker.sync(&app, &tx);
        assert!(!ticker.is_armed());
    }

    #[test]
    fn test_clock_runs_session_to_completion() {
        let app = shared_app(1);
        let (tx, rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(Duration::from_millis(1));

        app.lock().unwrap().start().unwrap();
        ticker.sync(&app, &tx);

        let mut ticks = 0;
        loop {
            match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
                ClockMessage::Tick { .. } => ticks += 1,
                ClockMessage::Completed { mode } => {
                    assert_eq!(mode, TimerMode::Focus);
                    break;
                }
            }
        }

        assert_eq!(ticks, 60);
        assert!(app.lock().unwrap().timer().is_completed());

        ticker.sync(&app, &tx);
        assert!(!ticker.is_armed());
    }

    #[test]
    fn test_pause_disarms_and_freezes_countdown() {
        let app = shared_app(25);
        let (tx, rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(Duration::from_millis(2));

        app.lock().unwrap().start().unwrap();
        ticker.sync(&app, &tx);
        assert!(ticker.is_armed());
        rx.recv_timeout(Duration::from_secs(10)).unwrap();

        app.lock().unwrap().pause().unwrap();
        ticker.sync(&app, &tx);
        assert!(!ticker.is_armed());

        let frozen = app.lock().unwrap().timer().time_left_secs;
        thread::sleep(Duration::from_millis(30));
        assert_eq!(app.lock().unwrap().timer().time_left_secs, frozen);
        assert!(frozen < 1500);

        app.lock().unwrap().resume().unwrap();
        ticker.sync(&app, &tx);
        assert!(ticker.is_armed());
    }

    #[test]
    fn test_rearming_keeps_a_single_worker() {
        let app = shared_app(25);
        let (tx, _rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(Duration::from_millis(50));

        app.lock().unwrap().start().unwrap();
        ticker.sync(&app, &tx);
        ticker.sync(&app, &tx);
        ticker.sync(&app, &tx);
        assert!(ticker.is_armed());

        thread::sleep(Duration::from_millis(120));
        ticker.disarm();

        // One worker at 50ms over ~120ms consumes about two seconds, never six.
        let left = app.lock().unwrap().timer().time_left_secs;
        assert!(left >= 1500 - 3, "countdown advanced too far: {}", left);
    }
}
