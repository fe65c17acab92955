//! Figurine Focus - a local-first focus timer with streaks and achievements.
//!
//! This binary is a headless console front end: it reads commands from
//! stdin, drives the timer with a 1 Hz clock while a session is running and
//! keeps statistics in a local SQLite database. Pass a path as the first
//! argument to use a database other than the per-user default.

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

mod app;
mod clock;
mod event;
mod insights;
mod ledger;
mod models;
mod persistence;
mod tasks;
mod timer;

use app::App;
use clock::{ClockMessage, Ticker};
use event::EventResult;
use persistence::Database;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Initialize app state
    let app = match std::env::args().nth(1) {
        Some(path) => App::with_db(Database::open(Path::new(&path))?)?,
        None => App::new()?,
    };
    let app = Arc::new(Mutex::new(app));

    // Clock messages are reported from their own thread so input is never blocked
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for message in rx {
            match message {
                ClockMessage::Tick { title } => log::trace!("{}", title),
                ClockMessage::Completed { mode } => {
                    println!("{} session complete, type `confirm` to continue", mode.label());
                }
            }
        }
    });

    let mut ticker = Ticker::new();

    println!("{}", event::HELP);
    {
        let app = app.lock().map_err(|_| "app state poisoned")?;
        println!("{}", timer::format_title(app.timer()));
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        let result = {
            let mut app = app.lock().map_err(|_| "app state poisoned")?;
            event::handle_command(&mut app, &line)
        };

        // Lock released: re-arm or tear down the clock for the new status
        ticker.sync(&app, &tx);

        match result {
            EventResult::Quit => break,
            EventResult::Output(text) => println!("{}", text),
            EventResult::Continue => {}
        }
    }

    ticker.disarm();
    Ok(())
}
