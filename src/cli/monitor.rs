//! `trainboard monitor`: the live dashboard event loop.
//!
//! One thread owns the [`DashboardSession`]. Helper threads read the push
//! channel, read stdin, tick the clock, watch the system appearance, and run
//! log requests. All of them only send [`SessionEvent`]s into a single
//! channel.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::theme_manager;
use crate::client::{Backend, HttpBackend};
use crate::dashboard::logs::LogTicket;
use crate::dashboard::theme::{self, AppearanceWatch, PreferenceStore};
use crate::dashboard::{DashboardSession, Effect, SessionEvent, parse_input};
use crate::diagnostics;
use crate::feed::PushChannel;
use crate::render::{self, CLEAR_SCREEN};
use crate::settings;

/// Interval of the redraw tick.
const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// How often `[theme] system` and `COLORFGBG` are re-read.
const APPEARANCE_INTERVAL: Duration = Duration::from_secs(2);

pub fn run_monitor(level: Option<&str>) -> Result<()> {
    let settings = settings::load();
    let backend = HttpBackend::from_settings(&settings.server);
    let channel = PushChannel::from_settings(&settings.server);
    let mut session = DashboardSession::new(theme_manager(&settings), &settings.dashboard);

    let (tx, rx) = mpsc::channel::<SessionEvent>();
    let stop = Arc::new(AtomicBool::new(false));

    {
        let tx = tx.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || channel.run(&tx, &stop));
    }
    spawn_stdin_reader(tx.clone());
    {
        let tx = tx.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(TICK_INTERVAL);
                if tx.send(SessionEvent::Tick).is_err() {
                    break;
                }
            }
        });
    }

    spawn_appearance_watch(
        AppearanceWatch::new(theme::system_appearance(settings.theme.system)),
        tx.clone(),
        Arc::clone(&stop),
    );

    diagnostics::info("monitor", "session started");
    let mut pending = Some(session.fetch_logs(level));
    loop {
        if let Some(effect) = pending.take() {
            match effect {
                Effect::Quit => break,
                Effect::FetchLogs(ticket) => spawn_fetch(&backend, ticket, &tx),
                Effect::ClearLogs => spawn_clear(&backend, &tx),
            }
        }

        draw(&session, settings.dashboard.log_rows);

        let Ok(event) = rx.recv() else {
            break;
        };
        pending = session.handle(event);
    }

    stop.store(true, Ordering::Relaxed);
    diagnostics::info("monitor", "session ended");
    Ok(())
}

fn draw<P: PreferenceStore>(session: &DashboardSession<P>, log_rows: usize) {
    let screen = render::render_dashboard(session, log_rows, Instant::now());
    let mut stdout = io::stdout().lock();
    // A closed stdout only means nobody is watching.
    let _ = write!(stdout, "{CLEAR_SCREEN}{screen}> ");
    let _ = stdout.flush();
}

fn spawn_stdin_reader(tx: Sender<SessionEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(event) = parse_input(&line)
                && tx.send(event).is_err()
            {
                break;
            }
        }
    });
}

/// Re-resolve the system appearance from fresh settings and report changes.
fn spawn_appearance_watch(
    mut watch: AppearanceWatch,
    tx: Sender<SessionEvent>,
    stop: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(APPEARANCE_INTERVAL);
            let current = theme::system_appearance(settings::load().theme.system);
            if let Some(theme) = watch.observe(current)
                && tx.send(SessionEvent::SystemTheme(theme)).is_err()
            {
                break;
            }
        }
    });
}

fn spawn_fetch(backend: &HttpBackend, ticket: LogTicket, tx: &Sender<SessionEvent>) {
    let backend = backend.clone();
    let tx = tx.clone();
    thread::spawn(move || {
        let result = backend.fetch_logs(ticket.level());
        let _ = tx.send(SessionEvent::LogsLoaded { ticket, result });
    });
}

fn spawn_clear(backend: &HttpBackend, tx: &Sender<SessionEvent>) {
    let backend = backend.clone();
    let tx = tx.clone();
    thread::spawn(move || {
        let _ = tx.send(SessionEvent::LogsCleared(backend.clear_logs()));
    });
}
