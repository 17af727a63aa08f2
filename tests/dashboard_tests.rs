/// Dashboard session tests driven entirely through `SessionEvent`s, the way
/// the monitor loop feeds them.
use serde_json::json;
use trainboard::client::{ClientError, LogRecord};
use trainboard::dashboard::charts::{DARK_PALETTE, LIGHT_PALETTE};
use trainboard::dashboard::logs::{LogTicket, NO_LOGS};
use trainboard::dashboard::metrics::{Metric, StatusTier};
use trainboard::dashboard::theme::{MemoryStore, Theme, ThemeManager};
use trainboard::dashboard::{
    Command, DashboardSession, Effect, Key, LOGS_FETCH_FAILURE, SessionEvent, parse_input,
};
use trainboard::feed::{FeedEvent, PerformanceSample};
use trainboard::settings::schema::DashboardSettings;

fn session() -> DashboardSession<MemoryStore> {
    DashboardSession::new(
        ThemeManager::new(MemoryStore::default(), None),
        &DashboardSettings::default(),
    )
}

fn sample(cpu: f64) -> SessionEvent {
    SessionEvent::Feed(FeedEvent::Performance(PerformanceSample::new(
        cpu, 50.0, 10.0, 20.0,
    )))
}

fn record(level: &str, message: &str) -> LogRecord {
    serde_json::from_value(json!({
        "timestamp": "2024-05-01T12:00:00",
        "level": level,
        "module": "trainer",
        "message": message,
        "context": "{}",
    }))
    .unwrap()
}

fn ticket_of(effect: Option<Effect>) -> LogTicket {
    match effect {
        Some(Effect::FetchLogs(ticket)) => ticket,
        other => panic!("expected a log fetch, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[test]
fn twenty_first_sample_evicts_the_oldest() {
    let mut session = session();
    for i in 1..=21 {
        session.handle(sample(f64::from(i)));
    }

    let cpu: Vec<f64> = session.buffer().series(Metric::Cpu).iter().copied().collect();
    assert_eq!(cpu.len(), 20);
    assert_eq!(cpu[0], 2.0);
    assert_eq!(cpu[19], 21.0);
    assert_eq!(session.buffer().timestamps().len(), 20);

    let overview = session.charts().overview();
    assert_eq!(overview.labels.len(), 20);
    assert!(overview.datasets.iter().all(|d| d.data.len() == 20));
    assert!(!overview.last_redraw_animated());
}

#[test]
fn card_tiers_switch_strictly_above_thresholds() {
    let mut session = session();
    let cases = [
        (60.0, StatusTier::Normal),
        (60.1, StatusTier::Warning),
        (80.0, StatusTier::Warning),
        (80.1, StatusTier::Critical),
    ];
    for (cpu, tier) in cases {
        session.handle(sample(cpu));
        assert_eq!(session.card(Metric::Cpu).tier(), tier, "cpu = {cpu}");
    }
    assert_eq!(session.card(Metric::Cpu).display_value(), "80.1%");
}

#[test]
fn missing_gpu_reads_na_and_charts_zero() {
    let mut session = session();
    session.handle(SessionEvent::Feed(FeedEvent::Performance(PerformanceSample {
        cpu_percent: Some(5.0),
        ram_percent: Some(6.0),
        gpu_percent: None,
        gpu_memory_percent: None,
    })));

    let gpu = session.card(Metric::Gpu);
    assert_eq!(gpu.display_value(), "N/A");
    assert_eq!(gpu.tier(), StatusTier::Neutral);
    assert_eq!(session.buffer().series(Metric::Gpu).back(), Some(&0.0));
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[test]
fn toggling_twice_restores_palette_and_records_preference() {
    let mut session = session();
    session.handle(sample(10.0));
    let before: Vec<_> = session.charts().iter().cloned().collect();

    session.handle(SessionEvent::Command(Command::ToggleTheme));
    assert_eq!(session.theme(), Theme::Dark);
    assert!(std::ptr::eq(session.charts().palette(), &DARK_PALETTE));
    assert_eq!(session.themes().store().value, Some(Theme::Dark));

    session.handle(parse_input("^D").unwrap());
    assert_eq!(session.theme(), Theme::Light);
    assert!(std::ptr::eq(session.charts().palette(), &LIGHT_PALETTE));
    assert_eq!(session.themes().store().value, Some(Theme::Light));

    let after: Vec<_> = session.charts().iter().cloned().collect();
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.datasets, new.datasets);
        assert_eq!(old.labels, new.labels);
    }
}

#[test]
fn system_change_is_ignored_once_user_has_chosen() {
    let mut session = session();
    session.handle(SessionEvent::SystemTheme(Theme::Dark));
    assert_eq!(session.theme(), Theme::Dark);

    session.handle(SessionEvent::Command(Command::ToggleTheme));
    session.handle(SessionEvent::SystemTheme(Theme::Dark));
    assert_eq!(session.theme(), Theme::Light);
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[test]
fn stale_response_never_overwrites_newer_one() {
    let mut session = session();
    let first = ticket_of(Some(session.fetch_logs(None)));
    let second = ticket_of(session.handle(parse_input("l error").unwrap()));
    assert_eq!(second.level(), Some("ERROR"));

    session.handle(SessionEvent::LogsLoaded {
        ticket: second,
        result: Ok(vec![record("ERROR", "NaN loss")]),
    });
    session.handle(SessionEvent::LogsLoaded {
        ticket: first,
        result: Ok(vec![record("INFO", "old"), record("DEBUG", "older")]),
    });

    assert!(!session.is_loading());
    assert_eq!(session.logs().filter(), Some("ERROR"));
    assert_eq!(session.logs().logs().len(), 1);
    assert_eq!(session.logs().logs()[0].message, "NaN loss");
}

#[test]
fn clearing_the_filter_shows_every_level_again() {
    let mut session = session();
    let all = vec![
        record("INFO", "a"),
        record("ERROR", "b"),
        record("WARNING", "c"),
    ];

    let ticket = ticket_of(session.handle(parse_input("l ERROR").unwrap()));
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Ok(vec![record("ERROR", "b")]),
    });
    assert_eq!(session.logs().filtered().len(), 1);

    let ticket = ticket_of(session.handle(parse_input("l all").unwrap()));
    assert_eq!(ticket.level(), None);
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Ok(all),
    });
    assert_eq!(session.logs().filter(), None);
    assert_eq!(session.logs().filtered().len(), 3);
}

#[test]
fn clear_refetches_with_active_filter_and_shows_placeholder() {
    let mut session = session();
    let ticket = ticket_of(session.handle(parse_input("l WARNING").unwrap()));
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Ok(vec![record("WARNING", "slow epoch")]),
    });

    assert_eq!(
        session.handle(parse_input("c").unwrap()),
        Some(Effect::ClearLogs)
    );
    assert!(session.is_loading());

    let ticket = ticket_of(session.handle(SessionEvent::LogsCleared(Ok(()))));
    assert_eq!(ticket.level(), Some("WARNING"));
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Ok(Vec::new()),
    });

    assert_eq!(session.logs().placeholder(), Some(NO_LOGS));
    assert_eq!(session.logs().stats().total, 0);
    assert!(!session.is_loading());
}

#[test]
fn fetch_in_flight_during_clear_does_not_end_loading() {
    let mut session = session();
    let in_flight = ticket_of(Some(session.fetch_logs(None)));
    assert_eq!(session.handle(parse_input("c").unwrap()), Some(Effect::ClearLogs));

    session.handle(SessionEvent::LogsLoaded {
        ticket: in_flight,
        result: Ok(vec![record("INFO", "before clear")]),
    });
    assert!(session.is_loading());
    assert!(session.logs().logs().is_empty());

    let ticket = ticket_of(session.handle(SessionEvent::LogsCleared(Ok(()))));
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Ok(Vec::new()),
    });
    assert!(!session.is_loading());
}

#[test]
fn failed_fetch_keeps_previous_logs_and_notifies() {
    let mut session = session();
    let ticket = ticket_of(Some(session.fetch_logs(None)));
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Ok(vec![record("INFO", "kept")]),
    });

    let ticket = ticket_of(session.handle(SessionEvent::Key(Key::Ctrl('r'))));
    session.handle(SessionEvent::LogsLoaded {
        ticket,
        result: Err(ClientError::Status {
            url: "http://localhost:5000/logs".to_string(),
            status: 500,
        }),
    });

    assert_eq!(session.logs().logs()[0].message, "kept");
    assert_eq!(session.notices().visible().unwrap().message, LOGS_FETCH_FAILURE);
    assert!(!session.is_loading());
}

#[test]
fn quit_command_asks_the_loop_to_stop() {
    let mut session = session();
    assert_eq!(session.handle(parse_input("q").unwrap()), Some(Effect::Quit));
    assert_eq!(parse_input("bogus"), None);
    assert_eq!(session.handle(SessionEvent::Tick), None);
}
