/// Client and controller tests against an in-process mock backend.
///
/// Covers the HTTP contract (`/config`, `/logs`, `/logs/clear`), error
/// classification, and the editor/log viewer flows end to end.
mod common;

use std::time::Duration;

use common::{MockBackend, MockState, sample_logs};
use serde_json::json;
use trainboard::client::{Backend, ClientError, ErrorKind, HttpBackend};
use trainboard::dashboard::logs::{LogStats, LogViewer, NO_LOGS};
use trainboard::editor::{ConfigEditor, LOAD_FAILURE, SAVE_SUCCESS, TrainingConfig};
use trainboard::notice::{NoticeKind, NullSink};

fn backend(mock: &MockBackend) -> HttpBackend {
    HttpBackend::new(&mock.base_url(), Some(Duration::from_secs(5)))
}

fn with_config() -> MockState {
    MockState {
        config: serde_json::to_value(TrainingConfig::default()).unwrap(),
        logs: sample_logs(),
        ..MockState::default()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn load_edit_save_round_trips_through_server() {
    let mock = MockBackend::start(with_config());
    let backend = backend(&mock);
    let mut editor = ConfigEditor::new(&backend, NullSink);

    editor.load_config().unwrap();
    editor.input("epochs", "25").unwrap();
    editor.input("architecture", "cnn").unwrap();
    editor.input("test_size", "0.25").unwrap();
    let ack = editor.save_config().unwrap();

    assert_eq!(ack["message"], "Configuration updated");
    assert_eq!(editor.notices().visible().unwrap().message, SAVE_SUCCESS);

    let saved = mock.state.lock().unwrap().saved.clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["model"]["epochs"], 25);
    assert_eq!(saved[0]["model"]["architecture"], "cnn");
    assert_eq!(saved[0]["processing"]["test_size"], 0.25);
    assert_eq!(saved[0]["data"]["text_data"]["required_columns"], json!(["text"]));

    let reloaded = backend.fetch_config().unwrap();
    assert_eq!(reloaded.model.epochs, 25);
}

#[test]
fn save_body_mirrors_loaded_shape() {
    let mock = MockBackend::start(with_config());
    let backend = backend(&mock);
    let mut editor = ConfigEditor::new(&backend, NullSink);
    editor.load_config().unwrap();
    editor.save_config().unwrap();

    let state = mock.state.lock().unwrap();
    let served = serde_json::to_value(TrainingConfig::default()).unwrap();
    assert_eq!(state.saved[0], served);
    let sections: Vec<_> = state.saved[0].as_object().unwrap().keys().cloned().collect();
    assert_eq!(sections, vec!["data", "model", "paths", "processing"]);
}

#[test]
fn server_error_is_network_failure_and_keeps_form() {
    let mock = MockBackend::start(MockState {
        fail_with: Some(503),
        ..with_config()
    });
    let backend = backend(&mock);
    let mut editor = ConfigEditor::new(&backend, NullSink);
    editor.input("batch_size", "64").unwrap();

    let err = editor.load_config().unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 503, .. }));
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(editor.form_data().unwrap().model.batch_size, 64);
    let notice = editor.notices().visible().unwrap();
    assert_eq!(notice.kind, NoticeKind::Danger);
    assert_eq!(notice.message, LOAD_FAILURE);
}

#[test]
fn malformed_body_is_format_failure() {
    let mock = MockBackend::start(MockState {
        raw_config: Some("{not json".to_string()),
        ..with_config()
    });
    let err = backend(&mock).fetch_config().unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[test]
fn level_query_is_sent_and_filter_applied() {
    let mock = MockBackend::start(with_config());
    let backend = backend(&mock);
    let mut viewer = LogViewer::new();

    let ticket = viewer.begin_fetch(Some("ERROR"));
    let records = backend.fetch_logs(ticket.level()).unwrap();
    assert!(viewer.apply(&ticket, records));

    assert_eq!(viewer.filtered().len(), 1);
    assert_eq!(viewer.filtered()[0].message, "NaN loss");
    assert!(
        mock.state
            .lock()
            .unwrap()
            .requests
            .contains(&"GET /logs?level=ERROR".to_string())
    );
}

#[test]
fn lowercase_level_flag_still_shows_server_records() {
    let mock = MockBackend::start(with_config());
    let backend = backend(&mock);
    let mut viewer = LogViewer::new();

    let ticket = viewer.begin_fetch(Some("critical"));
    viewer.apply(&ticket, backend.fetch_logs(ticket.level()).unwrap());

    assert_eq!(viewer.filtered().len(), 1);
    assert_eq!(viewer.filtered()[0].message, "CUDA out of memory");
    assert_eq!(viewer.placeholder(), None);
    assert!(
        mock.state
            .lock()
            .unwrap()
            .requests
            .contains(&"GET /logs?level=CRITICAL".to_string())
    );
}

#[test]
fn unfiltered_fetch_counts_levels() {
    let mock = MockBackend::start(with_config());
    let backend = backend(&mock);
    let mut viewer = LogViewer::new();
    let ticket = viewer.begin_fetch(None);
    viewer.apply(&ticket, backend.fetch_logs(None).unwrap());

    assert_eq!(
        viewer.stats(),
        LogStats {
            total: 5,
            errors: 2,
            warnings: 1,
        }
    );
    let rows = viewer.rows();
    assert_eq!(rows[3].module, "System");
    assert_eq!(rows[0].context, "{}");
}

#[test]
fn clear_then_fetch_yields_empty_list_and_placeholder() {
    let mock = MockBackend::start(with_config());
    let backend = backend(&mock);

    backend.clear_logs().unwrap();
    let mut viewer = LogViewer::new();
    let ticket = viewer.begin_fetch(None);
    viewer.apply(&ticket, backend.fetch_logs(None).unwrap());

    assert!(viewer.logs().is_empty());
    assert_eq!(viewer.stats(), LogStats::default());
    assert_eq!(viewer.placeholder(), Some(NO_LOGS));
}

#[test]
fn unreachable_backend_is_network_failure() {
    let backend = HttpBackend::new("http://127.0.0.1:9", Some(Duration::from_millis(300)));
    let err = backend.clear_logs().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
