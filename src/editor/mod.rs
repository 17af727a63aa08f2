//! Training configuration editor.
//!
//! [`ConfigEditor`] owns the last configuration fetched from the backend and
//! the form the user edits. Loading replaces both; saving serializes the
//! form and posts it. Every outcome is reported as a notice and no failure
//! leaves the editor unusable: a failed load keeps the previous form, a
//! failed save keeps the user's edits.

pub mod form;
pub mod schema;

use crate::client::{Backend, ClientError};
use crate::diagnostics;
use crate::notice::{NoticeBoard, NoticeKind, StatusSink};

pub use form::{ConfigForm, ControlKind, ControlValue, CONTROLS};
pub use schema::TrainingConfig;

pub const LOAD_SUCCESS: &str = "Configuration loaded successfully!";
pub const LOAD_FAILURE: &str =
    "Failed to load configuration. Please check if the server is running.";
pub const SAVE_SUCCESS: &str = "Configuration saved successfully!";
pub const SAVE_FAILURE: &str = "Failed to save configuration. Please try again.";

pub struct ConfigEditor<B: Backend, S: StatusSink> {
    backend: B,
    sink: S,
    config: Option<TrainingConfig>,
    form: ConfigForm,
    notices: NoticeBoard,
}

impl<B: Backend, S: StatusSink> ConfigEditor<B, S> {
    pub fn new(backend: B, sink: S) -> Self {
        Self {
            backend,
            sink,
            config: None,
            form: ConfigForm::default(),
            notices: NoticeBoard::default(),
        }
    }

    /// `GET /config` and repopulate the form.
    pub fn load_config(&mut self) -> Result<(), ClientError> {
        self.sink.loading(true);
        let result = self.backend.fetch_config();
        self.sink.loading(false);

        match result {
            Ok(config) => {
                self.form.populate(&config);
                self.config = Some(config);
                self.notify(NoticeKind::Success, LOAD_SUCCESS);
                Ok(())
            }
            Err(e) => {
                diagnostics::error("editor", &format!("error loading config: {e}"));
                self.notify(NoticeKind::Danger, LOAD_FAILURE);
                Err(e)
            }
        }
    }

    /// Serialize the form and `POST /config`.
    ///
    /// Returns the server's acknowledgement.
    pub fn save_config(&mut self) -> Result<serde_json::Value, ClientError> {
        self.sink.loading(true);
        let result = self
            .form
            .form_data()
            .and_then(|config| self.backend.save_config(&config));
        self.sink.loading(false);

        match result {
            Ok(ack) => {
                self.notify(NoticeKind::Success, SAVE_SUCCESS);
                Ok(ack)
            }
            Err(e) => {
                diagnostics::error("editor", &format!("error saving config: {e}"));
                self.notify(NoticeKind::Danger, SAVE_FAILURE);
                Err(e)
            }
        }
    }

    /// Forward a user input event to the form.
    pub fn input(&mut self, id: &str, value: &str) -> Result<(), ClientError> {
        self.form.input(id, value)
    }

    /// Replace the form contents with `config`, as if it had been loaded.
    pub fn populate(&mut self, config: &TrainingConfig) {
        self.form.populate(config);
    }

    /// Configuration the form would currently save.
    pub fn form_data(&self) -> Result<TrainingConfig, ClientError> {
        self.form.form_data()
    }

    /// Last configuration received from the backend.
    pub fn config(&self) -> Option<&TrainingConfig> {
        self.config.as_ref()
    }

    pub fn form(&self) -> &ConfigForm {
        &self.form
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    fn notify(&mut self, kind: NoticeKind, message: &str) {
        let notice = self.notices.show(kind, message).clone();
        self.sink.notice(&notice);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::client::LogRecord;
    use crate::notice::{Notice, NullSink};

    #[derive(Default)]
    struct StubBackend {
        config: Option<TrainingConfig>,
        saved: RefCell<Vec<TrainingConfig>>,
    }

    impl Backend for StubBackend {
        fn fetch_config(&self) -> Result<TrainingConfig, ClientError> {
            self.config.clone().ok_or(ClientError::Status {
                url: "/config".to_string(),
                status: 500,
            })
        }

        fn save_config(&self, config: &TrainingConfig) -> Result<serde_json::Value, ClientError> {
            self.saved.borrow_mut().push(config.clone());
            Ok(serde_json::json!({"message": "ok"}))
        }

        fn fetch_logs(&self, _level: Option<&str>) -> Result<Vec<LogRecord>, ClientError> {
            Ok(Vec::new())
        }

        fn clear_logs(&self) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        loading: Vec<bool>,
        notices: Vec<Notice>,
    }

    impl StatusSink for Recorder {
        fn loading(&mut self, active: bool) {
            self.loading.push(active);
        }
        fn notice(&mut self, notice: &Notice) {
            self.notices.push(notice.clone());
        }
    }

    #[test]
    fn failed_load_keeps_previous_form() {
        let backend = StubBackend::default();
        let mut editor = ConfigEditor::new(&backend, NullSink);
        editor.input("epochs", "77").unwrap();

        assert!(editor.load_config().is_err());
        assert!(editor.config().is_none());
        assert_eq!(editor.form_data().unwrap().model.epochs, 77);
        let notice = editor.notices().visible().unwrap();
        assert_eq!(notice.kind, NoticeKind::Danger);
        assert_eq!(notice.message, LOAD_FAILURE);
    }

    #[test]
    fn load_toggles_loading_and_reports_success() {
        let mut config = TrainingConfig::default();
        config.model.architecture = "cnn".to_string();
        let backend = StubBackend {
            config: Some(config.clone()),
            ..StubBackend::default()
        };
        let mut recorder = Recorder::default();

        let mut editor = ConfigEditor::new(&backend, &mut recorder);
        editor.load_config().unwrap();
        assert_eq!(editor.config(), Some(&config));
        drop(editor);

        assert_eq!(recorder.loading, vec![true, false]);
        assert_eq!(recorder.notices.len(), 1);
        assert_eq!(recorder.notices[0].message, LOAD_SUCCESS);
    }

    #[test]
    fn invalid_number_blocks_save() {
        let backend = StubBackend::default();
        let mut editor = ConfigEditor::new(&backend, NullSink);
        editor.input("batch_size", "").unwrap();

        assert!(editor.save_config().is_err());
        assert!(backend.saved.borrow().is_empty());
        assert_eq!(editor.notices().visible().unwrap().message, SAVE_FAILURE);
    }

    #[test]
    fn save_posts_form_data() {
        let backend = StubBackend::default();
        let mut editor = ConfigEditor::new(&backend, NullSink);
        editor.input("dropout_rate", "0.5").unwrap();
        editor.input("bidirectional", "true").unwrap();

        let ack = editor.save_config().unwrap();
        assert_eq!(ack["message"], "ok");

        let saved = backend.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].model.dropout_rate, 0.5);
        assert!(saved[0].model.lstm.as_ref().unwrap().bidirectional);
        assert_eq!(editor.form().label("dropout_value"), Some("0.5"));
    }
}
