//! Form model for the training configuration editor.
//!
//! Every editable value lives in a control addressed by a stable id
//! (`batch_size`, `lstm_activation`, `resize_width`, ...). Text and number
//! controls hold the raw text the user typed; checkboxes hold a bool. The two
//! range controls (`dropout_rate`, `test_size`) mirror their value into a
//! visible label on every input event.
//!
//! [`ConfigForm::populate`] writes a [`TrainingConfig`] into the controls and
//! [`ConfigForm::form_data`] reads them back. Numbers are parsed the way a
//! browser form does: integers take the leading integer prefix of the text,
//! floats the leading decimal prefix.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::schema::{
    CnnConfig, DataConfig, ImageDataConfig, LstmConfig, ModelConfig, PathsConfig,
    ProcessingConfig, TextDataConfig, TrainingConfig, default_label_columns,
    default_required_columns,
};
use crate::client::ClientError;

static INT_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("integer regex must compile"));

static FLOAT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("float regex must compile")
});

// ---------------------------------------------------------------------------
// Control table
// ---------------------------------------------------------------------------

/// How a control stores and parses its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Integer,
    Float,
    Checkbox,
    /// Float slider whose value is mirrored into the named label.
    Range { label: &'static str },
}

/// One bound form control.
#[derive(Debug, Clone, Copy)]
pub struct ControlSpec {
    pub id: &'static str,
    pub kind: ControlKind,
    /// Section heading used when the form is displayed.
    pub section: &'static str,
}

const fn control(id: &'static str, kind: ControlKind, section: &'static str) -> ControlSpec {
    ControlSpec { id, kind, section }
}

/// Every control, in display order.
pub const CONTROLS: &[ControlSpec] = &[
    control("task_type", ControlKind::Text, "Data"),
    control("min_samples", ControlKind::Integer, "Data"),
    control("augment", ControlKind::Checkbox, "Data"),
    control("balance_classes", ControlKind::Checkbox, "Data"),
    control("color_mode", ControlKind::Text, "Image data"),
    control("image_format", ControlKind::Text, "Image data"),
    control("image_dir", ControlKind::Text, "Image data"),
    control("labels_file", ControlKind::Text, "Image data"),
    control("resize_width", ControlKind::Integer, "Image data"),
    control("resize_height", ControlKind::Integer, "Image data"),
    control("raw_path", ControlKind::Text, "Text data"),
    control("processed_path", ControlKind::Text, "Text data"),
    control("architecture", ControlKind::Text, "Model"),
    control("batch_size", ControlKind::Integer, "Model"),
    control("epochs", ControlKind::Integer, "Model"),
    control(
        "dropout_rate",
        ControlKind::Range {
            label: "dropout_value",
        },
        "Model",
    ),
    control("embedding_dim", ControlKind::Integer, "LSTM"),
    control("hidden_units", ControlKind::Integer, "LSTM"),
    control("lstm_activation", ControlKind::Text, "LSTM"),
    control("bidirectional", ControlKind::Checkbox, "LSTM"),
    control("filters", ControlKind::Integer, "CNN"),
    control("kernel_size", ControlKind::Integer, "CNN"),
    control("cnn_activation", ControlKind::Text, "CNN"),
    control("pooling", ControlKind::Text, "CNN"),
    control("max_len", ControlKind::Integer, "Processing"),
    control("max_words", ControlKind::Integer, "Processing"),
    control(
        "test_size",
        ControlKind::Range {
            label: "test_size_value",
        },
        "Processing",
    ),
    control("random_state", ControlKind::Integer, "Processing"),
    control("normalize", ControlKind::Checkbox, "Processing"),
    control("stratify", ControlKind::Checkbox, "Processing"),
    control("base_dir", ControlKind::Text, "Paths"),
    control("data_dir", ControlKind::Text, "Paths"),
    control("artifacts_dir", ControlKind::Text, "Paths"),
    control("model_path", ControlKind::Text, "Paths"),
    control("encoder_path", ControlKind::Text, "Paths"),
    control("tokenizer_path", ControlKind::Text, "Paths"),
    control("tflite_path", ControlKind::Text, "Paths"),
];

/// Look up a control by id.
pub fn find_control(id: &str) -> Option<&'static ControlSpec> {
    CONTROLS.iter().find(|c| c.id == id)
}

// ---------------------------------------------------------------------------
// Control values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Text(String),
    Checked(bool),
}

impl ControlValue {
    /// Text shown for the control.
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Checked(true) => "[x]".to_string(),
            Self::Checked(false) => "[ ]".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// The editor's form state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigForm {
    controls: BTreeMap<&'static str, ControlValue>,
    labels: BTreeMap<&'static str, String>,
}

impl Default for ConfigForm {
    /// A form populated from the built-in default configuration, so sections
    /// the server omits still serialize to sane values.
    fn default() -> Self {
        let mut form = Self::blank();
        form.populate(&TrainingConfig::default());
        form
    }
}

impl ConfigForm {
    /// A form with empty text controls and unchecked boxes.
    pub fn blank() -> Self {
        let controls = CONTROLS
            .iter()
            .map(|spec| {
                let value = match spec.kind {
                    ControlKind::Checkbox => ControlValue::Checked(false),
                    _ => ControlValue::Text(String::new()),
                };
                (spec.id, value)
            })
            .collect();
        let labels = CONTROLS
            .iter()
            .filter_map(|spec| match spec.kind {
                ControlKind::Range { label } => Some((label, String::new())),
                _ => None,
            })
            .collect();
        Self { controls, labels }
    }

    /// Current value of a control.
    pub fn value(&self, id: &str) -> Option<&ControlValue> {
        self.controls.get(id)
    }

    /// Text of a visible label (`dropout_value`, `test_size_value`).
    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Handle a user input event on a control.
    ///
    /// Checkbox input accepts `1`/`true`/`yes`/`on` (anything else unchecks).
    /// Number controls accept any text; it is only parsed on save. Range
    /// controls also update their label.
    pub fn input(&mut self, id: &str, raw: &str) -> Result<(), ClientError> {
        let spec = find_control(id).ok_or_else(|| ClientError::UnknownField(id.to_string()))?;
        match spec.kind {
            ControlKind::Checkbox => {
                let checked = matches!(
                    raw.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on" | "x"
                );
                self.controls.insert(spec.id, ControlValue::Checked(checked));
            }
            _ => self.set_text(spec.id, raw.to_string()),
        }
        Ok(())
    }

    fn set_text(&mut self, id: &'static str, text: String) {
        if let Some(ControlKind::Range { label }) = find_control(id).map(|s| s.kind) {
            self.labels.insert(label, text.clone());
        }
        self.controls.insert(id, ControlValue::Text(text));
    }

    fn set_checked(&mut self, id: &'static str, checked: bool) {
        self.controls.insert(id, ControlValue::Checked(checked));
    }

    // -- populate --

    /// Write every bound value of `config` into the controls.
    ///
    /// Optional sub-sections that are absent leave their controls untouched.
    pub fn populate(&mut self, config: &TrainingConfig) {
        let data = &config.data;
        self.set_checked("augment", data.augment);
        self.set_checked("balance_classes", data.balance_classes);
        self.set_text("task_type", data.task_type.clone());
        self.set_text("min_samples", data.min_samples.to_string());

        if let Some(image) = &data.image_data {
            self.set_text("color_mode", image.color_mode.clone());
            self.set_text("image_format", image.image_format.clone());
            self.set_text("image_dir", image.image_dir.clone());
            self.set_text("labels_file", image.labels_file.clone());
            if let Some([width, height]) = image.resize_to {
                self.set_text("resize_width", width.to_string());
                self.set_text("resize_height", height.to_string());
            }
        }

        if let Some(text) = &data.text_data {
            self.set_text("raw_path", text.raw_path.clone());
            self.set_text("processed_path", text.processed_path.clone());
        }

        let model = &config.model;
        self.set_text("architecture", model.architecture.clone());
        self.set_text("batch_size", model.batch_size.to_string());
        self.set_text("epochs", model.epochs.to_string());
        self.set_text("dropout_rate", model.dropout_rate.to_string());

        if let Some(lstm) = &model.lstm {
            self.set_text("embedding_dim", lstm.embedding_dim.to_string());
            self.set_text("hidden_units", lstm.hidden_units.to_string());
            self.set_text("lstm_activation", lstm.activation.clone());
            self.set_checked("bidirectional", lstm.bidirectional);
        }

        if let Some(cnn) = &model.cnn {
            self.set_text("filters", cnn.filters.to_string());
            self.set_text("kernel_size", cnn.kernel_size.to_string());
            self.set_text("cnn_activation", cnn.activation.clone());
            self.set_text("pooling", cnn.pooling.clone());
        }

        let processing = &config.processing;
        self.set_text("max_len", processing.max_len.to_string());
        self.set_text("max_words", processing.max_words.to_string());
        self.set_text("test_size", processing.test_size.to_string());
        self.set_text("random_state", processing.random_state.to_string());
        self.set_checked("normalize", processing.normalize);
        self.set_checked("stratify", processing.stratify);

        let paths = &config.paths;
        self.set_text("base_dir", paths.base_dir.clone());
        self.set_text("data_dir", paths.data_dir.clone());
        self.set_text("artifacts_dir", paths.artifacts_dir.clone());
        self.set_text("model_path", model.model_path.clone());
        self.set_text("encoder_path", model.encoder_path.clone());
        self.set_text("tokenizer_path", model.tokenizer_path.clone());
        self.set_text("tflite_path", model.tflite_path.clone());
    }

    // -- read back --

    /// Serialize the controls into a full configuration.
    ///
    /// Every optional sub-section is emitted. `required_columns` and
    /// `label_columns` are not editable and always carry their defaults.
    /// A loaded config whose `image_data`, `resize_to`, `lstm`, or `cnn` was
    /// absent therefore reads back with those filled from the controls.
    pub fn form_data(&self) -> Result<TrainingConfig, ClientError> {
        Ok(TrainingConfig {
            data: DataConfig {
                augment: self.checked("augment"),
                balance_classes: self.checked("balance_classes"),
                task_type: self.text("task_type"),
                min_samples: self.int("min_samples")?,
                image_data: Some(ImageDataConfig {
                    color_mode: self.text("color_mode"),
                    image_format: self.text("image_format"),
                    image_dir: self.text("image_dir"),
                    labels_file: self.text("labels_file"),
                    resize_to: Some([self.int("resize_width")?, self.int("resize_height")?]),
                }),
                text_data: Some(TextDataConfig {
                    raw_path: self.text("raw_path"),
                    processed_path: self.text("processed_path"),
                    required_columns: default_required_columns(),
                    label_columns: default_label_columns(),
                }),
            },
            model: ModelConfig {
                architecture: self.text("architecture"),
                batch_size: self.int("batch_size")?,
                epochs: self.int("epochs")?,
                dropout_rate: self.float("dropout_rate")?,
                lstm: Some(LstmConfig {
                    embedding_dim: self.int("embedding_dim")?,
                    hidden_units: self.int("hidden_units")?,
                    activation: self.text("lstm_activation"),
                    bidirectional: self.checked("bidirectional"),
                }),
                cnn: Some(CnnConfig {
                    filters: self.int("filters")?,
                    kernel_size: self.int("kernel_size")?,
                    activation: self.text("cnn_activation"),
                    pooling: self.text("pooling"),
                }),
                model_path: self.text("model_path"),
                encoder_path: self.text("encoder_path"),
                tokenizer_path: self.text("tokenizer_path"),
                tflite_path: self.text("tflite_path"),
            },
            processing: ProcessingConfig {
                max_len: self.int("max_len")?,
                max_words: self.int("max_words")?,
                test_size: self.float("test_size")?,
                random_state: self.int("random_state")?,
                normalize: self.checked("normalize"),
                stratify: self.checked("stratify"),
            },
            paths: PathsConfig {
                base_dir: self.text("base_dir"),
                data_dir: self.text("data_dir"),
                artifacts_dir: self.text("artifacts_dir"),
            },
        })
    }

    fn text(&self, id: &str) -> String {
        match self.controls.get(id) {
            Some(ControlValue::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }

    fn checked(&self, id: &str) -> bool {
        matches!(self.controls.get(id), Some(ControlValue::Checked(true)))
    }

    fn int(&self, id: &str) -> Result<i64, ClientError> {
        let text = self.text(id);
        parse_int(&text).ok_or_else(|| ClientError::InvalidNumber {
            field: id.to_string(),
            value: text,
        })
    }

    fn float(&self, id: &str) -> Result<f64, ClientError> {
        let text = self.text(id);
        parse_float(&text).ok_or_else(|| ClientError::InvalidNumber {
            field: id.to_string(),
            value: text,
        })
    }
}

/// Parse the leading integer of `text` (`"12px"` → 12, `"3.9"` → 3).
pub fn parse_int(text: &str) -> Option<i64> {
    INT_PREFIX_RE.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Parse the leading decimal number of `text` (`"0.25 "` → 0.25).
pub fn parse_float(text: &str) -> Option<f64> {
    let value: f64 = FLOAT_PREFIX_RE.captures(text)?.get(1)?.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
