//! Training configuration served by the backend at `/config`.
//!
//! The JSON shape is fixed by the backend: four sections (`data`, `model`,
//! `processing`, `paths`) with optional image/text and LSTM/CNN
//! sub-sections. Defaults mirror the backend's own built-in configuration.

use serde::{Deserialize, Serialize};

/// The full training configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub processing: ProcessingConfig,
    pub paths: PathsConfig,
}

// ---------------------------------------------------------------------------
// data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub augment: bool,
    pub balance_classes: bool,
    /// `text_classification` or `image_classification`.
    pub task_type: String,
    pub min_samples: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageDataConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_data: Option<TextDataConfig>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            augment: false,
            balance_classes: false,
            task_type: "text_classification".to_string(),
            min_samples: 100,
            image_data: Some(ImageDataConfig::default()),
            text_data: Some(TextDataConfig::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDataConfig {
    /// `rgb` or `grayscale`.
    pub color_mode: String,
    pub image_format: String,
    pub image_dir: String,
    pub labels_file: String,
    /// Target `[width, height]` after resizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_to: Option<[i64; 2]>,
}

impl Default for ImageDataConfig {
    fn default() -> Self {
        Self {
            color_mode: "rgb".to_string(),
            image_format: "jpg".to_string(),
            image_dir: "data/images".to_string(),
            labels_file: "data/labels.csv".to_string(),
            resize_to: Some([224, 224]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDataConfig {
    pub raw_path: String,
    pub processed_path: String,
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,
    #[serde(default = "default_label_columns")]
    pub label_columns: Vec<String>,
}

impl Default for TextDataConfig {
    fn default() -> Self {
        Self {
            raw_path: "data/raw/text_data.csv".to_string(),
            processed_path: "data/processed/text_data.csv".to_string(),
            required_columns: default_required_columns(),
            label_columns: default_label_columns(),
        }
    }
}

/// Columns the editor always sends for `text_data.required_columns`.
pub fn default_required_columns() -> Vec<String> {
    vec!["text".to_string()]
}

/// Columns the editor always sends for `text_data.label_columns`.
pub fn default_label_columns() -> Vec<String> {
    vec!["label".to_string()]
}

// ---------------------------------------------------------------------------
// model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// `lstm`, `cnn`, or `transformer`.
    pub architecture: String,
    pub batch_size: i64,
    pub epochs: i64,
    pub dropout_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstm: Option<LstmConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnn: Option<CnnConfig>,
    pub model_path: String,
    pub encoder_path: String,
    pub tokenizer_path: String,
    pub tflite_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            architecture: "lstm".to_string(),
            batch_size: 32,
            epochs: 10,
            dropout_rate: 0.3,
            lstm: Some(LstmConfig::default()),
            cnn: Some(CnnConfig::default()),
            model_path: "artifacts/model.pth".to_string(),
            encoder_path: "artifacts/encoder.pkl".to_string(),
            tokenizer_path: "artifacts/tokenizer.pkl".to_string(),
            tflite_path: "artifacts/model.tflite".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmConfig {
    pub embedding_dim: i64,
    pub hidden_units: i64,
    pub activation: String,
    pub bidirectional: bool,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 64,
            hidden_units: 128,
            activation: "tanh".to_string(),
            bidirectional: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CnnConfig {
    pub filters: i64,
    pub kernel_size: i64,
    pub activation: String,
    /// `max` or `average`.
    pub pooling: String,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self {
            filters: 32,
            kernel_size: 3,
            activation: "relu".to_string(),
            pooling: "max".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// processing / paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub max_len: i64,
    pub max_words: i64,
    pub test_size: f64,
    pub random_state: i64,
    pub normalize: bool,
    pub stratify: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_len: 100,
            max_words: 5000,
            test_size: 0.2,
            random_state: 42,
            normalize: true,
            stratify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub base_dir: String,
    pub data_dir: String,
    pub artifacts_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            data_dir: "data".to_string(),
            artifacts_dir: "artifacts".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_payload() {
        let json = r#"{
            "data": {
                "task_type": "image_classification",
                "text_data": null,
                "image_data": {
                    "image_dir": "/srv/data/images",
                    "labels_file": "/srv/data/labels.csv",
                    "image_format": "png",
                    "resize_to": [128, 96],
                    "color_mode": "grayscale"
                },
                "min_samples": 500,
                "augment": true,
                "balance_classes": false
            },
            "model": {
                "architecture": "cnn",
                "cnn": {"filters": 64, "kernel_size": 5, "activation": "relu", "pooling": "average"},
                "lstm": {"embedding_dim": 64, "hidden_units": 128, "activation": "tanh", "bidirectional": false},
                "epochs": 200,
                "batch_size": 16,
                "dropout_rate": 0.5,
                "model_path": "/srv/artifacts/model.pth",
                "tokenizer_path": "/srv/artifacts/tokenizer.pkl",
                "encoder_path": "/srv/artifacts/encoder.pkl",
                "tflite_path": "/srv/artifacts/model.tflite"
            },
            "processing": {
                "test_size": 0.25, "random_state": 7, "stratify": false,
                "max_words": 8000, "max_len": 64, "normalize": true
            },
            "paths": {"base_dir": "/srv", "data_dir": "/srv/data", "artifacts_dir": "/srv/artifacts"}
        }"#;

        let config: TrainingConfig = serde_json::from_str(json).unwrap();
        assert!(config.data.text_data.is_none());
        let image = config.data.image_data.as_ref().unwrap();
        assert_eq!(image.resize_to, Some([128, 96]));
        assert_eq!(config.model.cnn.as_ref().unwrap().pooling, "average");
        assert_eq!(config.model.epochs, 200);
        assert_eq!(config.processing.random_state, 7);
    }

    #[test]
    fn text_columns_default_when_missing() {
        let json = r#"{"raw_path": "a.csv", "processed_path": "b.csv"}"#;
        let text: TextDataConfig = serde_json::from_str(json).unwrap();
        assert_eq!(text.required_columns, vec!["text"]);
        assert_eq!(text.label_columns, vec!["label"]);
    }

    #[test]
    fn missing_section_is_rejected() {
        let json = r#"{"data": {}, "model": {}, "processing": {}}"#;
        assert!(serde_json::from_str::<TrainingConfig>(json).is_err());
    }
}
