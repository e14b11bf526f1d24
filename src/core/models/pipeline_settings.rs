use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::global_constants;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    pub detection_model_path: PathBuf,
    pub label_vocabulary: Vec<String>,
    pub identifier_label: String,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub detector_input_size: u32,
    pub ocr_language: String,
    #[serde(default)]
    pub max_concurrent_extractions: usize,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub expected_identifier_length: Option<usize>,
    #[serde(default)]
    pub serialize_detector: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let models_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(global_constants::APPLICATION_NAME)
            .join("models");

        Self {
            detection_model_path: models_dir.join(global_constants::DEFAULT_MODEL_FILE_NAME),
            label_vocabulary: global_constants::DEFAULT_LABEL_VOCABULARY
                .iter()
                .map(|label| label.to_string())
                .collect(),
            identifier_label: global_constants::IDENTIFIER_LABEL.to_string(),
            confidence_threshold: global_constants::DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: global_constants::DEFAULT_IOU_THRESHOLD,
            detector_input_size: global_constants::DEFAULT_DETECTOR_INPUT_SIZE,
            ocr_language: global_constants::DEFAULT_OCR_LANGUAGE.to_string(),
            max_concurrent_extractions: 0,
            timeout_seconds: None,
            expected_identifier_length: None,
            serialize_detector: false,
        }
    }
}

impl PipelineSettings {
    pub fn load() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_file_path()?;
        Self::load_from(&settings_path)
    }

    pub fn load_from(settings_path: &Path) -> anyhow::Result<Self> {
        if !settings_path.exists() {
            log::info!(
                "[SETTINGS] No settings file at {:?}, using defaults",
                settings_path
            );
            let default_settings = Self::default();
            default_settings.save_to(settings_path)?;
            return Ok(default_settings);
        }

        let contents = std::fs::read_to_string(settings_path)
            .with_context(|| format!("Failed to read settings from {:?}", settings_path))?;
        let settings: PipelineSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {:?}", settings_path))?;
        settings.validate()?;

        log::info!("[SETTINGS] Loaded settings from {:?}", settings_path);
        log::debug!(
            "[SETTINGS] Model: {:?}, labels: {:?}",
            settings.detection_model_path,
            settings.label_vocabulary
        );

        Ok(settings)
    }

    pub fn save_to(&self, settings_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(settings_path, contents)?;

        log::info!("[SETTINGS] Saved settings to {:?}", settings_path);
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.label_vocabulary.is_empty() {
            anyhow::bail!("label_vocabulary must contain at least one label");
        }
        if !self.label_vocabulary.contains(&self.identifier_label) {
            anyhow::bail!(
                "identifier_label '{}' is not part of label_vocabulary",
                self.identifier_label
            );
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.detector_input_size == 0 || self.detector_input_size % 32 != 0 {
            anyhow::bail!(
                "detector_input_size must be a positive multiple of 32, got {}",
                self.detector_input_size
            );
        }
        if self.expected_identifier_length == Some(0) {
            anyhow::bail!("expected_identifier_length must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn extraction_concurrency(&self) -> usize {
        if self.max_concurrent_extractions > 0 {
            return self.max_concurrent_extractions;
        }
        std::thread::available_parallelism()
            .map(|cores| cores.get())
            .unwrap_or(1)
    }

    fn get_settings_file_path() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(global_constants::APPLICATION_NAME);

        Ok(config_dir.join(global_constants::SETTINGS_FILE_NAME))
    }
}
