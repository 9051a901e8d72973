//! Configuration structures for the expiry date pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BestbyError, Result};

/// Environment variable holding the Azure Computer Vision key.
pub const AZURE_KEY_ENV: &str = "AZURE_VISION_KEY";

/// Environment variable holding the Azure Computer Vision endpoint.
pub const AZURE_ENDPOINT_ENV: &str = "AZURE_VISION_ENDPOINT";

/// Main configuration for the bestby pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BestbyConfig {
    /// OCR provider selection.
    pub ocr: OcrConfig,

    /// Azure Computer Vision settings.
    pub azure: AzureConfig,

    /// Local model configuration.
    pub models: ModelConfig,

    /// Image preprocessing configuration.
    pub preprocessing: PreprocessingConfig,

    /// Date extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Which OCR provider the service should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Azure when credentials are present, otherwise local models if found.
    #[default]
    Auto,
    /// Azure Computer Vision only.
    Azure,
    /// Local ONNX models only.
    Local,
    /// No OCR; every image extraction is absent.
    None,
}

/// OCR provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Provider to use.
    pub provider: ProviderKind,

    /// Network timeout for remote providers, in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Auto,
            timeout_secs: 30,
        }
    }
}

/// Azure Computer Vision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://myres.cognitiveservices.azure.com/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Subscription key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_key: Option<String>,

    /// OCR language hint (`unk` lets the service detect it).
    pub language: String,

    /// Ask the service to correct rotated labels.
    pub detect_orientation: bool,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            subscription_key: None,
            language: "unk".to_string(),
            detect_orientation: true,
        }
    }
}

impl AzureConfig {
    /// Whether both endpoint and key are set.
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.endpoint) && present(&self.subscription_key)
    }

    /// Endpoint with a guaranteed trailing slash.
    pub fn normalized_endpoint(&self) -> Option<String> {
        let endpoint = self.endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        if endpoint.ends_with('/') {
            Some(endpoint.to_string())
        } else {
            Some(format!("{}/", endpoint))
        }
    }
}

/// Local model file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl ModelConfig {
    /// Whether all model files exist on disk.
    pub fn is_available(&self) -> bool {
        [&self.detection_model, &self.recognition_model, &self.dictionary]
            .iter()
            .all(|name| self.path(name).exists())
    }

    /// Full path of a file inside the model directory.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Run preprocessing before OCR.
    pub enabled: bool,

    /// Maximum image dimension (longer side) after downscaling.
    pub max_image_size: u32,

    /// Histogram clip limit, as a multiple of the mean bin height.
    pub clip_limit: f32,

    /// Median filter radius (0 disables denoising).
    pub median_radius: u32,

    /// Adaptive threshold window size in pixels (odd).
    pub adaptive_block_size: u32,

    /// Constant subtracted from the local mean.
    pub adaptive_c: i32,

    /// Write `preprocessed.png` here for inspection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<PathBuf>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_image_size: 2048,
            clip_limit: 3.0,
            median_radius: 1,
            adaptive_block_size: 11,
            adaptive_c: 2,
            debug_dir: None,
        }
    }
}

/// Date extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Try run-together `DDMMYYYY` digits before structured patterns.
    pub concatenated_digits: bool,

    /// Search the whole text when no keyword anchor yields a date.
    pub whole_text_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            concatenated_digits: true,
            whole_text_fallback: true,
        }
    }
}

impl BestbyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BestbyError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay Azure credentials from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(AZURE_KEY_ENV).filter(|v| !v.is_empty()) {
            self.azure.subscription_key = Some(key);
        }
        if let Some(endpoint) = lookup(AZURE_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.azure.endpoint = Some(endpoint);
        }
        self
    }
}
