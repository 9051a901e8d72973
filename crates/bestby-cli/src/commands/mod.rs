//! Subcommand implementations.

pub mod batch;
pub mod check;
pub mod config;
pub mod extract;
pub mod text;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use console::style;
use serde::Serialize;

use bestby_core::models::config::{BestbyConfig, ProviderKind};
use bestby_core::ExtractionResult;

/// Output format for single extractions.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
}

/// OCR provider override.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProviderArg {
    /// Azure if configured, otherwise local models
    Auto,
    /// Azure Computer Vision
    Azure,
    /// Local ONNX models
    Local,
    /// No OCR
    None,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Auto => ProviderKind::Auto,
            ProviderArg::Azure => ProviderKind::Azure,
            ProviderArg::Local => ProviderKind::Local,
            ProviderArg::None => ProviderKind::None,
        }
    }
}

/// Platform config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bestby")
        .join("config.json")
}

/// Config file selected by `--config`, or the platform default.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration for a run, applying environment overrides.
///
/// An explicit `--config` path must exist; the default path is optional.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BestbyConfig> {
    let config = match config_path {
        Some(path) => BestbyConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                BestbyConfig::from_file(&path)?
            } else {
                BestbyConfig::default()
            }
        }
    };

    Ok(config.with_env_overrides())
}

/// JSON report for one extraction.
#[derive(Serialize)]
pub struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'a str>,
    pub date: Option<String>,
    pub result: &'a ExtractionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<&'a [String]>,
}

/// Human-readable extraction summary.
pub fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    match &result.expiry {
        Some(found) => {
            output.push_str(&format!(
                "{} Expiry date: {}\n",
                style("✓").green(),
                style(found.date.format("%Y-%m-%d")).bold()
            ));
            output.push_str(&format!(
                "  Keyword: {}\n",
                found.keyword.as_deref().unwrap_or("(none, whole text)")
            ));
            output.push_str(&format!("  Method:  {}\n", found.method));
            output.push_str(&format!("  Source:  {}\n", found.source));
        }
        None => {
            output.push_str(&format!("{} No expiry date found\n", style("✗").yellow()));
        }
    }

    output
}
