//! Azure Computer Vision OCR provider (v3.2 `ocr` endpoint).

use std::io::Cursor;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat, RgbImage};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::AzureConfig;

use super::OcrProvider;

const OCR_PATH: &str = "vision/v3.2/ocr";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Blocking client for the Azure Computer Vision OCR API.
pub struct AzureOcrClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    subscription_key: String,
    language: String,
    detect_orientation: bool,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    regions: Vec<Region>,
}

#[derive(Debug, Deserialize)]
struct Region {
    #[serde(default)]
    lines: Vec<Line>,
}

#[derive(Debug, Deserialize)]
struct Line {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl AzureOcrClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`OcrError::NotConfigured`] when the endpoint or key is missing.
    pub fn from_config(config: &AzureConfig, timeout_secs: u64) -> Result<Self, OcrError> {
        let endpoint = config
            .normalized_endpoint()
            .ok_or_else(|| OcrError::NotConfigured("Azure endpoint is not set".to_string()))?;
        let subscription_key = config
            .subscription_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                OcrError::NotConfigured("Azure subscription key is not set".to_string())
            })?
            .to_string();

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            subscription_key,
            language: config.language.clone(),
            detect_orientation: config.detect_orientation,
        })
    }

    /// Full request URL including query parameters.
    pub fn request_url(&self) -> String {
        format!(
            "{}{}?language={}&detectOrientation={}",
            self.endpoint, OCR_PATH, self.language, self.detect_orientation
        )
    }

    /// Verify credentials by sending a small blank image.
    pub fn check_connection(&self) -> Result<(), OcrError> {
        let probe = blank_png(64, 64)?;
        let lines = self.recognize(&probe)?;
        debug!("Azure connection check returned {} lines", lines.len());
        Ok(())
    }

    fn send(&self, image: &[u8]) -> Result<String, OcrError> {
        let response = self
            .client
            .post(self.request_url())
            .header(KEY_HEADER, &self.subscription_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let code = status.as_u16();
        if code == 401 || code == 403 {
            return Err(OcrError::Auth(code));
        }

        Err(OcrError::Service {
            status: code,
            message: error_message(&body),
        })
    }
}

impl OcrProvider for AzureOcrClient {
    fn name(&self) -> &str {
        "azure"
    }

    fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
        let start = Instant::now();
        debug!("Sending {} bytes to Azure OCR", image.len());

        let body = self.send(image)?;
        let lines = parse_lines(&body)?;

        info!(
            "Azure OCR complete: {} lines in {}ms",
            lines.len(),
            start.elapsed().as_millis()
        );
        Ok(lines)
    }
}

/// Flatten regions, lines and words into one string per line.
fn parse_lines(body: &str) -> Result<Vec<String>, OcrError> {
    let response: OcrResponse =
        serde_json::from_str(body).map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

    Ok(response
        .regions
        .into_iter()
        .flat_map(|region| region.lines)
        .map(|line| {
            line.words
                .into_iter()
                .map(|w| w.text)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.trim().is_empty())
        .collect())
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(ErrorDetail { message: Some(m) }),
        }) => m,
        _ => {
            if !body.is_empty() {
                warn!("Unrecognized Azure error body");
            }
            body.chars().take(200).collect()
        }
    }
}

fn blank_png(width: u32, height: u32) -> Result<Vec<u8>, OcrError> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> AzureConfig {
        AzureConfig {
            endpoint: Some("https://demo.cognitiveservices.azure.com".to_string()),
            subscription_key: Some("key".to_string()),
            ..AzureConfig::default()
        }
    }

    #[test]
    fn test_request_url() {
        let client = AzureOcrClient::from_config(&config(), 30).unwrap();
        assert_eq!(
            client.request_url(),
            concat!(
                "https://demo.cognitiveservices.azure.com/vision/v3.2/ocr",
                "?language=unk&detectOrientation=true",
            )
        );
    }

    #[test]
    fn test_missing_credentials() {
        let mut cfg = config();
        cfg.subscription_key = None;
        assert!(matches!(
            AzureOcrClient::from_config(&cfg, 30),
            Err(OcrError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_parse_lines() {
        let body = r#"{
            "language": "en",
            "orientation": "Up",
            "regions": [
                {"boundingBox": "1,2,3,4", "lines": [
                    {"boundingBox": "1,2,3,4", "words": [
                        {"boundingBox": "1,2,3,4", "text": "BEST"},
                        {"boundingBox": "1,2,3,4", "text": "BEFORE"}
                    ]},
                    {"boundingBox": "1,2,3,4", "words": [
                        {"boundingBox": "1,2,3,4", "text": "12/2026"}
                    ]}
                ]},
                {"boundingBox": "1,2,3,4", "lines": [
                    {"boundingBox": "1,2,3,4", "words": [
                        {"boundingBox": "1,2,3,4", "text": "L4521"}
                    ]}
                ]}
            ]
        }"#;

        assert_eq!(
            parse_lines(body).unwrap(),
            vec!["BEST BEFORE", "12/2026", "L4521"]
        );
    }

    #[test]
    fn test_parse_empty_regions() {
        assert!(parse_lines(r#"{"regions": []}"#).unwrap().is_empty());
        assert!(parse_lines(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_lines("<html>"),
            Err(OcrError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": "InvalidImageSize", "message": "Image is too small."}}"#;
        assert_eq!(error_message(body), "Image is too small.");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_blank_png_decodes() {
        let png = blank_png(64, 64).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 64);
    }
}
