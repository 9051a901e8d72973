//! Local OCR provider backed by `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::ModelConfig;

use super::OcrProvider;

/// Vertical band height used to group boxes into rows.
const ROW_HEIGHT: f32 = 20.0;

/// OCR engine running detection and recognition models on the CPU.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

/// A recognized region with its top-left corner.
#[derive(Debug, Clone)]
struct RecognizedLine {
    x: f32,
    y: f32,
    text: String,
    confidence: f32,
}

impl PureOcrEngine {
    /// Load the models named in `config`.
    pub fn from_config(config: &ModelConfig) -> Result<Self, OcrError> {
        Self::load(
            &config.path(&config.detection_model),
            &config.path(&config.recognition_model),
            &config.path(&config.dictionary),
            config.keep_unk,
        )
    }

    /// Load the default model file names from a directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let config = ModelConfig {
            model_dir: model_dir.to_path_buf(),
            ..ModelConfig::default()
        };
        Self::from_config(&config)
    }

    fn load(
        det_path: &Path,
        rec_path: &Path,
        dict_path: &Path,
        keep_unk: bool,
    ) -> Result<Self, OcrError> {
        for path in [det_path, rec_path, dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(det_path)
            .rec_model_path(rec_path)
            .dictionary_path(dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded pure-onnx-ocr engine from {}",
            det_path.parent().unwrap_or(det_path).display()
        );

        Ok(Self { engine, keep_unk })
    }

    /// Recognize text in a decoded image, returning lines in reading order.
    pub fn recognize_image(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Running local OCR on {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let mut lines: Vec<RecognizedLine> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                RecognizedLine {
                    x,
                    y,
                    text,
                    confidence: r.confidence,
                }
            })
            .collect();

        sort_reading_order(&mut lines);

        for line in &lines {
            debug!("  {:.2} {:?}", line.confidence, line.text);
        }

        let text: Vec<String> = lines
            .into_iter()
            .map(|l| l.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        info!(
            "Local OCR complete: {} lines in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

impl OcrProvider for PureOcrEngine {
    fn name(&self) -> &str {
        "local"
    }

    fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
        let image =
            image::load_from_memory(image).map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        self.recognize_image(&image)
    }
}

/// Sort top to bottom by row band, then left to right.
fn sort_reading_order(lines: &mut [RecognizedLine]) {
    lines.sort_by(|a, b| {
        let row_a = (a.y / ROW_HEIGHT) as i32;
        let row_b = (b.y / ROW_HEIGHT) as i32;
        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

/// Smallest x and y over the first four polygon points.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .take(4)
        .fold((f32::MAX, f32::MAX), |(x, y), c| {
            (x.min(c.x as f32), y.min(c.y as f32))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(x: f32, y: f32, text: &str) -> RecognizedLine {
        RecognizedLine {
            x,
            y,
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let mut lines = vec![
            line(120.0, 45.0, "12/2026"),
            line(10.0, 5.0, "BEST"),
            line(10.0, 42.0, "EXP"),
            line(60.0, 8.0, "BEFORE"),
        ];
        sort_reading_order(&mut lines);

        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["BEST", "BEFORE", "EXP", "12/2026"]);
    }

    #[test]
    fn test_missing_models() {
        let dir = tempfile::tempdir().unwrap();
        let result = PureOcrEngine::from_dir(dir.path());
        assert!(matches!(result, Err(OcrError::ModelLoad(_))));
    }
}
