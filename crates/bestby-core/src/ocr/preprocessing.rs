//! Image preprocessing to improve OCR legibility of printed labels.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma};
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::PreprocessingConfig;

/// Grayscale, contrast, denoise and binarize a label photo.
pub struct ImagePreprocessor {
    /// Maximum image dimension.
    max_size: u32,
    /// Histogram clip limit relative to the mean bin height.
    clip_limit: f32,
    /// Median filter radius.
    median_radius: u32,
    /// Adaptive threshold window.
    block_size: u32,
    /// Constant subtracted from the local mean.
    c: i32,
    /// Where to dump the result, if anywhere.
    debug_dir: Option<std::path::PathBuf>,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessingConfig::default())
    }

    /// Create a preprocessor from configuration.
    pub fn from_config(config: &PreprocessingConfig) -> Self {
        Self {
            max_size: config.max_image_size.max(1),
            clip_limit: config.clip_limit,
            median_radius: config.median_radius,
            block_size: config.adaptive_block_size.max(3) | 1,
            c: config.adaptive_c,
            debug_dir: config.debug_dir.clone(),
        }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Preprocess encoded image bytes into a PNG.
    ///
    /// Never fails: on any error the original bytes are returned unchanged.
    pub fn preprocess(&self, image_data: &[u8]) -> Vec<u8> {
        match self.try_preprocess(image_data) {
            Ok(processed) => processed,
            Err(e) => {
                warn!("Image preprocessing failed, using original image: {}", e);
                image_data.to_vec()
            }
        }
    }

    /// Preprocess encoded image bytes, reporting failures.
    pub fn try_preprocess(&self, image_data: &[u8]) -> Result<Vec<u8>, OcrError> {
        let image = image::load_from_memory(image_data)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let enhanced = self.enhance(&image);

        if let Some(dir) = &self.debug_dir {
            self.save_debug(dir, &enhanced);
        }

        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(enhanced)
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| OcrError::Preprocessing(e.to_string()))?;

        Ok(out.into_inner())
    }

    /// Apply the full enhancement chain to a decoded image.
    pub fn enhance(&self, image: &DynamicImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) =
            self.calculate_resize_dimensions(width, height, self.max_size);

        let gray = if (new_width, new_height) != (width, height) {
            debug!("Resizing {}x{} to {}x{}", width, height, new_width, new_height);
            image
                .resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
                .to_luma8()
        } else {
            image.to_luma8()
        };

        let contrasted = self.equalize(&gray);
        let denoised = self.median_filter(&contrasted, self.median_radius);

        let otsu = self.otsu_threshold(&denoised);
        let adaptive = self.adaptive_threshold(&denoised, self.block_size, self.c);

        // Keep a pixel white if either binarization says so
        let mut combined = otsu;
        for (out, local) in combined.pixels_mut().zip(adaptive.pixels()) {
            out[0] = out[0].max(local[0]);
        }

        combined
    }

    fn save_debug(&self, dir: &std::path::Path, image: &GrayImage) {
        let path = dir.join("preprocessed.png");
        let result = std::fs::create_dir_all(dir)
            .map_err(|e| e.to_string())
            .and_then(|_| image.save(&path).map_err(|e| e.to_string()));

        match result {
            Ok(()) => debug!("Saved preprocessed image to {}", path.display()),
            Err(e) => warn!("Could not save debug image to {}: {}", path.display(), e),
        }
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32, target_size: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= target_size {
            return (width, height);
        }

        let scale = target_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }

    /// Histogram equalization with a clipped histogram, spreading the
    /// clipped excess evenly across all bins.
    fn equalize(&self, image: &GrayImage) -> GrayImage {
        let total = (image.width() as u64 * image.height() as u64).max(1);

        let mut histogram = [0u64; 256];
        for pixel in image.pixels() {
            histogram[pixel[0] as usize] += 1;
        }

        if self.clip_limit > 0.0 {
            let limit = ((total as f32 / 256.0) * self.clip_limit).max(1.0) as u64;
            let mut excess = 0u64;
            for bin in histogram.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let share = excess / 256;
            let remainder = (excess % 256) as usize;
            for (i, bin) in histogram.iter_mut().enumerate() {
                *bin += share + u64::from(i < remainder);
            }
        }

        let mut lut = [0u8; 256];
        let mut cumulative = 0u64;
        for (i, count) in histogram.iter().enumerate() {
            cumulative += count;
            lut[i] = ((cumulative * 255) / total).min(255) as u8;
        }

        let mut result = image.clone();
        for pixel in result.pixels_mut() {
            pixel[0] = lut[pixel[0] as usize];
        }
        result
    }

    fn median_filter(&self, image: &GrayImage, radius: u32) -> GrayImage {
        if radius == 0 {
            return image.clone();
        }

        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);
        let mut window = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);

        for y in 0..height {
            for x in 0..width {
                window.clear();

                let y_start = y.saturating_sub(radius);
                let y_end = (y + radius + 1).min(height);
                let x_start = x.saturating_sub(radius);
                let x_end = (x + radius + 1).min(width);

                for ly in y_start..y_end {
                    for lx in x_start..x_end {
                        window.push(image.get_pixel(lx, ly)[0]);
                    }
                }

                window.sort_unstable();
                result.put_pixel(x, y, Luma([window[window.len() / 2]]));
            }
        }

        result
    }

    /// Global binarization at the Otsu threshold.
    fn otsu_threshold(&self, image: &GrayImage) -> GrayImage {
        let threshold = otsu_level(image);
        debug!("Otsu threshold: {}", threshold);

        let mut result = image.clone();
        for pixel in result.pixels_mut() {
            pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
        }
        result
    }

    /// Local mean threshold over a `block_size` window, using an integral image.
    fn adaptive_threshold(&self, image: &GrayImage, block_size: u32, c: i32) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);

        let w = width as usize;
        let mut integral = vec![0u64; (w + 1) * (height as usize + 1)];
        for y in 0..height as usize {
            let mut row_sum = 0u64;
            for x in 0..w {
                row_sum += image.get_pixel(x as u32, y as u32)[0] as u64;
                integral[(y + 1) * (w + 1) + x + 1] = integral[y * (w + 1) + x + 1] + row_sum;
            }
        }

        let half_block = block_size / 2;

        for y in 0..height {
            for x in 0..width {
                let y_start = y.saturating_sub(half_block) as usize;
                let y_end = (y + half_block + 1).min(height) as usize;
                let x_start = x.saturating_sub(half_block) as usize;
                let x_end = (x + half_block + 1).min(width) as usize;

                let sum = integral[y_end * (w + 1) + x_end] + integral[y_start * (w + 1) + x_start]
                    - integral[y_start * (w + 1) + x_end]
                    - integral[y_end * (w + 1) + x_start];
                let count = ((y_end - y_start) * (x_end - x_start)) as u64;

                let mean = (sum / count) as i32;
                let threshold = mean - c;
                let pixel_value = image.get_pixel(x, y)[0] as i32;

                let output = if pixel_value > threshold { 255 } else { 0 };
                result.put_pixel(x, y, Luma([output]));
            }
        }

        result
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Threshold maximizing between-class variance of the gray histogram.
fn otsu_level(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }

    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background = 0.0f64;
    let mut weight_background = 0u64;
    let mut best_variance = -1.0f64;
    let mut best_level = 0u8;

    for (level, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += level as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_all - sum_background) / weight_foreground as f64;

        let variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn label_png(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbImage::from_pixel(width, height, image::Rgb([200, 200, 190]));
        // A dark "stroke" across the middle
        for x in width / 4..3 * width / 4 {
            for y in height / 2 - 2..height / 2 + 2 {
                img.put_pixel(x, y, image::Rgb([30, 30, 40]));
            }
        }
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::new();

        // Image smaller than target
        let (w, h) = preprocessor.calculate_resize_dimensions(500, 300, 960);
        assert_eq!((w, h), (500, 300));

        // Image larger than target
        let (w, h) = preprocessor.calculate_resize_dimensions(1920, 1080, 960);
        assert_eq!(w, 960);
        assert!(h < 960);
    }

    #[test]
    fn test_output_is_binary_png() {
        let preprocessor = ImagePreprocessor::new();
        let output = preprocessor.try_preprocess(&label_png(64, 32)).unwrap();

        let decoded = image::load_from_memory(&output).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (64, 32));
        assert!(decoded.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // The stroke stays dark
        assert_eq!(decoded.get_pixel(32, 16)[0], 0);
    }

    #[test]
    fn test_downscales_large_images() {
        let preprocessor = ImagePreprocessor::new().with_max_size(40);
        let output = preprocessor.preprocess(&label_png(80, 40));
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (40, 20));
    }

    #[test]
    fn test_invalid_bytes_returned_unchanged() {
        let preprocessor = ImagePreprocessor::new();
        let garbage = b"definitely not an image".to_vec();
        assert_eq!(preprocessor.preprocess(&garbage), garbage);
        assert!(matches!(
            preprocessor.try_preprocess(&garbage),
            Err(OcrError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_otsu_splits_bimodal_histogram() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([20]));
        for x in 0..5 {
            for y in 0..10 {
                img.put_pixel(x, y, Luma([220]));
            }
        }
        let level = otsu_level(&img);
        assert!((20..220).contains(&level));
    }

    #[test]
    fn test_debug_dump() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreprocessingConfig {
            debug_dir: Some(dir.path().join("debug")),
            ..PreprocessingConfig::default()
        };
        ImagePreprocessor::from_config(&config).preprocess(&label_png(16, 16));
        assert!(dir.path().join("debug").join("preprocessed.png").exists());
    }
}
