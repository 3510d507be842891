//! Image normalization before OCR.
//!
//! Scanned report forms arrive as phone photos of paper — uneven
//! lighting, low contrast, small text. Normalization is an injected
//! capability: a native implementation (grayscale, upscale, adaptive
//! threshold) and a subprocess-backed one that defers to an external
//! script, both producing PNG bytes for the OCR provider.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};

use super::PreprocessError;

/// Image normalization capability: raw upload bytes in, OCR-ready
/// bytes out.
pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, PreprocessError>;
}

/// Upscale factor applied before thresholding. Small handwriting on
/// A4 forms needs the extra resolution for reliable recognition.
const UPSCALE_FACTOR: f32 = 1.5;

/// Adaptive threshold window edge in pixels. Must be odd.
const THRESHOLD_BLOCK_SIZE: u32 = 15;

/// Constant subtracted from the local mean before thresholding.
const THRESHOLD_C: i16 = 10;

/// Pure-Rust normalizer: grayscale → 1.5× bilinear upscale → adaptive
/// mean threshold → PNG.
pub struct NativePreprocessor {
    scale: f32,
    block_size: u32,
    threshold_c: i16,
}

impl Default for NativePreprocessor {
    fn default() -> Self {
        Self {
            scale: UPSCALE_FACTOR,
            block_size: THRESHOLD_BLOCK_SIZE,
            threshold_c: THRESHOLD_C,
        }
    }
}

impl Preprocessor for NativePreprocessor {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, PreprocessError> {
        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| PreprocessError::Decode(e.to_string()))?;
        let gray = decoded.to_luma8();

        let new_w = ((gray.width() as f32 * self.scale).round() as u32).max(1);
        let new_h = ((gray.height() as f32 * self.scale).round() as u32).max(1);
        let upscaled = image::imageops::resize(
            &gray,
            new_w,
            new_h,
            image::imageops::FilterType::Triangle,
        );

        let binarized = adaptive_mean_threshold(&upscaled, self.block_size, self.threshold_c);

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(binarized)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| PreprocessError::Encode(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Binarize against the local mean: a pixel becomes white when it
/// exceeds the mean of its surrounding block minus `c`, black
/// otherwise. Uses an integral image so cost is linear in pixels.
pub fn adaptive_mean_threshold(img: &GrayImage, block_size: u32, c: i16) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }

    // Integral image with a zero row/column border.
    let mut integral = vec![0u64; ((w + 1) * (h + 1)) as usize];
    let stride = (w + 1) as usize;
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += img.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            integral[idx] = integral[idx - stride] + row_sum;
        }
    }

    let half = (block_size / 2) as i64;
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = (x as i64 - half).max(0) as usize;
            let y0 = (y as i64 - half).max(0) as usize;
            let x1 = ((x as i64 + half).min(w as i64 - 1) + 1) as usize;
            let y1 = ((y as i64 + half).min(h as i64 - 1) + 1) as usize;

            let count = ((x1 - x0) * (y1 - y0)) as u64;
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let mean = (sum / count) as i16;

            let value = img.get_pixel(x, y).0[0] as i16;
            let pixel = if value > mean - c { 255u8 } else { 0u8 };
            out.put_pixel(x, y, Luma([pixel]));
        }
    }
    out
}

/// Normalizer that shells out to an external script taking
/// `<input_path> <output_path>` arguments. Temp files for both sides
/// are scope-owned, so they are removed on every exit path.
pub struct SubprocessPreprocessor {
    command: String,
    script: PathBuf,
}

impl SubprocessPreprocessor {
    pub fn new(command: &str, script: impl Into<PathBuf>) -> Self {
        Self {
            command: command.to_string(),
            script: script.into(),
        }
    }
}

impl Preprocessor for SubprocessPreprocessor {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, PreprocessError> {
        let input = tempfile::NamedTempFile::new()?;
        std::fs::write(input.path(), image_bytes)?;
        let output = tempfile::Builder::new().suffix(".png").tempfile()?;

        let status = Command::new(&self.command)
            .arg(&self.script)
            .arg(input.path())
            .arg(output.path())
            .status()?;

        if !status.success() {
            return Err(PreprocessError::Subprocess {
                code: status.code(),
            });
        }

        Ok(std::fs::read(output.path())?)
    }
}

/// Mock preprocessor for testing — passes bytes through unchanged, or
/// fails when built with `failing()`.
pub struct MockPreprocessor {
    fail: bool,
}

impl MockPreprocessor {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for MockPreprocessor {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, PreprocessError> {
        if self.fail {
            return Err(PreprocessError::Decode("Mock preprocessing failure".into()));
        }
        Ok(image_bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_png(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn native_upscales_by_configured_factor() {
        let png = make_png(100, 60, 180);
        let out = NativePreprocessor::default().preprocess(&png).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 150);
        assert_eq!(decoded.height(), 90);
    }

    #[test]
    fn native_output_is_binary() {
        // A gradient image must come out containing only 0 and 255.
        let mut img = GrayImage::new(64, 64);
        for y in 0..64 {
            for x in 0..64 {
                img.put_pixel(x, y, Luma([(x * 4) as u8]));
            }
        }
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();

        let out = NativePreprocessor::default()
            .preprocess(&cursor.into_inner())
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_luma8();
        assert!(decoded.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn native_rejects_garbage_bytes() {
        let result = NativePreprocessor::default().preprocess(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn threshold_uniform_image_goes_white() {
        // value > mean - c holds everywhere on a flat image.
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        let out = adaptive_mean_threshold(&img, 15, 10);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn threshold_separates_dark_text_from_light_background() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([220]));
        // A dark 3x3 "stroke" in the middle.
        for y in 14..17 {
            for x in 14..17 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        let out = adaptive_mean_threshold(&img, 15, 10);
        assert_eq!(out.get_pixel(15, 15).0[0], 0, "stroke should be black");
        assert_eq!(out.get_pixel(2, 2).0[0], 255, "background should be white");
    }

    #[test]
    fn threshold_empty_image_is_noop() {
        let img = GrayImage::new(0, 0);
        let out = adaptive_mean_threshold(&img, 15, 10);
        assert_eq!(out.width(), 0);
    }

    #[test]
    fn mock_passes_bytes_through() {
        let bytes = vec![1, 2, 3];
        assert_eq!(MockPreprocessor::new().preprocess(&bytes).unwrap(), bytes);
    }

    #[test]
    fn mock_failing_errors() {
        assert!(MockPreprocessor::failing().preprocess(b"x").is_err());
    }

    #[test]
    fn subprocess_missing_command_is_io_error() {
        let preprocessor =
            SubprocessPreprocessor::new("definitely-not-a-real-binary", "script.py");
        assert!(matches!(
            preprocessor.preprocess(b"data"),
            Err(PreprocessError::Io(_))
        ));
    }
}
