//! Page normalization and encoding: `DynamicImage` → base64 JPEG `ImageData`.
//!
//! Vision APIs accept images as base64 payloads embedded in the JSON
//! request body, so every byte of image data is paid for twice (base64
//! overhead) and counts against the provider's request-size limit. The
//! normalization policy trades pixels for payload:
//!
//! * downscale pages wider than `max_width` (default 1000 px), aspect
//!   preserved, Lanczos3 — sharp enough for the model to read a donor block;
//! * grayscale — donation scans carry no useful colour;
//! * lossy JPEG at a fixed moderate quality (default 50) — readable but
//!   small.
//!
//! These are size/quality trade-offs, not correctness constraints; the
//! defaults live on [`ExtractionConfig`] so deployments can tune them.
//! Nothing here is persisted — the encoded pages exist only for the
//! duration of one extraction call.

use crate::config::ExtractionConfig;
use crate::error::DocumentError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Normalize one rendered page and encode it for the vision API.
pub fn encode_page(
    img: &DynamicImage,
    config: &ExtractionConfig,
) -> Result<ImageData, DocumentError> {
    let jpeg = normalize_to_jpeg(img, config.max_width, config.jpeg_quality)?;
    let b64 = STANDARD.encode(&jpeg);
    debug!(
        "Normalized page → {} KB jpeg, {} bytes base64",
        jpeg.len() / 1024,
        b64.len()
    );
    Ok(ImageData::new(b64, "image/jpeg"))
}

/// Downscale, grayscale, and JPEG-encode a page image.
fn normalize_to_jpeg(
    img: &DynamicImage,
    max_width: u32,
    quality: u8,
) -> Result<Vec<u8>, DocumentError> {
    // Downscale only; narrow pages are left at their rendered size.
    let scaled;
    let img = if img.width() > max_width {
        let ratio = max_width as f32 / img.width() as f32;
        let new_height = (img.height() as f32 * ratio).round().max(1.0) as u32;
        scaled = img.resize_exact(max_width, new_height, FilterType::Lanczos3);
        &scaled
    } else {
        img
    };

    let gray = img.to_luma8();

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(&gray)
        .map_err(|e| DocumentError::Render {
            detail: format!("Image encoding failed: {}", e),
        })?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn white_page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    #[test]
    fn wide_page_is_downscaled_to_max_width() {
        let config = ExtractionConfig::default();
        let jpeg = normalize_to_jpeg(&white_page(2000, 1400), config.max_width, 50).unwrap();
        let decoded = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!(decoded.width(), 1000);
        assert_eq!(decoded.height(), 700, "aspect ratio preserved");
    }

    #[test]
    fn narrow_page_is_not_upscaled() {
        let jpeg = normalize_to_jpeg(&white_page(640, 480), 1000, 50).unwrap();
        let decoded = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!(decoded.width(), 640);
        assert_eq!(decoded.height(), 480);
    }

    #[test]
    fn output_is_single_channel() {
        let jpeg = normalize_to_jpeg(&white_page(100, 100), 1000, 50).unwrap();
        let decoded = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn encode_page_produces_tagged_base64() {
        let config = ExtractionConfig::default();
        let data = encode_page(&white_page(10, 10), &config).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(!decoded.is_empty());
    }
}
