use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat};
use log::debug;

use crate::enhance::Enhancer;
use crate::error::PhotoPrepError;
use crate::pixel::PixelBuffer;
use crate::{ImageKind, ProcessedPhoto};

/// JPEG re-encode quality (percent). The pipeline re-encodes at 0.9, high
/// enough that downstream detection is unaffected.
const JPEG_QUALITY: u8 = 90;

/// Identify the input format from the raw bytes.
///
/// Only formats the pipeline can also write back are accepted; anything
/// else cannot round-trip the caller's MIME type.
pub(crate) fn detect_format(input: &[u8]) -> Result<ImageKind, PhotoPrepError> {
    let format =
        image::guess_format(input).map_err(|e| PhotoPrepError::DecodeError(e.to_string()))?;
    match format {
        ImageFormat::Png => Ok(ImageKind::Png),
        ImageFormat::Jpeg => Ok(ImageKind::Jpeg),
        ImageFormat::WebP => Ok(ImageKind::Webp),
        _ => Err(PhotoPrepError::UnsupportedFormat),
    }
}

/// Decode input bytes into a `PixelBuffer`.
pub(crate) fn decode_image(input: &[u8]) -> Result<PixelBuffer, PhotoPrepError> {
    let decoded =
        image::load_from_memory(input).map_err(|e| PhotoPrepError::DecodeError(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(PhotoPrepError::ZeroDimensions);
    }
    Ok(PixelBuffer::from_image(&decoded.to_rgba8()))
}

/// Per-dimension scale bringing an oversized input under the byte budget,
/// or `None` when the input already fits.
pub(crate) fn budget_scale(byte_size: usize, max_size_bytes: usize) -> Option<f64> {
    if byte_size <= max_size_bytes {
        return None;
    }
    Some((max_size_bytes as f64 / byte_size as f64).sqrt())
}

/// Downscale `buffer` when `byte_size` exceeds the budget; pass through
/// (dimension-preserving) otherwise.
pub(crate) fn downscale_to_budget(
    buffer: &PixelBuffer,
    byte_size: usize,
    max_size_bytes: usize,
) -> Result<PixelBuffer, PhotoPrepError> {
    match budget_scale(byte_size, max_size_bytes) {
        None => Ok(buffer.clone()),
        Some(scale) => {
            let new_width = ((buffer.width() as f64 * scale).round() as u32).max(1);
            let new_height = ((buffer.height() as f64 * scale).round() as u32).max(1);
            debug!(
                "input of {byte_size} bytes exceeds budget of {max_size_bytes}; \
                 downscaling {}x{} -> {new_width}x{new_height}",
                buffer.width(),
                buffer.height()
            );
            buffer.resize_bilinear(new_width, new_height)
        }
    }
}

/// Encode a buffer back into its original container format.
pub(crate) fn encode_image(
    buffer: &PixelBuffer,
    format: ImageKind,
) -> Result<Vec<u8>, PhotoPrepError> {
    let image = buffer.clone().into_image();
    let (width, height) = (image.width(), image.height());
    let mut out = Vec::new();

    match format {
        ImageKind::Png => {
            PngEncoder::new(&mut out)
                .write_image(image.as_raw(), width, height, image::ExtendedColorType::Rgba8)
                .map_err(|e| PhotoPrepError::EncodeError(e.to_string()))?;
        }
        ImageKind::Jpeg => {
            // JPEG has no alpha channel; flatten to RGB first.
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
                .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                .map_err(|e| PhotoPrepError::EncodeError(e.to_string()))?;
        }
        ImageKind::Webp => {
            // The pure-Rust webp encoder only supports lossless encoding.
            WebPEncoder::new_lossless(&mut out)
                .write_image(image.as_raw(), width, height, image::ExtendedColorType::Rgba8)
                .map_err(|e| PhotoPrepError::EncodeError(e.to_string()))?;
        }
    }

    Ok(out)
}

/// Full preprocessing pipeline: decode -> byte-budget downscale ->
/// optional contrast/sharpen priming -> re-encode to the input's format.
///
/// `detect_faces` is a hint threaded through to the caller's segmentation
/// collaborator; it does not change anything this pipeline produces.
pub(crate) fn preprocess_pipeline(
    input: &[u8],
    enhance_faces: bool,
    detect_faces: bool,
    max_size_bytes: usize,
) -> Result<ProcessedPhoto, PhotoPrepError> {
    let format = detect_format(input)?;
    let decoded = decode_image(input)?;
    let scaled = downscale_to_budget(&decoded, input.len(), max_size_bytes)?;

    let prepared = if enhance_faces {
        Enhancer::default().enhance_for_detection(&scaled)
    } else {
        scaled
    };

    debug!(
        "preprocessed {}x{} {:?} (enhance_faces={enhance_faces}, detect_faces={detect_faces})",
        prepared.width(),
        prepared.height(),
        format
    );

    let data = encode_image(&prepared, format)?;
    Ok(ProcessedPhoto {
        width: prepared.width(),
        height: prepared.height(),
        data,
        format,
        original_size: input.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn make_test_rgba(width: u32, height: u32) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgba([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
                255,
            ]);
        }
        img
    }

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = make_test_rgba(width, height);
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(
                img.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        buffer
    }

    #[test]
    fn detect_format_recognizes_png() {
        let png = make_test_png(8, 8);
        assert_eq!(detect_format(&png).unwrap(), ImageKind::Png);
    }

    #[test]
    fn detect_format_rejects_garbage() {
        assert!(detect_format(b"not an image").is_err());
    }

    #[test]
    fn detect_format_rejects_non_roundtrippable_format() {
        // BMP decodes fine but the pipeline cannot hand back a BMP
        let img = make_test_rgba(8, 8);
        let mut cursor = std::io::Cursor::new(Vec::new());
        image::codecs::bmp::BmpEncoder::new(&mut cursor)
            .write_image(img.as_raw(), 8, 8, image::ExtendedColorType::Rgba8)
            .unwrap();
        assert!(matches!(
            detect_format(&cursor.into_inner()),
            Err(PhotoPrepError::UnsupportedFormat)
        ));
    }

    #[test]
    fn decode_produces_matching_dimensions() {
        let png = make_test_png(13, 7);
        let buffer = decode_image(&png).unwrap();
        assert_eq!(buffer.width(), 13);
        assert_eq!(buffer.height(), 7);
    }

    #[test]
    fn budget_scale_is_none_when_within_budget() {
        assert!(budget_scale(1000, 1000).is_none());
        assert!(budget_scale(999, 1000).is_none());
    }

    #[test]
    fn budget_scale_is_sqrt_of_byte_ratio() {
        let scale = budget_scale(4000, 1000).unwrap();
        assert!((scale - 0.5).abs() < 1e-9);
    }

    #[test]
    fn downscale_passes_through_small_inputs() {
        let buffer = PixelBuffer::from_image(&make_test_rgba(20, 10));
        let out = downscale_to_budget(&buffer, 500, 1000).unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn downscale_halves_dimensions_at_quarter_budget() {
        let buffer = PixelBuffer::from_image(&make_test_rgba(20, 10));
        let out = downscale_to_budget(&buffer, 4000, 1000).unwrap();
        assert_eq!(out.width(), 10);
        assert_eq!(out.height(), 5);
    }

    #[test]
    fn encode_png_roundtrips_pixels() {
        let buffer = PixelBuffer::from_image(&make_test_rgba(9, 9));
        let encoded = encode_image(&buffer, ImageKind::Png).unwrap();
        assert_eq!(decode_image(&encoded).unwrap(), buffer);
    }

    #[test]
    fn encode_jpeg_produces_jpeg_magic() {
        let buffer = PixelBuffer::from_image(&make_test_rgba(16, 16));
        let data = encode_image(&buffer, ImageKind::Jpeg).unwrap();
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xD8);
    }

    #[test]
    fn encode_webp_produces_riff_container() {
        let buffer = PixelBuffer::from_image(&make_test_rgba(16, 16));
        let data = encode_image(&buffer, ImageKind::Webp).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WEBP");
    }

    #[test]
    fn pipeline_keeps_dimensions_below_budget() {
        let png = make_test_png(50, 40);
        let result = preprocess_pipeline(&png, true, true, 4 * 1024 * 1024).unwrap();
        assert_eq!(result.width, 50);
        assert_eq!(result.height, 40);
        assert_eq!(result.format, ImageKind::Png);
        assert_eq!(result.original_size, png.len());
    }

    #[test]
    fn pipeline_downscales_oversized_input() {
        let png = make_test_png(60, 60);
        let budget = png.len() / 4;
        let result = preprocess_pipeline(&png, false, true, budget).unwrap();
        let scale = (budget as f64 / png.len() as f64).sqrt();
        assert_eq!(result.width, (60.0 * scale).round() as u32);
        assert_eq!(result.height, (60.0 * scale).round() as u32);
    }

    #[test]
    fn pipeline_without_enhancement_roundtrips_png_pixels() {
        let png = make_test_png(12, 12);
        let source = decode_image(&png).unwrap();
        let result = preprocess_pipeline(&png, false, false, 4 * 1024 * 1024).unwrap();
        assert_eq!(decode_image(&result.data).unwrap(), source);
    }

    #[test]
    fn pipeline_with_enhancement_changes_pixels() {
        let png = make_test_png(12, 12);
        let source = decode_image(&png).unwrap();
        let result = preprocess_pipeline(&png, true, false, 4 * 1024 * 1024).unwrap();
        assert_ne!(decode_image(&result.data).unwrap(), source);
    }
}
