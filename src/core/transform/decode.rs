//! Image decoding with a fast path for JPEG.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for other formats.

use crate::error::TransformError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decoder that picks the fastest available path per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image file.
    ///
    /// - JPEG: zune-jpeg, with the image crate as fallback
    /// - Other formats: image crate
    pub fn decode(path: &Path) -> Result<DynamicImage, TransformError> {
        match image::ImageFormat::from_path(path) {
            Ok(image::ImageFormat::Jpeg) => {
                Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))
            }
            _ => Self::decode_fallback(path),
        }
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, TransformError> {
        let file_bytes = fs::read(path).map_err(|e| TransformError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| TransformError::Decode {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| TransformError::Decode {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let buffer_error = |kind: &str| TransformError::Decode {
            path: path.to_path_buf(),
            reason: format!("Failed to create {} buffer", kind),
        };

        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGB"))?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGBA"))?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("Luma"))?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => return Self::decode_fallback(path),
        };

        Ok(image)
    }

    fn decode_fallback(path: &Path) -> Result<DynamicImage, TransformError> {
        image::open(path).map_err(|e| TransformError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
