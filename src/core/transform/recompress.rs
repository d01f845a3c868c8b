//! Image recompression transform.

use super::decode::FastDecoder;
use super::orientation::{apply_orientation, read_orientation};
use super::resize::shrink_to_fit;
use super::{ContentTransform, Transformed};
use crate::core::classifier::FileKind;
use crate::error::TransformError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Formats that are decoded, bounded and re-encoded.
/// Anything else (GIF animations, SVG, HEIC...) is copied as-is.
const RECOMPRESSED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Settings for image recompression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecompressConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for RecompressConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            jpeg_quality: 85,
        }
    }
}

/// Bounds image dimensions and re-encodes images in their own format
#[derive(Debug, Clone, Default)]
pub struct ImageRecompressor {
    config: RecompressConfig,
}

impl ImageRecompressor {
    pub fn new(config: RecompressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecompressConfig {
        &self.config
    }

    /// Whether this file's format is re-encoded
    pub fn handles(path: &Path) -> Option<ImageFormat> {
        ImageFormat::from_path(path)
            .ok()
            .filter(|format| RECOMPRESSED_FORMATS.contains(format))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        path: &Path,
    ) -> Result<Vec<u8>, TransformError> {
        let mut buffer = Vec::new();

        let result = match format {
            ImageFormat::Jpeg => {
                let quality = self.config.jpeg_quality.clamp(1, 100);
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                match image.color() {
                    ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder),
                    _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder),
                }
            }
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                image.write_with_encoder(encoder)
            }
            other => image.write_to(&mut Cursor::new(&mut buffer), other),
        };

        result.map_err(|e| TransformError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(buffer)
    }
}

impl ContentTransform for ImageRecompressor {
    fn apply(&self, kind: FileKind, source: &Path) -> Result<Transformed, TransformError> {
        if kind != FileKind::Image {
            return Ok(Transformed::Unchanged);
        }

        let Some(format) = Self::handles(source) else {
            debug!(?source, "image format is not recompressed, copying as-is");
            return Ok(Transformed::Unchanged);
        };

        let mut image = FastDecoder::decode(source)?;

        if let Some(orientation) = read_orientation(source) {
            image = apply_orientation(image, orientation);
        }

        let (width, height) = (image.width(), image.height());
        let image = shrink_to_fit(image, self.config.max_width, self.config.max_height, source)?;
        let bytes = self.encode(&image, format, source)?;

        debug!(
            ?source,
            from = %format!("{}x{}", width, height),
            to = %format!("{}x{}", image.width(), image.height()),
            bytes = bytes.len(),
            "image recompressed"
        );

        Ok(Transformed::Reencoded(bytes))
    }
}
