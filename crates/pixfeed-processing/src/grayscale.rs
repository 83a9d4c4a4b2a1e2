//! Square grayscale JPEG thumbnail
//!
//! Decode (format sniffed from content) -> resize to exactly
//! `size`x`size` -> grayscale -> JPEG at the configured quality.

use crate::error::{ProcessingError, ProcessingResult};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

/// Content type of every image this filter produces
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

pub const DEFAULT_SIZE: u32 = 256;
pub const DEFAULT_JPEG_QUALITY: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayscaleThumbnail {
    size: u32,
    jpeg_quality: u8,
}

impl Default for GrayscaleThumbnail {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl GrayscaleThumbnail {
    pub fn new(size: u32, jpeg_quality: u8) -> ProcessingResult<Self> {
        if size == 0 {
            return Err(ProcessingError::InvalidSettings(
                "output size must be greater than 0".to_string(),
            ));
        }
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ProcessingError::InvalidSettings(format!(
                "JPEG quality must be between 1 and 100, got {}",
                jpeg_quality
            )));
        }
        Ok(Self { size, jpeg_quality })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Run the filter synchronously. CPU-bound; call from a blocking context.
    pub fn apply(&self, data: &[u8]) -> ProcessingResult<Bytes> {
        let img = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;

        let (width, height) = img.dimensions();
        tracing::debug!(
            source_width = width,
            source_height = height,
            size = self.size,
            "Applying grayscale thumbnail filter"
        );

        let resized = img.resize_exact(self.size, self.size, FilterType::Triangle);
        // JPEG has no alpha channel
        let gray = DynamicImage::ImageLuma8(resized.to_luma8());

        let estimated_size = (self.size * self.size) as usize / 4;
        let mut buffer = Vec::with_capacity(estimated_size);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        gray.write_with_encoder(encoder)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }

    /// [`apply`](Self::apply) on the blocking thread pool
    pub async fn apply_blocking(&self, data: Bytes) -> ProcessingResult<Bytes> {
        let filter = *self;
        tokio::task::spawn_blocking(move || filter.apply(&data))
            .await
            .map_err(|e| ProcessingError::Task(e.to_string()))?
    }
}
