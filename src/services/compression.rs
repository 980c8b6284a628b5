use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader, Limits};
use std::io::Cursor;

/// Quality floor before the compressor starts shrinking dimensions instead.
const MIN_QUALITY: u8 = 40;
const QUALITY_STEP: u8 = 10;

/// Each downscale pass keeps this fraction of the previous size.
const DOWNSCALE_FACTOR: f32 = 0.8;

/// Longest edge below which the compressor gives up and returns its best attempt.
const MIN_DIMENSION: u32 = 320;

/// Target size and dimensions for a compressed photo.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressOptions {
    pub max_size_bytes: u64,
    pub max_dimension: u32,
    pub initial_quality: u8,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: 1024 * 1024,
            max_dimension: 1920,
            initial_quality: 85,
        }
    }
}

/// Turns an original photo into a smaller rendition for upload.
///
/// Implementations are CPU-bound and synchronous; the upload queue runs them
/// on the blocking thread pool.
pub trait Compressor: Send + Sync + 'static {
    fn compress(&self, image: &[u8], options: &CompressOptions)
        -> Result<Vec<u8>, CompressionError>;
}

/// JPEG re-encoder backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    max_input_dimension: u32,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self {
            max_input_dimension: 12_000,
        }
    }
}

impl ImageCompressor {
    pub fn new(max_input_dimension: u32) -> Self {
        Self {
            max_input_dimension,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CompressionError> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_input_dimension);
        limits.max_image_height = Some(self.max_input_dimension);

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CompressionError::Decode(ImageError::IoError(e)))?;
        reader.limits(limits);

        reader.decode().map_err(|e| match e {
            ImageError::Limits(limit) => CompressionError::Limits(limit.to_string()),
            other => CompressionError::Decode(other),
        })
    }
}

impl Compressor for ImageCompressor {
    fn compress(
        &self,
        image: &[u8],
        options: &CompressOptions,
    ) -> Result<Vec<u8>, CompressionError> {
        let decoded = self.decode(image)?;
        let max_dimension = options.max_dimension.max(1);

        let mut current = if decoded.width().max(decoded.height()) > max_dimension {
            decoded.resize(max_dimension, max_dimension, FilterType::Triangle)
        } else {
            decoded
        };
        let mut quality = options.initial_quality.clamp(1, 100);

        loop {
            let encoded = encode_jpeg(&current, quality)?;
            if encoded.len() as u64 <= options.max_size_bytes {
                return Ok(encoded);
            }

            if quality > MIN_QUALITY {
                quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
                continue;
            }

            let longest = current.width().max(current.height());
            if longest <= MIN_DIMENSION {
                tracing::debug!(
                    size = encoded.len(),
                    target = options.max_size_bytes,
                    "Photo still above target size at minimum dimensions"
                );
                return Ok(encoded);
            }

            let next = ((longest as f32 * DOWNSCALE_FACTOR) as u32).max(MIN_DIMENSION);
            current = current.resize(next, next, FilterType::Triangle);
        }
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(CompressionError::Encode)?;
    Ok(buf)
}

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Failed to decode image: {0}")]
    Decode(ImageError),

    #[error("Image exceeds decoding limits: {0}")]
    Limits(String),

    #[error("Failed to encode compressed image: {0}")]
    Encode(ImageError),
}
