//! Image encoding domain: turns a `RawFrame` into a self-contained
//! JPEG or PNG buffer.
//!
//! One `ImageEncoder` implementation per container; each owns its own
//! channel conversion. `EncodeTarget::encoder` picks the strategy.

mod jpeg;
mod png;

pub use jpeg::{bgra_to_rgb, JpegEncoder, DEFAULT_JPEG_QUALITY};
pub use png::{bgra_to_rgba, PngEncoder};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::capture::{ChannelLayout, RawFrame};

/// Compressed container to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeTarget {
    Jpeg,
    #[default]
    Png,
}

impl EncodeTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            EncodeTarget::Jpeg => "jpeg",
            EncodeTarget::Png => "png",
        }
    }

    /// Leading bytes every buffer of this format starts with.
    pub fn magic(self) -> &'static [u8] {
        match self {
            EncodeTarget::Jpeg => &[0xFF, 0xD8],
            EncodeTarget::Png => &[0x89, 0x50, 0x4E, 0x47],
        }
    }

    /// Builds the encoder strategy for this target.
    ///
    /// `jpeg_quality` is ignored for PNG but still validated, so a bad
    /// setting is caught regardless of which target is active.
    pub fn encoder(self, jpeg_quality: u8) -> Result<Arc<dyn ImageEncoder>, EncodeError> {
        let jpeg = JpegEncoder::new(jpeg_quality)?;
        let encoder: Arc<dyn ImageEncoder> = match self {
            EncodeTarget::Jpeg => Arc::new(jpeg),
            EncodeTarget::Png => Arc::new(PngEncoder),
        };
        Ok(encoder)
    }
}

impl fmt::Display for EncodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodeTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(EncodeTarget::Jpeg),
            "png" => Ok(EncodeTarget::Png),
            other => Err(format!("unknown image format '{}'", other)),
        }
    }
}

/// The terminal artifact of a capture request.
///
/// `bits_per_pixel`/`bytes_per_pixel` describe the uncompressed layout the
/// codec was fed (RGB24 for JPEG, 32-bit for PNG), not the compressed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    buffer: Vec<u8>,
    format: EncodeTarget,
    width: u32,
    height: u32,
    bits_per_pixel: u8,
    bytes_per_pixel: u8,
}

impl EncodedImage {
    pub(crate) fn new(
        buffer: Vec<u8>,
        format: EncodeTarget,
        width: u32,
        height: u32,
        codec_layout: ChannelLayout,
    ) -> Result<Self, EncodeError> {
        if buffer.is_empty() {
            return Err(EncodeError::EmptyOutput(format));
        }

        Ok(Self {
            buffer,
            format,
            width,
            height,
            bits_per_pixel: codec_layout.bits_per_pixel(),
            bytes_per_pixel: codec_layout.bytes_per_pixel() as u8,
        })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn format(&self) -> EncodeTarget {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn bytes_per_pixel(&self) -> u8 {
        self.bytes_per_pixel
    }

    /// Always true: both containers are compressed.
    pub fn is_compressed(&self) -> bool {
        true
    }
}

/// One compression strategy.
pub trait ImageEncoder: Send + Sync {
    fn target(&self) -> EncodeTarget;

    fn encode(&self, frame: &RawFrame) -> Result<EncodedImage, EncodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("JPEG quality must be between 1 and 100 (got {0})")]
    InvalidQuality(u8),

    #[error("{format} encoding failed: {reason}")]
    EncodingFailed { format: EncodeTarget, reason: String },

    #[error("{0} encoder produced no output")]
    EmptyOutput(EncodeTarget),
}
