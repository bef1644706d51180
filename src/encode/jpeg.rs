//! Baseline JPEG strategy.

use std::borrow::Cow;

use image::codecs::jpeg::JpegEncoder as JpegCodec;
use image::ExtendedColorType;

use super::{EncodeError, EncodeTarget, EncodedImage, ImageEncoder};
use crate::capture::{ChannelLayout, RawFrame};

/// Quality used when nothing else is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 50;

/// Lossy RGB24 encoder. Alpha is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Result<Self, EncodeError> {
        if !(1..=100).contains(&quality) {
            return Err(EncodeError::InvalidQuality(quality));
        }
        Ok(Self { quality })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageEncoder for JpegEncoder {
    fn target(&self) -> EncodeTarget {
        EncodeTarget::Jpeg
    }

    fn encode(&self, frame: &RawFrame) -> Result<EncodedImage, EncodeError> {
        let rgb: Cow<'_, [u8]> = match frame.layout() {
            ChannelLayout::Bgra32 => Cow::Owned(bgra_to_rgb(frame.pixels())),
            ChannelLayout::Rgb24 => Cow::Borrowed(frame.pixels()),
        };

        let mut buffer = Vec::with_capacity(rgb.len() / 8);
        JpegCodec::new_with_quality(&mut buffer, self.quality)
            .encode(&rgb, frame.width(), frame.height(), ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::EncodingFailed {
                format: EncodeTarget::Jpeg,
                reason: e.to_string(),
            })?;

        EncodedImage::new(
            buffer,
            EncodeTarget::Jpeg,
            frame.width(),
            frame.height(),
            ChannelLayout::Rgb24,
        )
    }
}

/// BGRA32 → RGB24: reverse the B,G,R triple and drop alpha.
pub fn bgra_to_rgb(bgra: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(bgra.len() / 4 * 3);
    for px in bgra.chunks_exact(4) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    rgb
}
