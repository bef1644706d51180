//! Lossless PNG strategy.

use std::borrow::Cow;

use image::codecs::png::PngEncoder as PngCodec;
use image::{ExtendedColorType, ImageEncoder as _};

use super::{EncodeError, EncodeTarget, EncodedImage, ImageEncoder};
use crate::capture::{ChannelLayout, RawFrame};

/// PNG encoder. The `png` codec has no BGRA input mode, so BGRA32 frames are
/// reordered to RGBA first; every channel value survives unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn target(&self) -> EncodeTarget {
        EncodeTarget::Png
    }

    fn encode(&self, frame: &RawFrame) -> Result<EncodedImage, EncodeError> {
        let (pixels, color): (Cow<'_, [u8]>, _) = match frame.layout() {
            ChannelLayout::Bgra32 => (
                Cow::Owned(bgra_to_rgba(frame.pixels())),
                ExtendedColorType::Rgba8,
            ),
            ChannelLayout::Rgb24 => (Cow::Borrowed(frame.pixels()), ExtendedColorType::Rgb8),
        };

        let mut buffer = Vec::new();
        PngCodec::new(&mut buffer)
            .write_image(&pixels, frame.width(), frame.height(), color)
            .map_err(|e| EncodeError::EncodingFailed {
                format: EncodeTarget::Png,
                reason: e.to_string(),
            })?;

        EncodedImage::new(
            buffer,
            EncodeTarget::Png,
            frame.width(),
            frame.height(),
            frame.layout(),
        )
    }
}

/// BGRA32 → RGBA32: swap B and R, keep G and alpha.
pub fn bgra_to_rgba(bgra: &[u8]) -> Vec<u8> {
    let mut rgba = bgra.to_vec();
    for px in rgba.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    rgba
}
