//! Screen capture domain: public API.
//!
//! This module owns everything that touches the display surface.
//! External code talks to a `FrameGrabber` and gets back a `RawFrame`
//! in BGRA32 top-down order; which backend produced it is invisible.

mod region;
mod screenshot;
mod surface;

#[cfg(target_os = "windows")]
mod gdi;

pub use region::{blit_to_bgra, CaptureRequest, RequestError, MAX_CAPTURE_PIXELS};
pub use screenshot::MonitorGrabber;
pub use surface::ImageGrabber;

#[cfg(target_os = "windows")]
pub use gdi::GdiGrabber;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Per-pixel channel order of a `RawFrame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// B, G, R, A: what every grabber produces.
    Bgra32,
    /// R, G, B: what the JPEG codec consumes.
    Rgb24,
}

impl ChannelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ChannelLayout::Bgra32 => 4,
            ChannelLayout::Rgb24 => 3,
        }
    }

    pub fn bits_per_pixel(self) -> u8 {
        (self.bytes_per_pixel() * 8) as u8
    }
}

/// Uncompressed pixels for one captured rectangle.
///
/// The buffer length always equals `width * height * bytes_per_pixel`;
/// `RawFrame::new` refuses anything else, so encoders never see a short row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    pixels: Vec<u8>,
}

impl RawFrame {
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        pixels: Vec<u8>,
    ) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * layout.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(CaptureError::FrameSize {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }

    /// Shorthand for the layout every grabber emits.
    pub fn bgra(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CaptureError> {
        Self::new(width, height, ChannelLayout::Bgra32, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// A zero-filled pixel buffer, or `FrameAllocation` if the allocator refuses.
pub(crate) fn zeroed_pixels(len: usize) -> Result<Vec<u8>, CaptureError> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| CaptureError::FrameAllocation { bytes: len })?;
    pixels.resize(len, 0);
    Ok(pixels)
}

/// Something that can copy a rectangle of the display into a `RawFrame`.
///
/// Implementations acquire and release all of their OS resources inside
/// `capture`; nothing survives between calls.
pub trait FrameGrabber: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn capture(&self, request: &CaptureRequest) -> Result<RawFrame, CaptureError>;
}

/// Which grabber `grabber_for` should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// GDI on Windows, the monitor snapshot everywhere else.
    #[default]
    Auto,
    Gdi,
    Monitor,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "gdi" => Ok(Backend::Gdi),
            "monitor" | "xcap" => Ok(Backend::Monitor),
            other => Err(format!("unknown capture backend '{}'", other)),
        }
    }
}

/// Builds the grabber for the requested backend on this platform.
pub fn grabber_for(backend: Backend) -> Result<Arc<dyn FrameGrabber>, CaptureError> {
    match backend {
        Backend::Monitor => Ok(Arc::new(MonitorGrabber)),
        #[cfg(target_os = "windows")]
        Backend::Auto | Backend::Gdi => Ok(Arc::new(GdiGrabber)),
        #[cfg(not(target_os = "windows"))]
        Backend::Auto => Ok(Arc::new(MonitorGrabber)),
        #[cfg(not(target_os = "windows"))]
        Backend::Gdi => Err(CaptureError::Unsupported(
            "the GDI backend is only available on Windows".to_string(),
        )),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Display device unavailable: {0} failed")]
    DeviceUnavailable(&'static str),

    #[error("Blit from the display surface failed: {0}")]
    BlitFailed(String),

    #[error("Pixel readback returned {copied} of {expected} rows")]
    ReadbackFailed { expected: u32, copied: i32 },

    #[error("Failed to load surface image: {0}")]
    SurfaceLoad(String),

    #[error("Capture backend not supported: {0}")]
    Unsupported(String),

    #[error("Capture did not finish within {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("Could not allocate a {bytes}-byte frame buffer")]
    FrameAllocation { bytes: usize },

    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
}
