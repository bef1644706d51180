//! Still-image display surface.
//!
//! Treats an in-memory RGBA image as if it were the screen. Used on
//! headless hosts, for replaying a saved screenshot, and by the tests.

use std::path::Path;

use image::RgbaImage;

use super::region::{blit_to_bgra, CaptureRequest};
use super::{CaptureError, FrameGrabber, RawFrame};

#[derive(Debug, Clone)]
pub struct ImageGrabber {
    surface: RgbaImage,
    origin: (i32, i32),
}

impl ImageGrabber {
    /// Uses `surface` as the display, top-left pixel at screen (0, 0).
    pub fn new(surface: RgbaImage) -> Self {
        Self {
            surface,
            origin: (0, 0),
        }
    }

    /// Places the surface's top-left pixel at screen `(x, y)`.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Loads any format the `image` crate can decode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let surface = image::open(path)
            .map_err(|e| CaptureError::SurfaceLoad(format!("{}: {}", path.display(), e)))?
            .to_rgba8();

        log::info!(
            "[CAPTURE] Loaded surface {} ({}x{})",
            path.display(),
            surface.width(),
            surface.height()
        );
        Ok(Self::new(surface))
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface.dimensions()
    }
}

impl FrameGrabber for ImageGrabber {
    fn name(&self) -> &'static str {
        "image"
    }

    fn capture(&self, request: &CaptureRequest) -> Result<RawFrame, CaptureError> {
        let pixels = blit_to_bgra(&self.surface, self.origin, request)?;
        RawFrame::bgra(request.width(), request.height(), pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn capture_produces_bgra_of_requested_size() {
        let grabber = ImageGrabber::new(RgbaImage::from_pixel(64, 48, Rgba([1, 2, 3, 4])));
        let request = CaptureRequest::new(10, 10, 20, 5).unwrap();

        let frame = grabber.capture(&request).unwrap();
        assert_eq!((frame.width(), frame.height()), (20, 5));
        assert_eq!(frame.pixels().len(), 20 * 5 * 4);
        assert_eq!(&frame.pixels()[..4], &[3, 2, 1, 4]);
    }

    #[test]
    fn open_missing_file_fails() {
        let result = ImageGrabber::open("/definitely/not/here.png");
        assert!(matches!(result, Err(CaptureError::SurfaceLoad(_))));
    }

    #[test]
    fn open_round_trips_saved_png() {
        let path = std::env::temp_dir().join(format!("screen-grab-surface-{}.png", std::process::id()));
        RgbaImage::from_pixel(8, 4, Rgba([9, 8, 7, 255]))
            .save(&path)
            .unwrap();

        let grabber = ImageGrabber::open(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(grabber.surface_size(), (8, 4));
        let frame = grabber
            .capture(&CaptureRequest::new(0, 0, 1, 1).unwrap())
            .unwrap();
        assert_eq!(frame.pixels(), &[7, 8, 9, 255]);
    }
}
