//! Pure region logic: functional core.
//!
//! This module has zero infrastructure dependencies.
//! It validates rectangles and blits pixels from a surface snapshot
//! into a BGRA32 off-screen buffer.

use image::RgbaImage;

use super::{zeroed_pixels, CaptureError};

/// Largest rectangle accepted, in pixels (1 GiB as BGRA32).
pub const MAX_CAPTURE_PIXELS: u64 = 1 << 28;

/// A validated screen-space rectangle.
///
/// `x` and `y` may be negative (virtual desktop coordinates). Width and
/// height are always positive, fit GDI's `i32` extents, and cover at most
/// `MAX_CAPTURE_PIXELS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl CaptureRequest {
    /// Validates a rectangle as it arrives over the wire.
    ///
    /// # Arguments
    /// * `x` - Left edge in screen coordinates
    /// * `y` - Top edge in screen coordinates
    /// * `width` - Width in pixels, must be > 0
    /// * `height` - Height in pixels, must be > 0
    pub fn new(x: i32, y: i32, width: i64, height: i64) -> Result<Self, RequestError> {
        if width <= 0 || height <= 0 {
            return Err(RequestError::NonPositiveDimension { width, height });
        }

        let max = i32::MAX as i64;
        let pixels = (width as u64).saturating_mul(height as u64);
        if width > max || height > max || pixels > MAX_CAPTURE_PIXELS {
            return Err(RequestError::TooLarge { width, height });
        }

        Ok(Self {
            x,
            y,
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte length of this rectangle as BGRA32.
    pub fn bgra_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Capture rectangle must have positive width and height (got {width}x{height})")]
    NonPositiveDimension { width: i64, height: i64 },

    #[error("Capture rectangle {width}x{height} exceeds {} pixels", MAX_CAPTURE_PIXELS)]
    TooLarge { width: i64, height: i64 },
}

/// Copies `request` out of an RGBA surface snapshot into a BGRA32 buffer.
///
/// `origin` is the screen-space position of the surface's top-left pixel.
/// No scaling happens: output pixel (col, row) comes from surface pixel
/// (request.x - origin.x + col, request.y - origin.y + row). Pixels that
/// fall outside the surface stay zero, the way GDI leaves unreachable
/// areas black.
///
/// The returned buffer is always `request.bgra_len()` bytes, rows top-down.
pub fn blit_to_bgra(
    surface: &RgbaImage,
    origin: (i32, i32),
    request: &CaptureRequest,
) -> Result<Vec<u8>, CaptureError> {
    let width = request.width() as usize;
    let height = request.height() as usize;
    let mut pixels = zeroed_pixels(request.bgra_len())?;

    let surface_width = surface.width() as i64;
    let surface_height = surface.height() as i64;
    let left = request.x() as i64 - origin.0 as i64;
    let top = request.y() as i64 - origin.1 as i64;

    // Visible column span of the request, in request coordinates.
    let col_start = (-left).clamp(0, width as i64) as usize;
    let col_end = (surface_width - left).clamp(0, width as i64) as usize;
    if col_start >= col_end {
        return Ok(pixels);
    }

    let source = surface.as_raw();
    let src_x = (left + col_start as i64) as usize;
    let span = col_end - col_start;

    for row in 0..height {
        let src_y = top + row as i64;
        if src_y < 0 || src_y >= surface_height {
            continue;
        }

        let src_begin = (src_y as usize * surface_width as usize + src_x) * 4;
        let dst_begin = (row * width + col_start) * 4;
        let src_row = &source[src_begin..src_begin + span * 4];
        let dst_row = &mut pixels[dst_begin..dst_begin + span * 4];

        for (dst, src) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }
    }

    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 200, 255]))
    }

    #[test]
    fn zero_dimension_fails() {
        let result = CaptureRequest::new(0, 0, 0, 50);
        assert!(matches!(
            result,
            Err(RequestError::NonPositiveDimension { width: 0, height: 50 })
        ));
    }

    #[test]
    fn negative_dimension_fails() {
        assert!(CaptureRequest::new(0, 0, 10, -1).is_err());
    }

    #[test]
    fn oversized_dimension_fails() {
        let result = CaptureRequest::new(0, 0, i32::MAX as i64 + 1, 1);
        assert!(matches!(result, Err(RequestError::TooLarge { .. })));
    }

    #[test]
    fn huge_but_addressable_rectangle_fails() {
        let result = CaptureRequest::new(0, 0, 1_000_000, 1_000_000);
        assert!(matches!(
            result,
            Err(RequestError::TooLarge {
                width: 1_000_000,
                height: 1_000_000
            })
        ));
    }

    #[test]
    fn pixel_cap_is_inclusive() {
        assert!(CaptureRequest::new(0, 0, 1 << 14, 1 << 14).is_ok());
        assert!(CaptureRequest::new(0, 0, (1 << 14) + 1, 1 << 14).is_err());
        assert!(CaptureRequest::new(0, 0, 70_000, 1).is_ok());
        assert!(CaptureRequest::new(0, 0, i64::MAX, i64::MAX).is_err());
    }

    #[test]
    fn negative_origin_is_allowed() {
        let request = CaptureRequest::new(-1920, -40, 100, 100).unwrap();
        assert_eq!((request.x(), request.y()), (-1920, -40));
        assert_eq!(request.bgra_len(), 40_000);
    }

    #[test]
    fn blit_copies_subrectangle_as_bgra() {
        let surface = gradient(100, 100);
        let request = CaptureRequest::new(10, 20, 3, 2).unwrap();
        let pixels = blit_to_bgra(&surface, (0, 0), &request).unwrap();

        assert_eq!(pixels.len(), 3 * 2 * 4);
        // Row 0, col 0 comes from surface (10, 20): R=10, G=20, B=200.
        assert_eq!(&pixels[..4], &[200, 20, 10, 255]);
        // Row 1, col 2 comes from surface (12, 21).
        let last = (1 * 3 + 2) * 4;
        assert_eq!(&pixels[last..last + 4], &[200, 21, 12, 255]);
    }

    #[test]
    fn blit_honours_surface_origin() {
        let surface = gradient(50, 50);
        let request = CaptureRequest::new(-95, 5, 1, 1).unwrap();
        let pixels = blit_to_bgra(&surface, (-100, 0), &request).unwrap();
        assert_eq!(pixels, vec![200, 5, 5, 255]);
    }

    #[test]
    fn blit_clips_outside_surface_to_zero() {
        let surface = gradient(10, 10);
        let request = CaptureRequest::new(8, 8, 4, 4).unwrap();
        let pixels = blit_to_bgra(&surface, (0, 0), &request).unwrap();

        assert_eq!(pixels.len(), 4 * 4 * 4);
        // (0,0) is surface (8,8), visible.
        assert_eq!(&pixels[..4], &[200, 8, 8, 255]);
        // (2,0) is surface (10,8), off the right edge.
        assert_eq!(&pixels[8..12], &[0, 0, 0, 0]);
        // Whole row 3 is below the surface.
        assert!(pixels[48..].iter().all(|&b| b == 0));
    }

    #[test]
    fn blit_entirely_offscreen_is_all_zero() {
        let surface = gradient(10, 10);
        let request = CaptureRequest::new(500, 500, 5, 5).unwrap();
        let pixels = blit_to_bgra(&surface, (0, 0), &request).unwrap();
        assert_eq!(pixels.len(), 100);
        assert!(pixels.iter().all(|&b| b == 0));
    }
}
