//! GDI BitBlt capture backend.
//!
//! This module is only compiled on Windows. Pipeline:
//!
//! ```text
//! GetDC(desktop) ─► CreateCompatibleDC ─► CreateCompatibleBitmap(w×h)
//!   │  SelectObject(bitmap) + BitBlt(SRCCOPY) from (x, y)
//!   ▼
//! GetDIBits(32 bpp, top-down) ─► Vec<u8> BGRA ─► RawFrame
//! ```
//!
//! Each handle lives in a guard whose `Drop` releases it, so a failed blit
//! or readback still leaves the process GDI object count unchanged.

use std::ffi::c_void;
use std::mem::size_of;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC,
    HGDIOBJ, SRCCOPY,
};

use super::region::CaptureRequest;
use super::{zeroed_pixels, CaptureError, FrameGrabber, RawFrame};

/// Grabs rectangles from the desktop DC with BitBlt.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdiGrabber;

impl FrameGrabber for GdiGrabber {
    fn name(&self) -> &'static str {
        "gdi"
    }

    fn capture(&self, request: &CaptureRequest) -> Result<RawFrame, CaptureError> {
        // CaptureRequest guarantees both fit in i32.
        let width = request.width() as i32;
        let height = request.height() as i32;

        // Declaration order is release order in reverse.
        let screen = ScreenDc::acquire()?;
        let memory = MemoryDc::compatible_with(&screen)?;
        let bitmap = Bitmap::compatible_with(&screen, width, height)?;

        {
            let _selection = Selection::select(&memory, &bitmap)?;
            unsafe {
                BitBlt(
                    memory.0,
                    0,
                    0,
                    width,
                    height,
                    screen.0,
                    request.x(),
                    request.y(),
                    SRCCOPY,
                )
            }
            .map_err(|e| CaptureError::BlitFailed(e.to_string()))?;
        }

        // GetDIBits wants the bitmap deselected, which the scope above did.
        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // top-down
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut pixels = zeroed_pixels(request.bgra_len())?;
        let copied = unsafe {
            GetDIBits(
                memory.0,
                bitmap.0,
                0,
                height as u32,
                Some(pixels.as_mut_ptr() as *mut c_void),
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        if copied != height {
            return Err(CaptureError::ReadbackFailed {
                expected: request.height(),
                copied,
            });
        }

        // Screen DCs leave the fourth byte undefined (usually 0).
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 0xFF;
        }

        RawFrame::bgra(request.width(), request.height(), pixels)
    }
}

// ── Handle guards ─────────────────────────────────────────────────────────────

struct ScreenDc(HDC);

impl ScreenDc {
    fn acquire() -> Result<Self, CaptureError> {
        let hdc = unsafe { GetDC(HWND::default()) };
        if hdc.is_invalid() {
            return Err(CaptureError::DeviceUnavailable("GetDC"));
        }
        Ok(Self(hdc))
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        if unsafe { ReleaseDC(HWND::default(), self.0) } == 0 {
            log::warn!("[CAPTURE] ReleaseDC failed for desktop DC");
        }
    }
}

struct MemoryDc(HDC);

impl MemoryDc {
    fn compatible_with(screen: &ScreenDc) -> Result<Self, CaptureError> {
        let hdc = unsafe { CreateCompatibleDC(screen.0) };
        if hdc.is_invalid() {
            return Err(CaptureError::DeviceUnavailable("CreateCompatibleDC"));
        }
        Ok(Self(hdc))
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        if !unsafe { DeleteDC(self.0) }.as_bool() {
            log::warn!("[CAPTURE] DeleteDC failed for memory DC");
        }
    }
}

struct Bitmap(HBITMAP);

impl Bitmap {
    fn compatible_with(screen: &ScreenDc, width: i32, height: i32) -> Result<Self, CaptureError> {
        let bitmap = unsafe { CreateCompatibleBitmap(screen.0, width, height) };
        if bitmap.is_invalid() {
            return Err(CaptureError::DeviceUnavailable("CreateCompatibleBitmap"));
        }
        Ok(Self(bitmap))
    }

    fn as_object(&self) -> HGDIOBJ {
        HGDIOBJ(self.0 .0)
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        if !unsafe { DeleteObject(self.as_object()) }.as_bool() {
            log::warn!("[CAPTURE] DeleteObject failed for capture bitmap");
        }
    }
}

/// Keeps a bitmap selected into a memory DC; restores the previous object on drop.
struct Selection<'a> {
    dc: &'a MemoryDc,
    previous: HGDIOBJ,
}

impl<'a> Selection<'a> {
    fn select(dc: &'a MemoryDc, bitmap: &Bitmap) -> Result<Self, CaptureError> {
        let previous = unsafe { SelectObject(dc.0, bitmap.as_object()) };
        if previous.is_invalid() {
            return Err(CaptureError::DeviceUnavailable("SelectObject"));
        }
        Ok(Self { dc, previous })
    }
}

impl Drop for Selection<'_> {
    fn drop(&mut self) {
        unsafe { SelectObject(self.dc.0, self.previous) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::System::Threading::GetCurrentProcess;
    use windows::Win32::UI::WindowsAndMessaging::{GetGuiResources, GR_GDIOBJECTS};

    fn gdi_object_count() -> u32 {
        unsafe { GetGuiResources(GetCurrentProcess(), GR_GDIOBJECTS) }
    }

    #[test]
    #[ignore = "needs an interactive desktop session"]
    fn repeated_captures_leave_gdi_count_unchanged() {
        let grabber = GdiGrabber;
        let request = CaptureRequest::new(0, 0, 100, 100).unwrap();

        // Warm up so lazily created per-process GDI objects are counted.
        grabber.capture(&request).unwrap();
        let before = gdi_object_count();

        for _ in 0..1000 {
            let frame = grabber.capture(&request).unwrap();
            assert_eq!(frame.pixels().len(), 100 * 100 * 4);
        }

        assert_eq!(gdi_object_count(), before);
    }
}
