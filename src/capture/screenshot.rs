//! Primary-monitor capture using the `xcap` crate.
//!
//! This is the infrastructure layer; it talks to the OS.
//! xcap hands back the whole monitor; the requested rectangle is then
//! blitted out of that snapshot by the pure code in `region`.

use xcap::Monitor;

use super::region::{blit_to_bgra, CaptureRequest};
use super::{CaptureError, FrameGrabber, RawFrame};

/// Grabs rectangles from the primary monitor via xcap.
///
/// Default backend on macOS and Linux (X11 and Wayland portals).
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorGrabber;

impl FrameGrabber for MonitorGrabber {
    fn name(&self) -> &'static str {
        "monitor"
    }

    fn capture(&self, request: &CaptureRequest) -> Result<RawFrame, CaptureError> {
        let monitor = primary_monitor()?;

        let origin = (
            monitor
                .x()
                .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?,
            monitor
                .y()
                .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?,
        );

        let surface = monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        log::debug!(
            "[CAPTURE] Monitor surface {}x{} at {:?}",
            surface.width(),
            surface.height(),
            origin
        );

        let pixels = blit_to_bgra(&surface, origin, request)?;
        RawFrame::bgra(request.width(), request.height(), pixels)
    }
}

/// Finds the primary monitor, falling back to the first one reported.
fn primary_monitor() -> Result<Monitor, CaptureError> {
    let monitors = Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    let primary_index = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);

    monitors
        .into_iter()
        .nth(primary_index)
        .ok_or(CaptureError::NoPrimaryMonitor)
}
