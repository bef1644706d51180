//! Shared fixtures: synthetic display surfaces and an instrumented grabber.

#![allow(dead_code)]

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use screen_grab_lib::capture::{CaptureError, ImageGrabber};
use screen_grab_lib::{CaptureRequest, FrameGrabber, RawFrame};

/// 200×150 surface where pixel (x, y) is RGBA(x, y, x ^ y, 255).
pub fn desktop() -> RgbaImage {
    RgbaImage::from_fn(200, 150, |x, y| {
        Rgba([x as u8, y as u8, (x ^ y) as u8, 255])
    })
}

/// Stand-in for an OS handle: counts itself live until dropped.
pub struct Lease(Arc<AtomicIsize>);

impl Lease {
    pub fn acquire(live: &Arc<AtomicIsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Lease(Arc::clone(live))
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wraps an `ImageGrabber`, holding two leases per capture the way a real
/// backend holds a display handle and an off-screen surface. Every
/// `fail_every`-th call fails after both leases are taken.
pub struct CountingGrabber {
    inner: ImageGrabber,
    live: Arc<AtomicIsize>,
    calls: AtomicUsize,
    fail_every: usize,
    delay: Option<Duration>,
}

impl CountingGrabber {
    pub fn new(surface: RgbaImage) -> Self {
        Self {
            inner: ImageGrabber::new(surface),
            live: Arc::new(AtomicIsize::new(0)),
            calls: AtomicUsize::new(0),
            fail_every: 0,
            delay: None,
        }
    }

    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = n;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn live_leases(&self) -> isize {
        self.live.load(Ordering::SeqCst)
    }
}

impl FrameGrabber for CountingGrabber {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn capture(&self, request: &CaptureRequest) -> Result<RawFrame, CaptureError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let _display = Lease::acquire(&self.live);
        let _surface = Lease::acquire(&self.live);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(CaptureError::BlitFailed(format!("synthetic failure #{}", n)));
        }
        self.inner.capture(request)
    }
}
