//! Capture-and-encode pipeline.
//!
//! A request runs Received → Captured → Encoded, or stops at the first
//! failure. The frame is dropped as soon as it has been encoded and nothing
//! is kept between requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::{self, CaptureError, CaptureRequest, FrameGrabber, RequestError};
use crate::config::Settings;
use crate::encode::{EncodeError, EncodedImage, ImageEncoder};

/// A grabber paired with an encoder.
#[derive(Clone)]
pub struct ScreenCapture {
    grabber: Arc<dyn FrameGrabber>,
    encoder: Arc<dyn ImageEncoder>,
    timeout: Option<Duration>,
}

impl ScreenCapture {
    pub fn new(grabber: Arc<dyn FrameGrabber>, encoder: Arc<dyn ImageEncoder>) -> Self {
        Self {
            grabber,
            encoder,
            timeout: None,
        }
    }

    /// Builds the backend and encoder named by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ScreenCaptureError> {
        let grabber = capture::grabber_for(settings.backend)?;
        let encoder = settings.target.encoder(settings.jpeg_quality)?;

        log::info!(
            "[CAPTURE] Pipeline ready: backend={} target={} quality={} timeout={:?}",
            grabber.name(),
            encoder.target(),
            settings.jpeg_quality,
            settings.capture_timeout()
        );

        let capture = Self::new(grabber, encoder);
        Ok(match settings.capture_timeout() {
            Some(limit) => capture.with_timeout(limit),
            None => capture,
        })
    }

    /// Deadline applied by `run_with_timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Validates the rectangle, captures it and encodes it.
    ///
    /// Invalid rectangles are rejected before the grabber is touched.
    pub fn capture_screen_area(
        &self,
        x: i32,
        y: i32,
        width: i64,
        height: i64,
    ) -> Result<EncodedImage, ScreenCaptureError> {
        let request = CaptureRequest::new(x, y, width, height)?;
        self.run(&request)
    }

    /// Runs one request on the calling thread.
    pub fn run(&self, request: &CaptureRequest) -> Result<EncodedImage, ScreenCaptureError> {
        run_pipeline(self.grabber.as_ref(), self.encoder.as_ref(), request)
    }

    /// Runs one request on tokio's blocking pool, bounded by the configured
    /// timeout if there is one.
    ///
    /// On timeout the caller gets `CaptureError::TimedOut` right away; the
    /// worker keeps running until the OS call returns and then releases its
    /// handles as usual.
    pub async fn run_with_timeout(
        &self,
        request: CaptureRequest,
    ) -> Result<EncodedImage, ScreenCaptureError> {
        let grabber = Arc::clone(&self.grabber);
        let encoder = Arc::clone(&self.encoder);
        let worker = tokio::task::spawn_blocking(move || {
            run_pipeline(grabber.as_ref(), encoder.as_ref(), &request)
        });

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, worker).await.map_err(|_| {
                log::warn!("[CAPTURE] Request timed out after {}ms", limit.as_millis());
                CaptureError::TimedOut {
                    timeout_ms: limit.as_millis() as u64,
                }
            })?,
            None => worker.await,
        };

        joined.map_err(|e| ScreenCaptureError::Worker(e.to_string()))?
    }
}

fn run_pipeline(
    grabber: &dyn FrameGrabber,
    encoder: &dyn ImageEncoder,
    request: &CaptureRequest,
) -> Result<EncodedImage, ScreenCaptureError> {
    let start = Instant::now();

    let frame = grabber.capture(request)?;
    let capture_ms = start.elapsed().as_millis();
    log::info!(
        "[CAPTURE] Captured {}x{} at {},{} via {} in {}ms",
        request.width(),
        request.height(),
        request.x(),
        request.y(),
        grabber.name(),
        capture_ms
    );

    let image = encoder.encode(&frame)?;
    let encode_ms = start.elapsed().as_millis() - capture_ms;
    log::info!(
        "[ENCODE] {} encoded in {}ms, {} bytes",
        image.format(),
        encode_ms,
        image.buffer().len()
    );

    Ok(image)
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenCaptureError {
    #[error("Invalid capture request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Capture worker failed: {0}")]
    Worker(String),
}

impl ScreenCaptureError {
    /// Stable error code sent across the method channel.
    pub fn code(&self) -> &'static str {
        match self {
            ScreenCaptureError::InvalidRequest(_) => "invalid_request",
            ScreenCaptureError::Capture(_) | ScreenCaptureError::Worker(_) => "capture_failed",
            ScreenCaptureError::Encode(_) => "encode_failed",
        }
    }
}
