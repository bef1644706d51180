//! screen-grab: capture a rectangle of the primary display as JPEG or PNG.
//!
//! This is the crate root that wires together:
//! - Screen capture domain (capture/): display surface → BGRA32 frame
//! - Image encoding domain (encode/): frame → JPEG/PNG buffer
//! - The pipeline joining the two, and the method channel in front of it
//! - A stdin/stdout host for running the channel out of process

pub mod capture;
pub mod channel;
pub mod config;
pub mod encode;
pub mod host;
pub mod pipeline;

pub use capture::{CaptureRequest, FrameGrabber, RawFrame};
pub use channel::{MethodCall, MethodHandler, MethodResponse, ResponseShape};
pub use config::Settings;
pub use encode::{EncodeTarget, EncodedImage, ImageEncoder};
pub use pipeline::{ScreenCapture, ScreenCaptureError};

/// Entry point, called by the `screen-grab` binary.
///
/// Loads settings, builds the pipeline, then answers method calls from
/// stdin until it closes.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = Settings::load()?;
    let capture = ScreenCapture::from_settings(&settings)?;
    let handler = MethodHandler::new(capture, settings.response_shape);
    let runtime = host::runtime()?;

    log::info!(
        "screen-grab v{} serving channel '{}'",
        env!("CARGO_PKG_VERSION"),
        channel::CHANNEL_NAME
    );

    let start = std::time::Instant::now();
    let stdin = std::io::stdin();
    let answered = host::serve(&handler, &runtime, stdin.lock(), std::io::stdout().lock())?;

    log::info!(
        "stdin closed, answered {} calls in {}ms",
        answered,
        start.elapsed().as_millis()
    );
    Ok(())
}
