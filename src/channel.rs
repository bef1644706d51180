//! Method channel: the boundary between a remote caller and the pipeline.
//!
//! A caller sends `{ "method": "captureScreenArea", "arguments": {x, y,
//! width, height} }` and gets back a tagged `MethodResponse`. Any other
//! method name is answered with `not_implemented` before anything touches
//! the display.
//!
//! Two success shapes exist because deployments disagree on what callers
//! expect; `ResponseShape` picks one per handler.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

use crate::capture::CaptureRequest;
use crate::encode::{EncodeTarget, EncodedImage};
use crate::pipeline::{ScreenCapture, ScreenCaptureError};

/// Channel name hosts register the handler under.
pub const CHANNEL_NAME: &str = "flutter_screen_capture";

/// The only method this channel implements.
pub const CAPTURE_SCREEN_AREA: &str = "captureScreenArea";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// A `captureScreenArea` call for the given rectangle.
    pub fn capture_screen_area(x: i32, y: i32, width: i64, height: i64) -> Self {
        Self::new(
            CAPTURE_SCREEN_AREA,
            serde_json::json!({ "x": x, "y": y, "width": width, "height": height }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CaptureAreaArgs {
    x: i32,
    y: i32,
    width: i64,
    height: i64,
}

/// `{buffer, format}`: what the JPEG deployment returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightweightResponse {
    #[serde(serialize_with = "as_base64")]
    pub buffer: Vec<u8>,
    pub format: EncodeTarget,
}

/// `{buffer, width, height, bitsPerPixel, bytesPerPixel, isCompressed}`:
/// what the PNG deployment returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RichResponse {
    #[serde(serialize_with = "as_base64")]
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u8,
    pub bytes_per_pixel: u8,
    pub is_compressed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CapturePayload {
    Lightweight(LightweightResponse),
    Rich(RichResponse),
}

impl CapturePayload {
    pub fn buffer(&self) -> &[u8] {
        match self {
            CapturePayload::Lightweight(r) => &r.buffer,
            CapturePayload::Rich(r) => &r.buffer,
        }
    }
}

/// Which success DTO a handler emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    Lightweight,
    #[default]
    Rich,
}

impl ResponseShape {
    pub fn shape(self, image: EncodedImage) -> CapturePayload {
        match self {
            ResponseShape::Lightweight => CapturePayload::Lightweight(LightweightResponse {
                format: image.format(),
                buffer: image.into_buffer(),
            }),
            ResponseShape::Rich => CapturePayload::Rich(RichResponse {
                width: image.width(),
                height: image.height(),
                bits_per_pixel: image.bits_per_pixel(),
                bytes_per_pixel: image.bytes_per_pixel(),
                is_compressed: image.is_compressed(),
                buffer: image.into_buffer(),
            }),
        }
    }
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lightweight" | "light" => Ok(ResponseShape::Lightweight),
            "rich" => Ok(ResponseShape::Rich),
            other => Err(format!("unknown response shape '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success { result: CapturePayload },
    Error { code: String, message: String },
    NotImplemented { method: String },
}

impl MethodResponse {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Routes method calls to a `ScreenCapture`.
#[derive(Clone)]
pub struct MethodHandler {
    capture: ScreenCapture,
    shape: ResponseShape,
}

impl MethodHandler {
    pub fn new(capture: ScreenCapture, shape: ResponseShape) -> Self {
        Self { capture, shape }
    }

    /// Handles a call on the current thread. Ignores the capture timeout.
    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        match self.route(call) {
            Ok(request) => self.respond(self.capture.run(&request)),
            Err(response) => response,
        }
    }

    /// Handles a call on the blocking pool, honouring the capture timeout.
    pub async fn handle_async(&self, call: &MethodCall) -> MethodResponse {
        match self.route(call) {
            Ok(request) => self.respond(self.capture.run_with_timeout(request).await),
            Err(response) => response,
        }
    }

    /// Resolves a call to a validated request, or to the response that
    /// should be sent instead of capturing.
    fn route(&self, call: &MethodCall) -> Result<CaptureRequest, MethodResponse> {
        if call.method != CAPTURE_SCREEN_AREA {
            log::warn!("[CHANNEL] Method not implemented: {}", call.method);
            return Err(MethodResponse::NotImplemented {
                method: call.method.clone(),
            });
        }

        let args: CaptureAreaArgs = serde_json::from_value(call.arguments.clone())
            .map_err(|e| MethodResponse::error("invalid_arguments", e.to_string()))?;

        CaptureRequest::new(args.x, args.y, args.width, args.height).map_err(|e| {
            log::warn!("[CHANNEL] Rejected request: {}", e);
            let err = ScreenCaptureError::from(e);
            MethodResponse::error(err.code(), err.to_string())
        })
    }

    fn respond(&self, result: Result<EncodedImage, ScreenCaptureError>) -> MethodResponse {
        match result {
            Ok(image) => MethodResponse::Success {
                result: self.shape.shape(image),
            },
            Err(e) => {
                log::error!("[CHANNEL] {} failed: {}", CAPTURE_SCREEN_AREA, e);
                MethodResponse::error(e.code(), e.to_string())
            }
        }
    }
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}
