use crate::types::{EngineResult, PixelBuffer, PixelFormat};

/// Call contract of the face liveness engine.
///
/// Implementations wrap one engine instance; the driver owns it through a
/// [`Session`](crate::session::Session) which enforces call order.
pub trait Engine {
    /// Load models and apply the JSON configuration.
    fn init(&mut self, config_json: &str) -> EngineResult;

    /// Prime the pipeline for `format` so the first `process` is not slow.
    fn warm_up(&mut self, format: PixelFormat) -> EngineResult;

    /// Run detection on raw pixels.
    fn process(&mut self, frame: &PixelBuffer, exif_orientation: i32) -> EngineResult;

    /// Run detection on an encoded image (JPEG/PNG/BMP bytes).
    fn process_encoded(&mut self, data: &[u8]) -> EngineResult;

    /// Extract the EXIF orientation from JPEG bytes. Does not require `init`.
    fn exif_orientation(&self, jpeg: &[u8]) -> i32;

    /// Build the runtime license key bound to this host.
    fn request_runtime_license_key(&mut self, raw: bool) -> EngineResult;

    /// Release everything acquired by `init`.
    fn deinit(&mut self) -> EngineResult;
}
