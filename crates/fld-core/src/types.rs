use std::fmt;

/// Raw pixel layouts understood by the engine.
///
/// Discriminants are the engine's own image-type ordinals and cross the
/// native boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PixelFormat {
    Rgb24 = 0,
    Rgba32 = 1,
    Bgra32 = 2,
    Bgr24 = 3,
    /// 8-bit luma only.
    Y = 10,
}

impl PixelFormat {
    /// Storage width of one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Y => 1,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
            PixelFormat::Rgba32 | PixelFormat::Bgra32 => 4,
        }
    }

    /// Format assumed for a decoded bitmap with the given sample width:
    /// 1 → luma, 4 → BGRA, anything else → BGR.
    pub fn for_bytes_per_pixel(bytes_per_pixel: usize) -> Self {
        match bytes_per_pixel {
            1 => PixelFormat::Y,
            4 => PixelFormat::Bgra32,
            _ => PixelFormat::Bgr24,
        }
    }

    /// The engine's image-type ordinal.
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

/// Row-major raw pixel buffer handed to the engine's `process` call.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    /// Row length in samples (pixels), not bytes.
    stride: u32,
    format: PixelFormat,
}

impl PixelBuffer {
    /// Wrap tightly packed pixel data (stride == width).
    ///
    /// Returns `None` when `data` is shorter than `width * height * bpp`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Option<Self> {
        let required = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() < required {
            return None;
        }
        Some(Self::packed(data, width, height, format))
    }

    /// Wrap a buffer whose length is already known to be
    /// `width * height * bpp`.
    pub(crate) fn packed(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * format.bytes_per_pixel()
        );
        Self {
            data,
            width,
            height,
            stride: width,
            format,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }
}

/// The four lifecycle calls plus the license-key request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    WarmUp,
    Process,
    DeInit,
    RuntimeLicenseKey,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Init => "init",
            Operation::WarmUp => "warmUp",
            Operation::Process => "process",
            Operation::DeInit => "deInit",
            Operation::RuntimeLicenseKey => "requestRuntimeLicenseKey",
        };
        f.write_str(name)
    }
}

/// Status and diagnostic payload returned by every engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResult {
    /// 0 on success, engine-defined nonzero code otherwise.
    pub code: i32,
    /// Short description of `code`.
    pub phrase: String,
    /// JSON detail payload. May be empty.
    pub json: String,
}

impl EngineResult {
    pub fn ok(json: impl Into<String>) -> Self {
        Self {
            code: 0,
            phrase: "OK".to_string(),
            json: json.into(),
        }
    }

    pub fn failure(code: i32, phrase: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            code,
            phrase: phrase.into(),
            json: json.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Payload for display; an empty payload renders as `{}`.
    pub fn json_or_empty(&self) -> &str {
        if self.json.is_empty() {
            "{}"
        } else {
            &self.json
        }
    }
}
