//! Image ingestion: decoded bitmaps, verbatim encoded bytes, and EXIF
//! orientation sniffing.

use crate::types::{PixelBuffer, PixelFormat};
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// JPEG start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Orientation used when no EXIF hint applies.
pub const DEFAULT_EXIF_ORIENTATION: i32 = 1;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("unsupported pixel format {color}: {bytes_per_pixel} bytes per pixel (expected 1, 3 or 4 one-byte samples)")]
    UnsupportedPixelFormat { color: String, bytes_per_pixel: u8 },
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("i/o: {0}")]
    Io(#[from] io::Error),
}

/// How the image file reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Decode locally and hand the engine raw pixels.
    #[default]
    Decoded,
    /// Hand the engine the file bytes verbatim and let it decode.
    Encoded,
}

impl IngestMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "decoded" => Some(IngestMode::Decoded),
            "encoded" => Some(IngestMode::Encoded),
            _ => None,
        }
    }
}

/// File contents passed through untouched.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    /// Format announced to `warmUp`; fixed to packed 24-bit color.
    pub format: PixelFormat,
}

/// An image ready for the engine, in either ingestion mode.
#[derive(Debug, Clone)]
pub enum LoadedImage {
    Pixels(PixelBuffer),
    Encoded(EncodedImage),
}

impl LoadedImage {
    pub fn format(&self) -> PixelFormat {
        match self {
            LoadedImage::Pixels(buffer) => buffer.format(),
            LoadedImage::Encoded(encoded) => encoded.format,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format().bytes_per_pixel()
    }
}

/// Load `path` using the requested ingestion strategy.
pub fn load(path: &Path, mode: IngestMode) -> Result<LoadedImage, LoadError> {
    match mode {
        IngestMode::Decoded => load_decoded(path).map(LoadedImage::Pixels),
        IngestMode::Encoded => load_encoded(path).map(LoadedImage::Encoded),
    }
}

/// Decode a JPEG/PNG/BMP file into a tightly packed pixel buffer.
pub fn load_decoded(path: &Path) -> Result<PixelBuffer, LoadError> {
    ensure_exists(path)?;

    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded image"
    );

    pixel_buffer_from_image(image)
}

/// Read the file bytes verbatim.
pub fn load_encoded(path: &Path) -> Result<EncodedImage, LoadError> {
    ensure_exists(path)?;

    let data = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read encoded image");

    Ok(EncodedImage {
        data,
        format: PixelFormat::Bgr24,
    })
}

/// Copy a decoded bitmap into an engine buffer.
///
/// Only one-byte samples with 1, 3 or 4 channels are accepted. Color data
/// is reordered to BGR/BGRA so the buffer matches the announced format.
pub fn pixel_buffer_from_image(image: DynamicImage) -> Result<PixelBuffer, LoadError> {
    let (width, height) = (image.width(), image.height());

    let color = image.color();
    let mut data = match image {
        DynamicImage::ImageLuma8(buf) => buf.into_raw(),
        DynamicImage::ImageRgb8(buf) => buf.into_raw(),
        DynamicImage::ImageRgba8(buf) => buf.into_raw(),
        _ => {
            return Err(LoadError::UnsupportedPixelFormat {
                color: format!("{color:?}"),
                bytes_per_pixel: color.bytes_per_pixel(),
            });
        }
    };
    let format = PixelFormat::for_bytes_per_pixel(usize::from(color.bytes_per_pixel()));

    if format != PixelFormat::Y {
        for px in data.chunks_exact_mut(format.bytes_per_pixel()) {
            px.swap(0, 2);
        }
    }

    Ok(PixelBuffer::packed(data, width, height, format))
}

/// Resolve the EXIF orientation of `path`.
///
/// Non-JPEG files (first two bytes are not the start-of-image marker) get
/// the default orientation without consulting `scan`. JPEG files are read
/// whole and `scan` extracts the orientation from the raw bytes.
pub fn exif_orientation<F>(path: &Path, scan: F) -> Result<i32, LoadError>
where
    F: FnOnce(&[u8]) -> i32,
{
    let mut file = File::open(path).map_err(|e| not_found_or(path, e))?;

    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(DEFAULT_EXIF_ORIENTATION),
        Err(e) => return Err(e.into()),
    }
    if magic != JPEG_SOI {
        return Ok(DEFAULT_EXIF_ORIENTATION);
    }

    let mut data = magic.to_vec();
    file.read_to_end(&mut data)?;

    let orientation = scan(&data);
    if (1..=8).contains(&orientation) {
        Ok(orientation)
    } else {
        tracing::debug!(orientation, "EXIF orientation out of range; using default");
        Ok(DEFAULT_EXIF_ORIENTATION)
    }
}

fn ensure_exists(path: &Path) -> Result<(), LoadError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LoadError::FileNotFound(path.to_path_buf()))
    }
}

fn not_found_or(path: &Path, err: io::Error) -> LoadError {
    if err.kind() == io::ErrorKind::NotFound {
        LoadError::FileNotFound(path.to_path_buf())
    } else {
        LoadError::Io(err)
    }
}
