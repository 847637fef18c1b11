//! fld-native: runtime binding to the face liveness engine shared library.
//!
//! The library is opened with `dlopen` and every entry point is resolved up
//! front, so a missing symbol fails at load time rather than mid-session.
//!
//! # Safety
//!
//! Result strings returned by the library are owned by it and only valid
//! until the next call. They are copied into Rust `String`s before any other
//! call is made.

#![warn(unsafe_op_in_unsafe_fn)]

use fld_core::{Engine, EngineResult, PixelBuffer, PixelFormat};
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Status code used for calls rejected before reaching the library.
const INVALID_INPUT: i32 = -1;

const LIBRARY_STEM: &str = "FaceLivenessDetectionSDK";

#[derive(Error, Debug)]
pub enum NativeError {
    #[error("failed to load engine library {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("engine library {path} does not export {symbol}")]
    MissingSymbol { path: PathBuf, symbol: &'static str },
    #[error("dynamic loading of the engine library is not supported on this platform")]
    Unsupported,
}

/// Mirrors `fld_result_t`.
#[repr(C)]
struct RawResult {
    code: c_int,
    phrase: *const c_char,
    json: *const c_char,
}

impl RawResult {
    /// # Safety
    ///
    /// `phrase` and `json` must be null or valid NUL-terminated strings.
    unsafe fn into_result(self) -> EngineResult {
        // SAFETY: forwarded from the caller.
        let (phrase, json) = unsafe { (copy_c_str(self.phrase), copy_c_str(self.json)) };
        EngineResult {
            code: self.code,
            phrase,
            json,
        }
    }
}

/// # Safety
///
/// `ptr` must be null or point to a valid NUL-terminated string.
unsafe fn copy_c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

type InitFn = unsafe extern "C" fn(*const c_char) -> RawResult;
type DeInitFn = unsafe extern "C" fn() -> RawResult;
type WarmUpFn = unsafe extern "C" fn(c_int) -> RawResult;
type ProcessFn = unsafe extern "C" fn(
    c_int,
    *const c_void,
    libc::size_t,
    libc::size_t,
    libc::size_t,
    c_int,
) -> RawResult;
type ProcessEncodedFn = unsafe extern "C" fn(*const c_void, libc::size_t) -> RawResult;
type ExifOrientationFn = unsafe extern "C" fn(*const c_void, libc::size_t) -> c_int;
type RuntimeKeyFn = unsafe extern "C" fn(bool) -> RawResult;

struct Symbols {
    init: InitFn,
    deinit: DeInitFn,
    warm_up: WarmUpFn,
    process: ProcessFn,
    process_encoded: ProcessEncodedFn,
    exif_orientation: ExifOrientationFn,
    request_runtime_license_key: RuntimeKeyFn,
}

/// File name of the engine library for the current platform,
/// e.g. `libFaceLivenessDetectionSDK.so`.
pub fn default_library_name() -> String {
    format!(
        "{}{LIBRARY_STEM}{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// [`Engine`] backed by the native shared library.
pub struct NativeEngine {
    handle: *mut c_void,
    symbols: Symbols,
    path: PathBuf,
}

impl NativeEngine {
    /// Open the library at `path` and resolve every entry point.
    pub fn load(path: &Path) -> Result<Self, NativeError> {
        let handle = dl::open(path)?;
        match Self::resolve(handle, path) {
            Ok(symbols) => {
                tracing::info!(path = %path.display(), "engine library loaded");
                Ok(Self {
                    handle,
                    symbols,
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                // SAFETY: handle came from dl::open and nothing else holds it.
                unsafe { dl::close(handle) };
                Err(e)
            }
        }
    }

    fn resolve(handle: *mut c_void, path: &Path) -> Result<Symbols, NativeError> {
        // SAFETY: each type alias matches the exported C prototype.
        unsafe {
            Ok(Symbols {
                init: dl::symbol(handle, path, "fld_sdk_init")?,
                deinit: dl::symbol(handle, path, "fld_sdk_deinit")?,
                warm_up: dl::symbol(handle, path, "fld_sdk_warm_up")?,
                process: dl::symbol(handle, path, "fld_sdk_process")?,
                process_encoded: dl::symbol(handle, path, "fld_sdk_process_encoded")?,
                exif_orientation: dl::symbol(handle, path, "fld_sdk_exif_orientation")?,
                request_runtime_license_key: dl::symbol(
                    handle,
                    path,
                    "fld_sdk_request_runtime_license_key",
                )?,
            })
        }
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        // SAFETY: the handle is owned by this engine and not used after drop.
        unsafe { dl::close(self.handle) };
        tracing::debug!(path = %self.path.display(), "engine library closed");
    }
}

impl Engine for NativeEngine {
    fn init(&mut self, config_json: &str) -> EngineResult {
        let Ok(config) = CString::new(config_json) else {
            return EngineResult::failure(INVALID_INPUT, "configuration contains a NUL byte", "");
        };
        // SAFETY: `config` outlives the call; strings are copied before returning.
        unsafe { (self.symbols.init)(config.as_ptr()).into_result() }
    }

    fn warm_up(&mut self, format: PixelFormat) -> EngineResult {
        // SAFETY: plain integer argument; strings are copied before returning.
        unsafe { (self.symbols.warm_up)(format.ordinal()).into_result() }
    }

    fn process(&mut self, frame: &PixelBuffer, exif_orientation: i32) -> EngineResult {
        // SAFETY: `frame` holds stride * height * bytes_per_pixel bytes and is
        // borrowed for the duration of the call.
        unsafe {
            (self.symbols.process)(
                frame.format().ordinal(),
                frame.data().as_ptr().cast(),
                frame.width() as libc::size_t,
                frame.height() as libc::size_t,
                frame.stride() as libc::size_t,
                exif_orientation,
            )
            .into_result()
        }
    }

    fn process_encoded(&mut self, data: &[u8]) -> EngineResult {
        // SAFETY: `data` is valid for `data.len()` bytes during the call.
        unsafe { (self.symbols.process_encoded)(data.as_ptr().cast(), data.len()).into_result() }
    }

    fn exif_orientation(&self, jpeg: &[u8]) -> i32 {
        // SAFETY: `jpeg` is valid for `jpeg.len()` bytes during the call.
        unsafe { (self.symbols.exif_orientation)(jpeg.as_ptr().cast(), jpeg.len()) }
    }

    fn request_runtime_license_key(&mut self, raw: bool) -> EngineResult {
        // SAFETY: plain bool argument; strings are copied before returning.
        unsafe { (self.symbols.request_runtime_license_key)(raw).into_result() }
    }

    fn deinit(&mut self) -> EngineResult {
        // SAFETY: no arguments; strings are copied before returning.
        unsafe { (self.symbols.deinit)().into_result() }
    }
}

#[cfg(unix)]
mod dl {
    use super::NativeError;
    use std::ffi::{c_void, CStr, CString};
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    pub(super) fn open(path: &Path) -> Result<*mut c_void, NativeError> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| NativeError::Load {
            path: path.to_path_buf(),
            reason: "path contains a NUL byte".into(),
        })?;
        // SAFETY: c_path is a valid NUL-terminated string.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(NativeError::Load {
                path: path.to_path_buf(),
                reason: last_error(),
            });
        }
        Ok(handle)
    }

    /// # Safety
    ///
    /// `handle` must be open and `T` must be a function pointer type matching
    /// the exported symbol.
    pub(super) unsafe fn symbol<T: Copy>(
        handle: *mut c_void,
        path: &Path,
        name: &'static str,
    ) -> Result<T, NativeError> {
        let missing = || NativeError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: name,
        };
        let c_name = CString::new(name).map_err(|_| missing())?;
        // SAFETY: handle is open per the caller's contract.
        let ptr = unsafe { libc::dlsym(handle, c_name.as_ptr()) };
        if ptr.is_null() {
            return Err(missing());
        }
        debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());
        tracing::debug!(symbol = name, "resolved engine symbol");
        // SAFETY: T is a function pointer of the symbol's type per the caller.
        Ok(unsafe { std::mem::transmute_copy::<*mut c_void, T>(&ptr) })
    }

    /// # Safety
    ///
    /// `handle` must come from [`open`] and must not be used afterwards.
    pub(super) unsafe fn close(handle: *mut c_void) {
        // SAFETY: forwarded from the caller.
        if unsafe { libc::dlclose(handle) } != 0 {
            tracing::warn!(reason = %last_error(), "dlclose failed");
        }
    }

    fn last_error() -> String {
        // SAFETY: dlerror returns null or a thread-local NUL-terminated string.
        let msg = unsafe { libc::dlerror() };
        if msg.is_null() {
            return "unknown dynamic loader error".into();
        }
        // SAFETY: non-null result of dlerror.
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }
}

#[cfg(not(unix))]
mod dl {
    use super::NativeError;
    use std::ffi::c_void;
    use std::path::Path;

    pub(super) fn open(_path: &Path) -> Result<*mut c_void, NativeError> {
        Err(NativeError::Unsupported)
    }

    pub(super) unsafe fn symbol<T: Copy>(
        _handle: *mut c_void,
        _path: &Path,
        _name: &'static str,
    ) -> Result<T, NativeError> {
        Err(NativeError::Unsupported)
    }

    pub(super) unsafe fn close(_handle: *mut c_void) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_name() {
        let name = default_library_name();
        assert!(name.contains(LIBRARY_STEM));
        #[cfg(target_os = "linux")]
        assert_eq!(name, "libFaceLivenessDetectionSDK.so");
    }

    #[test]
    fn test_load_missing_library() {
        let err = NativeEngine::load(Path::new("/nonexistent/libFaceLivenessDetectionSDK.so"))
            .err()
            .unwrap();
        #[cfg(unix)]
        assert!(matches!(err, NativeError::Load { .. }));
        #[cfg(not(unix))]
        assert!(matches!(err, NativeError::Unsupported));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_library_without_engine_symbols() {
        let err = NativeEngine::load(Path::new("libc.so.6")).err().unwrap();
        match err {
            NativeError::MissingSymbol { path, symbol } => {
                assert_eq!(symbol, "fld_sdk_init");
                assert_eq!(path, PathBuf::from("libc.so.6"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_strings_become_empty() {
        let raw = RawResult {
            code: 3,
            phrase: std::ptr::null(),
            json: std::ptr::null(),
        };
        let result = unsafe { raw.into_result() };
        assert_eq!(result.code, 3);
        assert!(result.phrase.is_empty());
        assert_eq!(result.json_or_empty(), "{}");
    }

    #[test]
    fn test_strings_are_copied() {
        let phrase = b"OK\0";
        let json = b"{\"faces\":[]}\0";
        let raw = RawResult {
            code: 0,
            phrase: phrase.as_ptr().cast(),
            json: json.as_ptr().cast(),
        };
        let result = unsafe { raw.into_result() };
        assert!(result.is_ok());
        assert_eq!(result.phrase, "OK");
        assert_eq!(result.json, "{\"faces\":[]}");
    }
}
