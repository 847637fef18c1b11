//! Core of the face liveness sample drivers.
//!
//! Argument parsing, engine configuration, image loading and the ordered
//! engine session live here. The native binding is in `fld-native`; the
//! executables are in `fld-cli`.

pub mod args;
pub mod config;
pub mod driver;
pub mod engine;
pub mod loader;
pub mod session;
pub mod types;

#[cfg(test)]
mod mock;

pub use args::{parse_args, ArgsError, ArgumentMap};
pub use config::{build_config_json, ConfigProfile, EngineConfig, RuntimeKeyConfig};
pub use driver::{
    BenchmarkOptions, BenchmarkReport, DriverError, LivenessOptions, RuntimeKeyOptions,
};
pub use engine::Engine;
pub use loader::{IngestMode, LoadError, LoadedImage};
pub use session::{Session, SessionError, Stage};
pub use types::{EngineResult, Operation, PixelBuffer, PixelFormat};
