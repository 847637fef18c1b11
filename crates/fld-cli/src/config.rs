use fld_core::args::{normalize_path_value, ArgumentMap};
use fld_native::default_library_name;
use std::path::PathBuf;

/// Driver settings, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Engine shared library to open (default: platform library name,
    /// resolved through the dynamic loader search path).
    pub library: PathBuf,
}

impl Settings {
    /// Load settings from `FLD_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            library: lookup("FLD_SDK_LIBRARY")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default_library_name())),
        }
    }

    /// Apply command-line overrides (`--library`).
    pub fn with_args(mut self, args: &ArgumentMap) -> Self {
        if let Some(path) = args.get("--library") {
            self.library = PathBuf::from(normalize_path_value(path));
        }
        self
    }
}
