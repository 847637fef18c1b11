//! Flat `--key value` argument parsing shared by the sample programs.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use thiserror::Error;

/// Replaced by the current working directory in argument values.
pub const PROJECT_DIR_PLACEHOLDER: &str = "$(ProjectDir)";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgsError {
    #[error("number of args must be even: {0}")]
    OddCount(usize),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("{0} required")]
    MissingRequired(&'static str),
    #[error("argument is not valid UTF-8: {0}")]
    NotUnicode(String),
}

impl ArgsError {
    /// Whether this error belongs to the malformed-arguments family
    /// (as opposed to a missing required flag).
    pub fn is_invalid_arguments(&self) -> bool {
        !matches!(self, ArgsError::MissingRequired(_))
    }
}

/// Flag name → value mapping. Keys always start with `--`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMap {
    values: BTreeMap<String, String>,
}

impl ArgumentMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of a flag the caller cannot proceed without.
    pub fn require(&self, key: &'static str) -> Result<&str, ArgsError> {
        self.get(key).ok_or(ArgsError::MissingRequired(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Convert raw command-line tokens, rejecting any that are not UTF-8.
pub fn tokens_from_os<I>(raw: I) -> Result<Vec<String>, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    raw.into_iter()
        .map(|token| {
            token
                .into_string()
                .map_err(|bad| ArgsError::NotUnicode(bad.to_string_lossy().into_owned()))
        })
        .collect()
}

/// Parse `--key value` pairs, substituting the project-dir placeholder with
/// the process's current working directory.
pub fn parse_args<S: AsRef<str>>(tokens: &[S]) -> Result<ArgumentMap, ArgsError> {
    let cwd = std::env::current_dir().ok();
    if cwd.is_none() {
        tracing::warn!("current directory unavailable; {PROJECT_DIR_PLACEHOLDER} left verbatim");
    }
    parse_args_in(tokens, cwd.as_deref())
}

/// Same as [`parse_args`] with an explicit placeholder directory.
pub fn parse_args_in<S: AsRef<str>>(
    tokens: &[S],
    project_dir: Option<&Path>,
) -> Result<ArgumentMap, ArgsError> {
    if tokens.len() % 2 != 0 {
        return Err(ArgsError::OddCount(tokens.len()));
    }

    let project_dir = project_dir.map(|p| p.to_string_lossy().trim().to_string());
    let mut values = BTreeMap::new();

    for pair in tokens.chunks_exact(2) {
        let key = pair[0].as_ref();
        if !key.starts_with("--") {
            return Err(ArgsError::InvalidKey(key.to_string()));
        }
        let raw = pair[1].as_ref();
        let value = match &project_dir {
            Some(dir) => raw.replace(PROJECT_DIR_PLACEHOLDER, dir),
            None => raw.to_string(),
        };
        values.insert(key.to_string(), value);
    }

    tracing::debug!(count = values.len(), "parsed arguments");
    Ok(ArgumentMap { values })
}

/// Normalise a path-valued flag: backslashes become forward slashes on Windows.
pub fn normalize_path_value(value: &str) -> String {
    if cfg!(windows) {
        value.replace('\\', "/")
    } else {
        value.to_string()
    }
}
