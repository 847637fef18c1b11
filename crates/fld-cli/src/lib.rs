//! Shared plumbing for the sample programs: logging setup, argument
//! echo and usage reporting.

pub mod config;

use fld_core::args::{parse_args, tokens_from_os, ArgumentMap};
use fld_core::DriverError;

pub const LIVENESS_USAGE: &str = "\
usage: liveness --image <path> [--assets <path>] [--tokendata <base64>]
                [--tokenfile <path>] [--ingest decoded|encoded]
                [--profile liveness|full|deepfake] [--library <path>]";

pub const BENCHMARK_USAGE: &str = "\
usage: benchmark --image <path> [--assets <path>] [--tokendata <base64>]
                 [--tokenfile <path>] [--ingest decoded|encoded]
                 [--profile liveness|full|deepfake] [--loops <n>] [--library <path>]";

pub const RUNTIME_KEY_USAGE: &str = "\
usage: runtime-key --assets <path> [--type <host-type>] [--json true|false]
                   [--library <path>]";

/// Install the `fmt` subscriber on stderr, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line tokens without the program name, printing `usage` to
/// stderr when a token is not UTF-8.
pub fn cli_tokens(usage: &str) -> Result<Vec<String>, DriverError> {
    or_usage(
        tokens_from_os(std::env::args_os().skip(1)).map_err(DriverError::from),
        usage,
    )
}

pub fn echo_args(tokens: &[String]) -> String {
    format!("Args: {}", tokens.join(" "))
}

/// Parse `tokens`, printing `usage` to stderr on failure.
pub fn parse_or_usage(tokens: &[String], usage: &str) -> Result<ArgumentMap, DriverError> {
    or_usage(parse_args(tokens).map_err(DriverError::from), usage)
}

/// Pass `result` through, printing `usage` to stderr for argument errors.
pub fn or_usage<T>(result: Result<T, DriverError>, usage: &str) -> Result<T, DriverError> {
    if let Err(DriverError::Args(_)) = &result {
        eprintln!("{usage}");
    }
    result
}
