use anyhow::Result;
use fld_cli::config::Settings;
use fld_cli::{cli_tokens, echo_args, init_tracing, or_usage, parse_or_usage, RUNTIME_KEY_USAGE};
use fld_core::driver::{run_runtime_key, RuntimeKeyOptions};
use fld_core::DriverError;
use fld_native::NativeEngine;
use std::io;

fn main() -> Result<()> {
    init_tracing();

    let tokens = cli_tokens(RUNTIME_KEY_USAGE)?;
    println!("{}", echo_args(&tokens));

    let args = parse_or_usage(&tokens, RUNTIME_KEY_USAGE)?;
    let options = or_usage(
        RuntimeKeyOptions::from_args(&args).map_err(DriverError::from),
        RUNTIME_KEY_USAGE,
    )?;

    let settings = Settings::from_env().with_args(&args);
    let engine = NativeEngine::load(&settings.library)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    run_runtime_key(engine, &options, stdin.lock(), &mut stdout)?;
    Ok(())
}
