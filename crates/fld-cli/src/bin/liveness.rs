use anyhow::Result;
use fld_cli::config::Settings;
use fld_cli::{cli_tokens, echo_args, init_tracing, or_usage, parse_or_usage, LIVENESS_USAGE};
use fld_core::driver::{prepare_liveness, run_liveness};
use fld_native::NativeEngine;
use std::io;

fn main() -> Result<()> {
    init_tracing();

    let tokens = cli_tokens(LIVENESS_USAGE)?;
    println!("{}", echo_args(&tokens));

    let args = parse_or_usage(&tokens, LIVENESS_USAGE)?;
    let (options, image) = or_usage(prepare_liveness(&args), LIVENESS_USAGE)?;

    let settings = Settings::from_env().with_args(&args);
    let engine = NativeEngine::load(&settings.library)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    run_liveness(engine, &options, &image, stdin.lock(), &mut stdout)?;
    Ok(())
}
