use anyhow::Result;
use fld_cli::config::Settings;
use fld_cli::{cli_tokens, echo_args, init_tracing, or_usage, parse_or_usage, BENCHMARK_USAGE};
use fld_core::driver::{run_benchmark, BenchmarkOptions};
use fld_core::DriverError;
use fld_native::NativeEngine;
use std::io;

fn main() -> Result<()> {
    init_tracing();

    let tokens = cli_tokens(BENCHMARK_USAGE)?;
    println!("{}", echo_args(&tokens));

    let args = parse_or_usage(&tokens, BENCHMARK_USAGE)?;
    let options = or_usage(
        BenchmarkOptions::from_args(&args).map_err(DriverError::from),
        BENCHMARK_USAGE,
    )?;
    let image = options.liveness.load_image()?;

    let settings = Settings::from_env().with_args(&args);
    let engine = NativeEngine::load(&settings.library)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let report = run_benchmark(engine, &options, &image, stdin.lock(), &mut stdout)?;
    tracing::info!(
        loops = report.loops,
        elapsed_ms = report.elapsed_ms,
        fps = report.estimated_fps,
        "benchmark finished"
    );
    Ok(())
}
