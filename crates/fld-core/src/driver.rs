//! The sample flows: liveness, benchmark and runtime license key.
//!
//! Each flow is strictly linear and stops at the first failure. Console
//! output goes to the supplied writer; the final keypress gate reads one
//! line from the supplied reader.

use crate::args::{normalize_path_value, ArgsError, ArgumentMap};
use crate::config::{ConfigProfile, EngineConfig, RuntimeKeyConfig};
use crate::engine::Engine;
use crate::loader::{self, IngestMode, LoadError, LoadedImage};
use crate::session::{Session, SessionError};
use crate::types::EngineResult;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

const DEFAULT_BENCHMARK_LOOPS: usize = 100;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Args(#[from] ArgsError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("config serialization failed: {0}")]
    Config(#[from] serde_json::Error),
    #[error("console i/o: {0}")]
    Console(#[from] io::Error),
}

/// Options of the liveness sample.
#[derive(Debug, Clone)]
pub struct LivenessOptions {
    pub image: PathBuf,
    pub assets: String,
    pub token_data: String,
    pub token_file: Option<String>,
    pub ingest: IngestMode,
    pub profile: ConfigProfile,
}

impl LivenessOptions {
    pub fn from_args(args: &ArgumentMap) -> Result<Self, ArgsError> {
        let image = PathBuf::from(args.require("--image")?);
        let ingest = parse_choice(args, "--ingest", IngestMode::parse, "expected decoded or encoded")?
            .unwrap_or_default();
        let profile = parse_choice(
            args,
            "--profile",
            ConfigProfile::parse,
            "expected liveness, full or deepfake",
        )?
        .unwrap_or_default();

        Ok(Self {
            image,
            assets: args.get("--assets").map(normalize_path_value).unwrap_or_default(),
            token_data: args.get("--tokendata").unwrap_or_default().to_string(),
            token_file: args.get("--tokenfile").map(normalize_path_value),
            ingest,
            profile,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::new(self.profile, &self.assets, &self.token_data);
        match &self.token_file {
            Some(path) => config.with_license_token_file(path.as_str()),
            None => config,
        }
    }

    pub fn load_image(&self) -> Result<LoadedImage, LoadError> {
        loader::load(&self.image, self.ingest)
    }
}

/// Options of the benchmark sample.
#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub liveness: LivenessOptions,
    pub loops: usize,
}

impl BenchmarkOptions {
    pub fn from_args(args: &ArgumentMap) -> Result<Self, ArgsError> {
        let liveness = LivenessOptions::from_args(args)?;
        let loops = match args.get("--loops") {
            None => DEFAULT_BENCHMARK_LOOPS,
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ArgsError::InvalidValue {
                        key: "--loops".into(),
                        reason: "must be within [1, inf]".into(),
                    })
                }
            },
        };
        Ok(Self { liveness, loops })
    }
}

/// Options of the runtime license key sample.
#[derive(Debug, Clone)]
pub struct RuntimeKeyOptions {
    pub assets: String,
    pub host_type: Option<String>,
    /// Ask for the bare key instead of a JSON entry.
    pub raw: bool,
}

impl RuntimeKeyOptions {
    pub fn from_args(args: &ArgumentMap) -> Result<Self, ArgsError> {
        let assets = normalize_path_value(args.require("--assets")?);
        Ok(Self {
            assets,
            host_type: args.get("--type").map(str::to_string),
            raw: args.get("--json").is_some_and(|v| v != "true"),
        })
    }

    pub fn config(&self) -> RuntimeKeyConfig {
        RuntimeKeyConfig {
            assets_folder: self.assets.clone(),
            host_type: self.host_type.clone(),
        }
    }
}

/// Timing summary of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub loops: usize,
    pub elapsed_ms: f64,
    pub estimated_fps: f64,
    pub last_result: EngineResult,
}

/// Resolve options and load the image before any engine is involved.
pub fn prepare_liveness(args: &ArgumentMap) -> Result<(LivenessOptions, LoadedImage), DriverError> {
    let options = LivenessOptions::from_args(args)?;
    let image = options.load_image()?;
    Ok((options, image))
}

/// init → warmUp → process → print → keypress → deInit.
pub fn run_liveness<E, R, W>(
    engine: E,
    options: &LivenessOptions,
    image: &LoadedImage,
    mut console: R,
    out: &mut W,
) -> Result<EngineResult, DriverError>
where
    E: Engine,
    R: BufRead,
    W: Write,
{
    writeln!(out, "bytesPerPixel: {}", image.bytes_per_pixel())?;
    let config = options.engine_config().to_json()?;

    let mut session = Session::new(engine);
    tracing::info!(image = %options.image.display(), ingest = ?options.ingest, "starting liveness sample");
    session.init(&config)?;

    // Shifts model loading out of the first real process call.
    session.warm_up(image.format())?;

    let orientation = resolve_orientation(&session, &options.image, image)?;
    let result = process_once(&mut session, image, orientation)?;
    writeln!(out, "Result: {}", result.json_or_empty())?;

    wait_for_keypress(&mut console, out)?;

    tracing::info!("ending liveness sample");
    session.deinit()?;
    Ok(result)
}

/// init → warmUp → `loops` × process → report → keypress → deInit.
pub fn run_benchmark<E, R, W>(
    engine: E,
    options: &BenchmarkOptions,
    image: &LoadedImage,
    mut console: R,
    out: &mut W,
) -> Result<BenchmarkReport, DriverError>
where
    E: Engine,
    R: BufRead,
    W: Write,
{
    let liveness = &options.liveness;
    writeln!(out, "bytesPerPixel: {}", image.bytes_per_pixel())?;
    let config = liveness.engine_config().to_json()?;

    let mut session = Session::new(engine);
    tracing::info!(loops = options.loops, "starting benchmark");
    session.init(&config)?;
    session.warm_up(image.format())?;

    let orientation = resolve_orientation(&session, &liveness.image, image)?;

    let start = Instant::now();
    let mut last_result = process_once(&mut session, image, orientation)?;
    for _ in 1..options.loops {
        last_result = process_once(&mut session, image, orientation)?;
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let estimated_fps = 1000.0 / (elapsed_ms / options.loops as f64);

    writeln!(out, "Elapsed time (Liveness) = [[[ {elapsed_ms:.3} millis ]]]")?;
    writeln!(out, "Result: {}", last_result.json_or_empty())?;
    writeln!(
        out,
        "*** elapsedTimeInMillis: {elapsed_ms:.3}, estimatedFps: {estimated_fps:.3} ***"
    )?;

    wait_for_keypress(&mut console, out)?;

    tracing::info!("ending benchmark");
    session.deinit()?;

    Ok(BenchmarkReport {
        loops: options.loops,
        elapsed_ms,
        estimated_fps,
        last_result,
    })
}

/// init → requestRuntimeLicenseKey → print → keypress → deInit.
pub fn run_runtime_key<E, R, W>(
    engine: E,
    options: &RuntimeKeyOptions,
    mut console: R,
    out: &mut W,
) -> Result<EngineResult, DriverError>
where
    E: Engine,
    R: BufRead,
    W: Write,
{
    let config = options.config().to_json()?;

    let mut session = Session::new(engine);
    session.init(&config)?;

    let result = session.request_runtime_license_key(options.raw)?;
    writeln!(out, "{}", result.json_or_empty())?;

    wait_for_keypress(&mut console, out)?;
    session.deinit()?;
    Ok(result)
}

fn resolve_orientation<E: Engine>(
    session: &Session<E>,
    path: &Path,
    image: &LoadedImage,
) -> Result<i32, DriverError> {
    match image {
        LoadedImage::Pixels(_) => {
            let orientation = loader::exif_orientation(path, |jpeg| session.exif_orientation(jpeg))?;
            tracing::debug!(orientation, "EXIF orientation");
            Ok(orientation)
        }
        // The engine reads the orientation itself from encoded input.
        LoadedImage::Encoded(_) => Ok(loader::DEFAULT_EXIF_ORIENTATION),
    }
}

fn process_once<E: Engine>(
    session: &mut Session<E>,
    image: &LoadedImage,
    orientation: i32,
) -> Result<EngineResult, SessionError> {
    match image {
        LoadedImage::Pixels(buffer) => session.process(buffer, orientation),
        LoadedImage::Encoded(encoded) => session.process_encoded(&encoded.data),
    }
}

fn wait_for_keypress<R: BufRead, W: Write>(console: &mut R, out: &mut W) -> io::Result<()> {
    writeln!(out, "Press any key to terminate !!")?;
    out.flush()?;
    let mut line = String::new();
    console.read_line(&mut line)?;
    Ok(())
}

fn parse_choice<T>(
    args: &ArgumentMap,
    key: &str,
    parse: fn(&str) -> Option<T>,
    expected: &str,
) -> Result<Option<T>, ArgsError> {
    match args.get(key) {
        None => Ok(None),
        Some(value) => parse(value).map(Some).ok_or_else(|| ArgsError::InvalidValue {
            key: key.to_string(),
            reason: format!("{expected}, got {value:?}"),
        }),
    }
}
