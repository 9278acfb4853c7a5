// src/main.rs - Command-line front end: convert G-code files to trajectory CSVs
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;

use gcode_trajectory::config::{self, Config};
use gcode_trajectory::file_manager::{self, FileManager, OutputFiles};
use gcode_trajectory::print_job::ConversionJob;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convert G-code motion programs into fixed-timestep X/Y/Z/E trajectories.
#[derive(Debug, Parser)]
#[command(name = "gcode-trajectory", version, about)]
struct Cli {
    /// G-code files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the CSV and sidecar files (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip the LRA/SRA smoothing columns
    #[arg(long)]
    no_smoothing: bool,

    /// Name used for the output files instead of the input file name
    #[arg(long, env = "SLIC3R_PP_OUTPUT_NAME")]
    output_name: Option<String>,

    /// Log per-move details
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(path)?
        }
        None => {
            let config = Config::default();
            config.validate()?;
            config
        }
    };
    if cli.no_smoothing {
        config.smoothing.enabled = false;
    }
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| PathBuf::from(&config.output.directory));

    tracing::info!("Timestep: {} ms", config.motion.timestep_ms);
    tracing::info!("Acceleration: {} mm/s²", config.motion.acceleration);
    tracing::info!("Max velocity: {} mm/s", config.motion.max_velocity);
    tracing::info!("Corner velocity: {} mm/s", config.motion.corner_velocity);

    let output_name = match (&cli.output_name, cli.files.len()) {
        (Some(name), 1) => Some(name.clone()),
        (Some(_), _) => {
            tracing::warn!("Ignoring output name override for a multi-file conversion");
            None
        }
        (None, _) => None,
    };

    let job = Arc::new(ConversionJob::new(config));
    let file_manager = Arc::new(FileManager::new(output_dir));
    tracing::info!("Output directory: {}", file_manager.output_directory().display());

    // One blocking task per file; each run owns its interpreter and buffer.
    let mut tasks = JoinSet::new();
    for path in cli.files {
        let job = Arc::clone(&job);
        let file_manager = Arc::clone(&file_manager);
        let output_name = output_name.clone();
        tasks.spawn_blocking(move || -> Result<OutputFiles, BoxError> {
            let report = job.run_file(&path)?;
            let config = job.config();
            let diagnostics = report.diagnostics(config);
            let stem_source = output_name.unwrap_or_else(|| report.source.clone());
            let stem = file_manager::output_stem(&stem_source, &config.motion);
            Ok(file_manager.write_report(&stem, &report, config, diagnostics.as_ref())?)
        });
    }

    let mut failures = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(files)) => tracing::info!("Wrote {} and {}", files.csv.display(), files.sidecar.display()),
            Ok(Err(e)) => {
                failures += 1;
                tracing::error!("Conversion failed: {}", e);
            }
            Err(e) => {
                failures += 1;
                tracing::error!("Conversion task panicked: {}", e);
            }
        }
    }

    if failures > 0 {
        tracing::error!("{} file(s) failed to convert", failures);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
