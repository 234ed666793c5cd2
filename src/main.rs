//! platypus-analytics - Converts Platypus vehicle logs into geo-tagged JSON lines
//!
//! Each input log is converted to a line-delimited JSON file ready for bulk
//! ingestion into a search index. Several inputs are converted in parallel.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use platypus_analytics::convert::{self, ConvertJob, ConvertSummary};
use platypus_analytics::parsers::TimeFormat;
use platypus_analytics::settings::ConvertSettings;

#[derive(Parser, Debug)]
#[command(name = "platypus-analytics", version, about)]
struct Args {
    /// Vehicle log files to convert (`.txt` or `.txt.gz`)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for converted files (default: beside each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write records to stdout instead of a file (single input only)
    #[arg(long, conflicts_with = "output_dir")]
    stdout: bool,

    /// Fail on payloads that are not calibration, pose or sensor messages
    #[arg(long)]
    strict: bool,

    /// Rendering of the output `time` field
    #[arg(long, value_enum)]
    time_format: Option<TimeFormat>,

    /// Worker threads for batch conversion (0 = one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Settings file (default: user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save_settings: bool,

    /// Write a JSON report of per-file results
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// One line of the `--report` output
#[derive(Serialize)]
struct ReportEntry {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConvertSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Records may go to stdout, so diagnostics stay on stderr
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

fn effective_settings(args: &Args) -> ConvertSettings {
    let mut settings = match &args.config {
        Some(path) => ConvertSettings::load_from(path),
        None => ConvertSettings::load(),
    };

    if args.strict {
        settings.strict = true;
    }
    if let Some(time_format) = args.time_format {
        settings.time_format = time_format;
    }
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs;
    }
    settings
}

/// Returns `true` when every input converted successfully
fn run(args: Args) -> anyhow::Result<bool> {
    let settings = effective_settings(&args);

    if args.save_settings {
        let saved = match &args.config {
            Some(path) => settings.save_to(path).map(|_| path.clone()),
            None => settings.save(),
        }
        .context("Failed to save settings")?;
        tracing::info!("Saved settings to {:?}", saved);
    }

    if args.stdout {
        if args.inputs.len() != 1 {
            bail!("--stdout accepts exactly one input, got {}", args.inputs.len());
        }
        let stdout = std::io::stdout();
        convert::convert_to_writer(&args.inputs[0], stdout.lock(), &settings)
            .with_context(|| format!("Failed to convert {:?}", args.inputs[0]))?;
        return Ok(true);
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    }

    let jobs: Vec<ConvertJob> = args
        .inputs
        .iter()
        .map(|input| {
            ConvertJob::for_input(input, args.output_dir.as_deref(), &settings.output_extension)
        })
        .collect();

    let results = convert::convert_batch(&jobs, &settings);

    let mut all_ok = true;
    let mut report = Vec::with_capacity(results.len());
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(summary) => report.push(ReportEntry {
                input: job.input.clone(),
                summary: Some(summary),
                error: None,
            }),
            Err(e) => {
                all_ok = false;
                tracing::error!("Failed to convert {:?}: {}", job.input, e);
                report.push(ReportEntry {
                    input: job.input.clone(),
                    summary: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if let Some(path) = &args.report {
        let content = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report {:?}", path))?;
    }

    Ok(all_ok)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
