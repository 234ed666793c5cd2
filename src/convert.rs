//! File-level conversion pipeline.
//!
//! Reads a vehicle log line by line (gunzipping `.gz` inputs), runs it
//! through the streaming transform and writes one JSON object per line.
//! Output is flushed and both handles are closed whether the run finishes
//! or stops on an error.

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::filename::date_from_filename;
use crate::parsers::platypus::{Platypus, Transform, TransformError, TransformStats};
use crate::parsers::types::TimeFormat;
use crate::settings::ConvertSettings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to open input {path:?}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output {path:?}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("Failed to serialize output record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

// ============================================================================
// Jobs and Summaries
// ============================================================================

/// One input log and where its records go
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConvertJob {
    /// Job writing next to `output_dir` (or beside the input when `None`)
    pub fn for_input(input: &Path, output_dir: Option<&Path>, extension: &str) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output_path_for(input, output_dir, extension),
        }
    }
}

/// Outcome of a successful file conversion
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConvertSummary {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    /// Start instant from the log file name, when it follows the naming scheme
    pub log_start: Option<DateTime<Utc>>,
    pub stats: TransformStats,
}

/// Derive the output path for a log: `<stem>.<extension>`, dropping `.gz` and `.txt`
pub fn output_path_for(input: &Path, output_dir: Option<&Path>, extension: &str) -> PathBuf {
    let mut stem = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    for suffix in [".gz", ".txt"] {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            stem = stripped.to_string();
        }
    }

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("{}.{}", stem, extension))
}

// ============================================================================
// Conversion
// ============================================================================

/// Open a log for line reading, transparently decompressing `.gz` files
pub fn open_log(path: &Path) -> Result<Box<dyn BufRead + Send>, ConvertError> {
    let file = File::open(path).map_err(|source| ConvertError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Stream records from `reader` to `writer`, one JSON object per line.
///
/// The writer is flushed before returning on every path.
pub fn convert_reader<R, W>(
    reader: R,
    writer: W,
    settings: &ConvertSettings,
) -> Result<TransformStats, ConvertError>
where
    R: BufRead,
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    let mut transform = Platypus::new(settings.strict).transform(reader.lines());

    let written = write_records(&mut transform, &mut writer, settings.time_format);
    let flushed = writer.flush();
    written?;
    flushed?;

    Ok(transform.stats())
}

fn write_records<I, W>(
    transform: &mut Transform<I>,
    writer: &mut W,
    time_format: TimeFormat,
) -> Result<(), ConvertError>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    for record in transform {
        let record = record?;
        serde_json::to_writer(&mut *writer, &record.formatted(time_format))?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Convert one log file into a line-delimited JSON file
pub fn convert_file(
    input: &Path,
    output: &Path,
    settings: &ConvertSettings,
) -> Result<ConvertSummary, ConvertError> {
    let log_start = log_start_for(input);
    let reader = open_log(input)?;
    let file = File::create(output).map_err(|source| ConvertError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;

    let stats = convert_reader(reader, file, settings)?;
    tracing::info!(
        "Converted {:?}: {} records, {} poses, {} calibrations, {} ignored",
        input,
        stats.records,
        stats.poses,
        stats.calibrations,
        stats.ignored
    );

    Ok(ConvertSummary {
        input: input.to_path_buf(),
        output: Some(output.to_path_buf()),
        log_start,
        stats,
    })
}

/// Convert one log file to an arbitrary writer (e.g. stdout)
pub fn convert_to_writer<W: Write>(
    input: &Path,
    writer: W,
    settings: &ConvertSettings,
) -> Result<ConvertSummary, ConvertError> {
    let log_start = log_start_for(input);
    let reader = open_log(input)?;
    let stats = convert_reader(reader, writer, settings)?;

    Ok(ConvertSummary {
        input: input.to_path_buf(),
        output: None,
        log_start,
        stats,
    })
}

/// Convert many files concurrently. Each file gets its own transform state;
/// results come back in job order.
pub fn convert_batch(
    jobs: &[ConvertJob],
    settings: &ConvertSettings,
) -> Vec<Result<ConvertSummary, ConvertError>> {
    let run = || -> Vec<Result<ConvertSummary, ConvertError>> {
        jobs.par_iter()
            .map(|job| convert_file(&job.input, &job.output, settings))
            .collect()
    };

    if settings.jobs == 0 {
        return run();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(settings.jobs)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            tracing::warn!("Failed to build worker pool, using default: {}", e);
            run()
        }
    }
}

fn log_start_for(input: &Path) -> Option<DateTime<Utc>> {
    match date_from_filename(input) {
        Ok(start) => Some(start),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}
