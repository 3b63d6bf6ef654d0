//! # Exclusion Projection CLI
//!
//! Applies an exclusion projection to newline-delimited JSON documents.
//!
//! ```bash
//! # Drop `password` and `profile.ssn` from every document on stdin
//! cat users.ndjson | project apply --spec '{"password": 0, "profile.ssn": 0}'
//!
//! # Spec read from a file, identifier dropped unless mentioned
//! project apply --spec @spec.json --input users.ndjson --exclude-id
//!
//! # Show the compiled tree or the paths it removes
//! project explain --spec '{"a": {"b": 0}}'
//! project paths --spec '{"a": {"b": 0}, "c": 0}'
//! ```

use clap::{Parser, Subcommand};
use exclusion_projection::batch::{self, BatchConfig, BatchResults};
use exclusion_projection::config::RuntimeConfig;
use exclusion_projection::logging::codes;
use exclusion_projection::{
    log_debug, log_error, log_info, logging, ArrayRecursionPolicy, BatchError, DefaultIdPolicy,
    Document, ParsedExclusionProjection, ProjectionError,
};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "project")]
#[command(version)]
#[command(about = "Remove fields from JSON documents with an exclusion projection")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct SpecArgs {
    /// Projection spec as JSON, or @path to read it from a file
    #[arg(long, short)]
    spec: String,

    /// Drop _id unless the spec mentions it
    #[arg(long, conflicts_with = "include_id")]
    exclude_id: bool,

    /// Keep _id unless the spec mentions it
    #[arg(long)]
    include_id: bool,

    /// Leave arrays nested directly inside arrays untouched
    #[arg(long)]
    no_nested_arrays: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project NDJSON documents
    Apply {
        #[command(flatten)]
        spec: SpecArgs,

        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Worker threads (default: PROJECTION_BATCH_THREADS or detected)
        #[arg(long)]
        threads: Option<usize>,

        /// Stop at the first line that is not a JSON object
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the compiled exclusion tree
    Explain {
        #[command(flatten)]
        spec: SpecArgs,
    },

    /// Print every path the projection removes
    Paths {
        #[command(flatten)]
        spec: SpecArgs,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid projection spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid JSON on input line {line}: {message}")]
    InvalidInput { line: usize, message: String },

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

/// Non-blank input lines read and projected per batch
const INPUT_CHUNK_SIZE: usize = 10_000;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let runtime = RuntimeConfig::from_env();

    if init_logging(&runtime).is_err() {
        return ExitCode::FAILURE;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match run(cli.command, &runtime, &mut out) {
        Ok(rejected) if !rejected.is_empty() => {
            for (line, reason) in &rejected {
                eprintln!("line {}: {}", line, reason);
            }
            eprintln!("{} input line(s) were not JSON objects", rejected.len());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(runtime: &RuntimeConfig) -> Result<(), CliError> {
    logging::init_global_logging_with_preferences(&runtime.logging).map_err(|e| {
        logging::safe_log_critical(codes::system::INITIALIZATION_FAILURE, &e);
        CliError::Logging(e)
    })
}

/// Execute one command, returning the line number and reason of every rejected input line
fn run(
    command: Commands,
    runtime: &RuntimeConfig,
    out: &mut impl Write,
) -> Result<Vec<(usize, String)>, CliError> {
    match command {
        Commands::Apply {
            spec,
            input,
            threads,
            fail_fast,
        } => {
            let projection = compile(&spec, runtime)?;

            let mut config = BatchConfig::from_preferences(&runtime.batch);
            if let Some(threads) = threads {
                config.max_threads = threads.max(1);
            }
            config.fail_fast = fail_fast;

            match &input {
                Some(path) => {
                    let file = File::open(path).map_err(|source| io_error(path, source))?;
                    apply_stream(
                        &projection,
                        BufReader::new(file),
                        &config,
                        INPUT_CHUNK_SIZE,
                        out,
                    )
                }
                None => apply_stream(
                    &projection,
                    io::stdin().lock(),
                    &config,
                    INPUT_CHUNK_SIZE,
                    out,
                ),
            }
        }
        Commands::Explain { spec } => {
            let projection = compile(&spec, runtime)?;
            let explain = Value::Object(projection.serialize(None));
            let text = serde_json::to_string_pretty(&explain)
                .map_err(|e| CliError::InvalidSpec(e.to_string()))?;
            writeln!(out, "{}", text).map_err(|source| io_error(Path::new("stdout"), source))?;
            Ok(Vec::new())
        }
        Commands::Paths { spec } => {
            let projection = compile(&spec, runtime)?;
            for path in projection.modified_paths() {
                writeln!(out, "{}", path).map_err(|source| io_error(Path::new("stdout"), source))?;
            }
            Ok(Vec::new())
        }
    }
}

fn compile(args: &SpecArgs, runtime: &RuntimeConfig) -> Result<ParsedExclusionProjection, CliError> {
    let spec = load_spec(&args.spec)?;

    let mut preferences = runtime.projection.clone();
    if args.exclude_id {
        preferences.default_id_policy = DefaultIdPolicy::ExcludeId;
    } else if args.include_id {
        preferences.default_id_policy = DefaultIdPolicy::IncludeId;
    }
    if args.no_nested_arrays {
        preferences.array_recursion_policy = ArrayRecursionPolicy::DoNotRecurseNestedArrays;
    }

    ParsedExclusionProjection::compile_with_preferences(&spec, &preferences).map_err(|e| {
        log_error!(e.error_code(), "Spec rejected", "spec" => &args.spec);
        CliError::from(e)
    })
}

/// Parse an inline spec, or read it from the file named after `@`
fn load_spec(arg: &str) -> Result<Document, CliError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|source| io_error(Path::new(path), source))?
        }
        None => arg.to_string(),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(spec)) => Ok(spec),
        Ok(other) => Err(CliError::InvalidSpec(format!(
            "expected a JSON object, found {}",
            other
        ))),
        Err(e) => Err(CliError::InvalidSpec(e.to_string())),
    }
}

/// Project NDJSON from `reader` in chunks, writing each chunk's output before reading on.
///
/// Chunks never exceed the batch document limit, so input length is unbounded.
fn apply_stream(
    projection: &ParsedExclusionProjection,
    reader: impl BufRead,
    config: &BatchConfig,
    chunk_size: usize,
    out: &mut impl Write,
) -> Result<Vec<(usize, String)>, CliError> {
    let chunk_size = chunk_size.clamp(1, config.document_limit().max(1));
    let mut lines = reader.lines().enumerate();
    let mut rejected = Vec::new();
    let mut documents_processed = 0;

    loop {
        let chunk = read_chunk(&mut lines, chunk_size)?;
        if chunk.is_empty() {
            break;
        }

        let (line_numbers, values): (Vec<usize>, Vec<Value>) = chunk.into_iter().unzip();
        let results = batch::apply_batch(projection, &values, config)?;
        log_debug!("Chunk projected", "summary" => results.summary());

        let BatchResults {
            projected,
            rejected: chunk_rejected,
            documents_processed: chunk_processed,
            ..
        } = results;
        documents_processed += chunk_processed;

        for (_, document) in projected {
            write_line(out, &Value::Object(document))?;
        }
        rejected.extend(
            chunk_rejected
                .into_iter()
                .map(|(index, reason)| (line_numbers[index], reason)),
        );

        if config.fail_fast && !rejected.is_empty() {
            break;
        }
    }

    out.flush()
        .map_err(|source| io_error(Path::new("stdout"), source))?;
    log_info!("Projection run finished",
        "documents_processed" => documents_processed,
        "rejected" => rejected.len()
    );

    Ok(rejected)
}

/// Next `chunk_size` non-blank lines, each parsed as JSON and paired with its 1-based line number
fn read_chunk(
    lines: &mut impl Iterator<Item = (usize, io::Result<String>)>,
    chunk_size: usize,
) -> Result<Vec<(usize, Value)>, CliError> {
    let mut chunk = Vec::new();

    for (index, line) in lines {
        let line = line.map_err(|source| io_error(Path::new("input"), source))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|e| CliError::InvalidInput {
            line: index + 1,
            message: e.to_string(),
        })?;
        chunk.push((index + 1, value));
        if chunk.len() == chunk_size {
            break;
        }
    }

    Ok(chunk)
}

fn write_line(out: &mut impl Write, value: &Value) -> Result<(), CliError> {
    writeln!(out, "{}", value).map_err(|source| io_error(Path::new("stdout"), source))
}

fn io_error(path: &Path, source: io::Error) -> CliError {
    CliError::Io {
        path: path.display().to_string(),
        source,
    }
}
