//! lazypipe CLI: load a JSON Lines / CSV source, filter it, write JSON Lines.

use clap::{Parser, Subcommand};
use lazypipe_core::config::PipeConfig;
use lazypipe_core::context::Context;
use lazypipe_io::{Input, JsonlWriter, Registry};
use lazypipe_operators::Pipeline;
use serde_json::Value;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lazypipe")]
#[command(about = "Lazy key/value pipelines over JSON Lines and CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a source through filters and print the result as JSON Lines
    Run {
        /// Source file (.jsonl, .ndjson, .csv, .tsv, or JSON Lines content)
        #[arg(short, long)]
        input: PathBuf,

        /// Keep records matching "path OP value" (OP: = != > < >= <= IN)
        #[arg(long = "where", value_name = "EXPR")]
        keep_where: Vec<String>,

        /// Drop records matching "path OP value"
        #[arg(long = "drop-where", value_name = "EXPR")]
        drop_where: Vec<String>,

        /// Re-key records by this property path
        #[arg(long)]
        key: Option<String>,

        /// Output only this property of each record
        #[arg(long)]
        pluck: Option<String>,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,

        /// Print the number of records instead of the records
        #[arg(long)]
        count: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Entry cap for buffering operators (overrides config)
        #[arg(long)]
        max_buffered: Option<usize>,
    },

    /// Report which adapter would load a source
    Detect {
        #[arg(short, long)]
        input: PathBuf,
    },
}

struct RunArgs {
    input: PathBuf,
    keep_where: Vec<String>,
    drop_where: Vec<String>,
    key: Option<String>,
    pluck: Option<String>,
    limit: Option<usize>,
    count: bool,
    output: Option<PathBuf>,
    max_buffered: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            keep_where,
            drop_where,
            key,
            pluck,
            limit,
            count,
            output,
            max_buffered,
        } => {
            let args = RunArgs {
                input,
                keep_where,
                drop_where,
                key,
                pluck,
                limit,
                count,
                output,
                max_buffered,
            };
            if let Err(e) = run(args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Detect { input } => {
            let config = PipeConfig::from_env();
            match Registry::with_defaults(&config).detect(&Input::path(&input)) {
                Some(name) => println!("{}", name),
                None => {
                    eprintln!("No adapter recognizes {}", input.display());
                    std::process::exit(1);
                }
            }
        }
    }
}

fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PipeConfig::from_env();
    if let Some(max) = args.max_buffered {
        config.max_buffered_entries = Some(max);
    }
    config.validate()?;

    let seq = Registry::with_defaults(&config).load(Input::path(&args.input))?;
    let mut pipe = Pipeline::with_context(seq, Context::new(config));

    for expr in &args.keep_where {
        let (path, op, value) = parse_where(expr)?;
        pipe = pipe.keep_where(&path, value, &op)?;
    }
    for expr in &args.drop_where {
        let (path, op, value) = parse_where(expr)?;
        pipe = pipe.drop_where(&path, value, &op)?;
    }
    if let Some(path) = args.key {
        pipe = pipe.key(path);
    }
    if let Some(path) = args.pluck {
        pipe = pipe.pluck(path);
    }
    if let Some(n) = args.limit {
        pipe = pipe.limit(n);
    }

    if args.count {
        println!("{}", pipe.count()?);
        return Ok(());
    }

    let written = match args.output {
        Some(path) => JsonlWriter::to_path(path)?.write_entries(pipe)?,
        None => JsonlWriter::to_writer(io::stdout().lock()).write_entries(pipe)?,
    };
    tracing::info!(records = written, "done");
    Ok(())
}

const OPERATORS: [&str; 7] = [">=", "<=", "!=", "==", "=", ">", "<"];

/// Split "path OP value" into its parts.
///
/// The value is read as JSON when it parses, otherwise as a bare string. For
/// `IN`, a non-JSON value is split on commas.
fn parse_where(expr: &str) -> Result<(String, String, Value), String> {
    let invalid = || format!("invalid expression '{}': expected \"path OP value\"", expr);

    let symbolic = OPERATORS
        .iter()
        .filter_map(|op| expr.find(op).map(|pos| (pos, *op, op.len())));
    let membership = find_in(expr).map(|pos| (pos, "IN", 4));
    let (pos, op, len) = symbolic
        .chain(membership)
        .min_by_key(|&(pos, _, len)| (pos, std::cmp::Reverse(len)))
        .ok_or_else(invalid)?;
    let (path, raw) = (&expr[..pos], &expr[pos + len..]);

    let path = path.trim();
    let raw = raw.trim();
    if path.is_empty() || raw.is_empty() {
        return Err(invalid());
    }

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v) => v,
        Err(_) if op == "IN" => Value::Array(
            raw.split(',')
                .map(|part| {
                    let part = part.trim();
                    serde_json::from_str(part).unwrap_or_else(|_| Value::String(part.to_string()))
                })
                .collect(),
        ),
        Err(_) => Value::String(raw.to_string()),
    };
    Ok((path.to_string(), op.to_string(), value))
}

/// Byte offset of a standalone " IN " (any case).
fn find_in(expr: &str) -> Option<usize> {
    expr.to_ascii_lowercase().find(" in ")
}
