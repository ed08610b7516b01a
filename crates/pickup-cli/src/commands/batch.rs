//! Batch command - extract fields from every message in a set of files.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::parse::{ParseOutput, Pipeline};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern (one message per line)
    #[arg(required = true)]
    input: String,

    /// Output file for JSON lines (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rule book to try before the built-in patterns
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Only use the rule book, never the built-in patterns
    #[arg(long, requires = "rules")]
    rules_only: bool,

    /// Write a per-file summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// One output line.
#[derive(Serialize)]
struct MessageRecord<'a> {
    file: &'a str,
    line: usize,
    #[serde(flatten)]
    parsed: ParseOutput,
}

/// Counts for a single input file.
#[derive(Debug, Default, PartialEq, Eq)]
struct FileStats {
    messages: usize,
    with_code: usize,
    with_station: usize,
    with_address: usize,
}

impl FileStats {
    fn record(&mut self, parsed: &ParseOutput) {
        self.messages += 1;
        self.with_code += usize::from(parsed.result.code.is_some());
        self.with_station += usize::from(parsed.result.station.is_some());
        self.with_address += usize::from(parsed.result.address.is_some());
    }
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    stats: Option<FileStats>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let rules = super::rules::load_rule_set(args.rules.as_deref(), &config)?;
    let pipeline = Pipeline::new(&config, rules, args.rules_only);

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(fs::File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let outcome = process_file(&path, &pipeline, &mut sink);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(stats) => {
                debug!("Processed {} messages from {}", stats.messages, path.display());
                results.push(FileResult {
                    path,
                    stats: Some(stats),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        stats: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    sink.flush()?;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let messages: usize = results
        .iter()
        .filter_map(|r| r.stats.as_ref())
        .map(|s| s.messages)
        .sum();

    eprintln!(
        "{} Processed {} messages from {} files in {:?}",
        style("✓").green(),
        messages,
        results.len(),
        start.elapsed()
    );

    if !failed.is_empty() {
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_file(
    path: &Path,
    pipeline: &Pipeline,
    sink: &mut dyn Write,
) -> anyhow::Result<FileStats> {
    let content = fs::read_to_string(path)?;
    let file = path.display().to_string();
    let mut stats = FileStats::default();

    for (idx, line) in content.lines().enumerate() {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let parsed = pipeline.run(message, false);
        stats.record(&parsed);

        let record = MessageRecord {
            file: &file,
            line: idx + 1,
            parsed,
        };
        serde_json::to_writer(&mut *sink, &record)?;
        sink.write_all(b"\n")?;
    }

    Ok(stats)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "messages",
        "with_code",
        "with_station",
        "with_address",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        match &result.stats {
            Some(stats) => wtr.write_record([
                filename,
                "success",
                &stats.messages.to_string(),
                &stats.with_code.to_string(),
                &stats.with_station.to_string(),
                &stats.with_address.to_string(),
                &time,
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &time,
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
