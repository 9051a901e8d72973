//! Batch processing command for multiple label images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use bestby_core::{DateOcrService, ExtractionResult};

use super::{load_config, ProviderArg};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "tif", "webp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching label images
    #[arg(required = true)]
    input: String,

    /// Write a CSV summary to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// OCR provider (overrides the config file)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(provider) = args.provider {
        config.ocr.provider = provider.into();
    }

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    let continue_on_error = args.continue_on_error;
    let worker_pb = pb.clone();

    let results = tokio::task::spawn_blocking(move || {
        let service = DateOcrService::from_config(&config);
        if !service.is_available() {
            warn!("No OCR provider available; every file will report no date");
        }
        process_files(&service, files, continue_on_error, &worker_pb)
    })
    .await??;

    pb.finish_and_clear();

    if let Some(output) = &args.output {
        write_summary(output, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            output.display()
        );
    }

    let found = results
        .iter()
        .filter(|r| r.extraction.as_ref().is_some_and(ExtractionResult::is_found))
        .count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} with a date, {} without, {} failed",
        style(found).green(),
        style(results.len() - found - failed.len()).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn process_files(
    service: &DateOcrService,
    files: Vec<PathBuf>,
    continue_on_error: bool,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<ProcessResult>> {
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let read = fs::read(&path);
        let processing_time = || file_start.elapsed().as_millis() as u64;

        match read {
            Ok(data) => {
                let extraction = service.extract(&data);
                let date = extraction.iso_date().unwrap_or_else(|| "-".to_string());
                pb.println(format!("  {} {}", path.display(), date));
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms: processing_time(),
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if continue_on_error {
                    warn!("Failed to read {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms: processing_time(),
                    });
                } else {
                    error!("Failed to read {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    Ok(results)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "date", "keyword", "method", "error", "time_ms"])?;

    for result in results {
        let file = result.path.display().to_string();
        let found = result.extraction.as_ref().and_then(|e| e.expiry.as_ref());

        wtr.write_record([
            file.as_str(),
            &found.map(|m| m.date.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            found.and_then(|m| m.keyword.as_deref()).unwrap_or(""),
            &found.map(|m| m.method.to_string()).unwrap_or_default(),
            result.error.as_deref().unwrap_or(""),
            &result.processing_time_ms.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
