//! Extract command - read the expiry date from a single label image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use bestby_core::DateOcrService;

use super::{format_text, load_config, OutputFormat, ProviderArg, Report};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Label image (PNG, JPEG, ...)
    #[arg(required = true)]
    image: PathBuf,

    /// OCR provider (overrides the config file)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Send the image to OCR without preprocessing
    #[arg(long)]
    no_preprocess: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also print the recognized text lines
    #[arg(long)]
    show_text: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(provider) = args.provider {
        config.ocr.provider = provider.into();
    }
    if args.no_preprocess {
        config.preprocessing.enabled = false;
    }

    if !args.image.exists() {
        anyhow::bail!("Input file not found: {}", args.image.display());
    }

    info!("Processing image: {}", args.image.display());
    let data = fs::read(&args.image)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Running OCR...");
    pb.enable_steady_tick(Duration::from_millis(100));

    // The providers block, so keep them off the async runtime
    let (provider, lines, result) = tokio::task::spawn_blocking(move || {
        let service = DateOcrService::from_config(&config);
        let lines = service.recognize(&data);
        let result = service.parser().parse(&lines);
        (service.provider_name().map(str::to_string), lines, result)
    })
    .await?;

    pb.finish_and_clear();

    if provider.is_none() {
        eprintln!(
            "{} No OCR provider is available. Set AZURE_VISION_KEY and AZURE_VISION_ENDPOINT, \
             or place models in the configured model directory.",
            style("!").yellow()
        );
    }

    match args.format {
        OutputFormat::Json => {
            let file = args.image.to_string_lossy();
            let report = Report {
                file: Some(&file),
                provider: provider.as_deref(),
                date: result.iso_date(),
                result: &result,
                lines: args.show_text.then_some(lines.as_slice()),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            if args.show_text {
                println!("{}", style("Recognized text:").dim());
                for line in &lines {
                    println!("  {}", line);
                }
                println!();
            }
            print!("{}", format_text(&result));
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
