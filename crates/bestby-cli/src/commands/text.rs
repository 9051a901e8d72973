//! Text command - run date extraction over already recognized text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use bestby_core::ExpiryDateParser;

use super::{format_text, load_config, OutputFormat, Report};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// File with one OCR line per line (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let content = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let lines: Vec<&str> = content.lines().collect();
    let result = ExpiryDateParser::from_config(&config.extraction).parse(&lines);

    match args.format {
        OutputFormat::Json => {
            let file = args.input.as_ref().map(|p| p.to_string_lossy());
            let report = Report {
                file: file.as_deref(),
                provider: None,
                date: result.iso_date(),
                result: &result,
                lines: None,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print!("{}", format_text(&result)),
    }

    Ok(())
}
