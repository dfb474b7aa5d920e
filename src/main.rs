//! CLI entry point for set_decoder
//!
//! Converts a legacy DSP settings file into JSON using the DSP variable layout
//! file of the firmware that wrote it.
//!
//! # Usage
//!
//! ```bash
//! set_decoder --var firmware/pixie16_revf_14b500m_r33450.var --input crate.set
//! ```
//!
//! The document is written next to the settings file (`crate.json`) unless
//! `--output` is given.

use anyhow::{Context, Result};
use clap::Parser;
use set_decoder::config::{DecoderConfig, DEFAULT_CONFIG_PATH};
use set_decoder::settings::{output_path, write_document, SettingsDecoder};
use set_decoder::{logging, validation};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "set_decoder")]
#[command(about = "Converts legacy settings files to JSON", long_about = None)]
struct Cli {
    /// Path to the DSP var file
    #[arg(short = 'v', long = "var")]
    var_file: PathBuf,

    /// Path to the settings file
    #[arg(short = 'i', long = "input")]
    input_file: PathBuf,

    /// Output path (defaults to the settings file with its extension replaced)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DecoderConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;
    logging::init_from_config(&config)?;

    validation::ensure_file(&cli.input_file)?;
    validation::ensure_file(&cli.var_file)?;

    let decoder = SettingsDecoder::from_layout_file(&cli.var_file, &config.layout)
        .with_context(|| format!("Invalid layout file {}", cli.var_file.display()))?;
    let document = decoder
        .decode_file(&cli.input_file)
        .with_context(|| format!("Failed to decode {}", cli.input_file.display()))?;

    let output = cli
        .output
        .unwrap_or_else(|| output_path(&cli.input_file, &config.output.extension));
    write_document(&document, &output, config.output.pretty)
        .with_context(|| format!("Could not open {} for writing", output.display()))?;

    tracing::info!(
        records = document.len(),
        output = %output.display(),
        "Conversion complete"
    );
    Ok(())
}
