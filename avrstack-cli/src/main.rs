//! `avrstack` command line tool
//!
//! Exit status for `analyze`: 0 when a bound was found (and fits `--limit`),
//! 1 on errors or when the bound exceeds `--limit`, 2 when unbounded.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use avrstack_analysis::{analyze, AnalysisConfig, AnalysisReport, StackBound};
use avrstack_assembler::assemble;
use avrstack_isa::FirmwareImage;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "avrstack", version, about = "Worst-case stack usage analysis for AVR firmware")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the maximum stack height of a firmware image
    Analyze {
        /// Intel HEX file (or raw binary with --raw)
        file: PathBuf,

        /// Treat the input as a raw flash dump
        #[arg(long)]
        raw: bool,

        /// Word address to start from
        #[arg(long, default_value_t = 0, value_parser = parse_number)]
        entry: u32,

        /// Bytes pushed by a call (3 on devices with a 22-bit PC)
        #[arg(long, default_value_t = 2)]
        call_cost: u8,

        /// Fail if the bound exceeds this many bytes
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Assemble a source file into Intel HEX
    Assemble {
        /// Assembly source
        source: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            file,
            raw,
            entry,
            call_cost,
            limit,
        } => {
            let config = AnalysisConfig::new()
                .with_entry_point(entry)
                .with_return_address_bytes(call_cost);
            run_analyze(&file, raw, config, limit)
        }
        Command::Assemble { source, output } => {
            run_assemble(&source, &output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_analyze(
    file: &Path,
    raw: bool,
    config: AnalysisConfig,
    limit: Option<u64>,
) -> Result<ExitCode> {
    let image = load_image(file, raw)?;
    debug!(bytes = image.len_bytes(), "loaded {}", file.display());

    let report = analyze(&image, config)
        .with_context(|| format!("failed to analyze {}", file.display()))?;

    print!("{}", render_report(&report, &image));
    Ok(ExitCode::from(exit_status(&report.bound, limit)))
}

fn load_image(file: &Path, raw: bool) -> Result<FirmwareImage> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    parse_image(bytes, raw).with_context(|| format!("failed to load {}", file.display()))
}

fn parse_image(bytes: Vec<u8>, raw: bool) -> Result<FirmwareImage> {
    if raw {
        return Ok(FirmwareImage::from_bytes(bytes));
    }
    let text = String::from_utf8(bytes).context("Intel HEX input is not valid UTF-8")?;
    Ok(FirmwareImage::from_ihex(&text)?)
}

fn run_assemble(source: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    let image = assemble(&text).with_context(|| format!("failed to assemble {}", source.display()))?;
    std::fs::write(output, image.to_ihex())
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        words = image.len_words(),
        sha256 = %image.digest_hex(),
        "wrote {}",
        output.display()
    );
    Ok(())
}

fn render_report(report: &AnalysisReport, image: &FirmwareImage) -> String {
    let mut out = String::new();
    out.push_str(&format!("stack bound:     {}\n", report.bound));
    if report.is_bounded() {
        out.push_str(&format!("peak at:         {:#06x}\n", report.peak_pc * 2));
    }
    out.push_str(&format!("states explored: {}\n", report.stats.states_explored));
    out.push_str(&format!("sha256:          {}\n", image.digest_hex()));
    out
}

fn exit_status(bound: &StackBound, limit: Option<u64>) -> u8 {
    match (bound, limit) {
        (StackBound::Unbounded, _) => 2,
        (bound, Some(limit)) if !bound.fits(limit) => 1,
        _ => 0,
    }
}

/// Decimal or `0x`-prefixed hexadecimal
fn parse_number(text: &str) -> std::result::Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", text, e))
}
