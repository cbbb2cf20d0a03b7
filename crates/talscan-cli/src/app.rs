//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use talscan_core::{Document, FoldingRange, Scanner, Settings, SymbolNode};

/// Output format for scan results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output, 1-based line numbers
    #[default]
    Text,
    /// JSON output with the scanner's 0-based records
    Json,
}

#[derive(Parser)]
#[command(name = "talscan")]
#[command(author, version, about = "Structural views of TAL source files", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to talscan.toml next to the input)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print folding ranges
    Folds {
        /// Input TAL file
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the symbol outline
    Symbols {
        /// Input TAL file
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Folds { input, format } => folds_command(&input, format, cli.config.as_deref()),
        Commands::Symbols { input, format } => {
            symbols_command(&input, format, cli.config.as_deref())
        }
    }
}

/// Settings from an explicit file, or `talscan.toml` beside the input
pub fn load_settings(input: &Path, config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display())),
        None => {
            let dir = input.parent().unwrap_or(Path::new("."));
            Settings::discover(dir).context("Failed to load workspace configuration")
        }
    }
}

fn read_document(input: &Path) -> Result<Document> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    debug!("Read {} bytes from {}", content.len(), input.display());
    Ok(Document::new(input.display().to_string(), 1, &content))
}

/// Folding ranges of `input`, rendered
pub fn folds_output(input: &Path, format: OutputFormat, config: Option<&Path>) -> Result<String> {
    let scanner = Scanner::with_settings(load_settings(input, config)?);
    let doc = read_document(input)?;
    let folds = scanner
        .folding_ranges(&doc, &CancellationToken::new())
        .context("Folding scan failed")?;
    render_folds(&folds, format)
}

/// Symbol outline of `input`, rendered
pub fn symbols_output(
    input: &Path,
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<String> {
    let scanner = Scanner::with_settings(load_settings(input, config)?);
    let doc = read_document(input)?;
    let symbols = scanner
        .document_symbols(&doc, &CancellationToken::new())
        .context("Symbol scan failed")?;
    render_symbols(&symbols, format)
}

/// Print folding ranges of a file
pub fn folds_command(input: &Path, format: OutputFormat, config: Option<&Path>) -> Result<()> {
    print!("{}", folds_output(input, format, config)?);
    Ok(())
}

/// Print the symbol outline of a file
pub fn symbols_command(input: &Path, format: OutputFormat, config: Option<&Path>) -> Result<()> {
    print!("{}", symbols_output(input, format, config)?);
    Ok(())
}

pub fn render_folds(folds: &[FoldingRange], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(folds)
                .context("Failed to serialize folding ranges to JSON")?;
            Ok(json + "\n")
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for fold in folds {
                let _ = writeln!(
                    out,
                    "{:<8} {}-{}",
                    fold.kind.as_str(),
                    fold.start_line + 1,
                    fold.end_line + 1
                );
            }
            Ok(out)
        }
    }
}

pub fn render_symbols(symbols: &[SymbolNode], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(symbols)
                .context("Failed to serialize symbols to JSON")?;
            Ok(json + "\n")
        }
        OutputFormat::Text => {
            let mut out = String::new();
            write_outline(&mut out, symbols, 0);
            Ok(out)
        }
    }
}

/// One line per symbol, children indented under their parent
fn write_outline(out: &mut String, symbols: &[SymbolNode], depth: usize) {
    for symbol in symbols {
        let mut kind = symbol.kind.as_str().to_string();
        if symbol.is_bodyless() {
            kind = format!("{} {}", symbol.detail.as_str(), kind);
        }
        let _ = writeln!(
            out,
            "{:indent$}{} ({}) {}-{}",
            "",
            symbol.name,
            kind,
            symbol.range.start.line + 1,
            symbol.range.end.line + 1,
            indent = depth * 2
        );
        write_outline(out, &symbol.children, depth + 1);
    }
}
