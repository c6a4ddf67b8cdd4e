//! Command-line interface for the converter.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::assemble::{extract_metadata, AssembleOptions};
use crate::config::FlattenConfig;
use crate::converter::{convert_file, ConvertOptions};
use crate::error::{AltinnError, Result};
use crate::mapping::FieldMapping;
use crate::output::{output_filename, write_csv_file};
use crate::tree::load_bytes;
use crate::types::SourceContext;

/// Altinn ISEE - Flatten Altinn3 survey XML into ISEE/Dynarev rows.
#[derive(Parser)]
#[command(name = "altinn-isee")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert Altinn XML forms to ISEE CSV files.
    Convert {
        /// Altinn XML files (e.g., form_a9b867d4a91c.xml)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML or JSON file mapping old field names to new ones
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Field holding comma-separated checkbox answers (repeatable)
        #[arg(long = "checkbox")]
        checkbox: Vec<String>,

        /// Name expanded checkbox fields by option code only
        #[arg(long)]
        unique_code: bool,

        /// Append an ANGIVER_ID row to each form
        #[arg(long)]
        submitter_row: bool,

        /// Add a LEVEL column with each field's nesting depth
        #[arg(long)]
        include_level: bool,

        /// Add the entries of meta_<id>.json next to each form as fields
        #[arg(long)]
        attach_meta: bool,

        /// Element holding the form data (default: SkjemaData)
        #[arg(long)]
        data_block: Option<String>,
    },

    /// Check that forms are well-formed and carry the required metadata.
    Validate {
        /// Altinn XML files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            files,
            output,
            mapping,
            checkbox,
            unique_code,
            submitter_row,
            include_level,
            attach_meta,
            data_block,
        } => {
            let mut config = FlattenConfig::from_env()?;
            if let Some(tag) = data_block {
                config = config.with_data_block(tag);
            }
            config.validate()?;

            let mapping = mapping.as_deref().map(FieldMapping::load).transpose()?;
            let options = ConvertOptions {
                config,
                mapping,
                checkbox_fields: checkbox,
                unique_code,
                attach_meta,
                assemble: AssembleOptions {
                    submitter_row,
                    include_level,
                },
            };
            convert_command(&files, output.as_deref(), &options)
        }
        Commands::Validate { files } => validate_command(&files),
    }
}

/// Execute the convert command.
fn convert_command(files: &[PathBuf], output: Option<&Path>, options: &ConvertOptions) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| Path::new("."));
    if !output_dir.is_dir() {
        return Err(AltinnError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Output directory does not exist: {}", output_dir.display()),
        )));
    }

    let pb = ProgressBar::new(files.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")
            .expect("valid template"),
    );

    let mut failed = 0;
    for path in files {
        pb.set_message(path.display().to_string());

        let outcome = convert_one(path, output_dir, options);
        pb.suspend(|| match &outcome {
            Ok((target, rows, warnings)) => {
                println!(
                    "{} {} -> {} ({} rows)",
                    style("Converted").green().bold(),
                    path.display(),
                    target.display(),
                    rows
                );
                if !warnings.is_empty() {
                    println!(
                        "  {} table within table, not flattened:",
                        style("Warning:").yellow().bold()
                    );
                    for warning in warnings {
                        println!("    {}", style(warning).yellow());
                    }
                }
            }
            Err(e) => {
                println!("{} {}: {e}", style("Failed").red().bold(), path.display());
            }
        });
        if outcome.is_err() {
            failed += 1;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if failed > 0 {
        return Err(AltinnError::BatchFailed {
            failed,
            total: files.len(),
        });
    }
    Ok(())
}

/// Convert one file and write its CSV. Returns the output path, row count and warnings.
fn convert_one(
    path: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<(PathBuf, usize, Vec<String>)> {
    let conversion = convert_file(path, options)?;
    let source = SourceContext::from_path(path);
    let target = output_dir.join(output_filename(&conversion.metadata, &source));

    write_csv_file(&target, &conversion.rows)?;
    Ok((target, conversion.rows.len(), conversion.warnings))
}

/// Execute the validate command.
fn validate_command(files: &[PathBuf]) -> Result<()> {
    let config = FlattenConfig::from_env()?;
    let mut failed = 0;

    for path in files {
        match validate_one(path, &config) {
            Ok(()) => println!("{} {}", style("Valid").green().bold(), path.display()),
            Err(e) => {
                failed += 1;
                println!("{} {}: {e}", style("Invalid").red().bold(), path.display());
            }
        }
    }

    if failed > 0 {
        return Err(AltinnError::BatchFailed {
            failed,
            total: files.len(),
        });
    }
    Ok(())
}

fn validate_one(path: &Path, config: &FlattenConfig) -> Result<()> {
    let doc = load_bytes(&fs::read(path)?)?;
    extract_metadata(doc.block(&config.metadata_block))?;
    Ok(())
}
