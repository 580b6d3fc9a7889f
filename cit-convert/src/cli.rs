/// # cit-convert CLI Interface (Module)
///
/// Command parsing and the `run` entrypoint for the `cit-convert` binary.
///
/// All conversion logic lives in the [`cit-convert-core`] crate; this module only loads the
/// configuration, invokes the pipeline and prints a summary.
///
/// ## How To Use
/// - For command-line users: use the installed `cit-convert` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`cit-convert-core`]: ../../cit-convert-core/
use crate::load_config::load_config;
use anyhow::Result;
use cit_convert_core::pipeline::{convert_pack, ConvertReport};
use cit_convert_core::properties::PropertiesFileReader;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for cit-convert: migrate a legacy custom-item-texture pack to item definitions.
#[derive(Parser)]
#[clap(
    name = "cit-convert",
    version,
    about = "Convert legacy CIT resource pack rules into item definitions and equipment"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert the pack described by the given run config file
    Convert {
        /// Path to the JSON run config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Convert { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "convert", "Starting conversion");
            match convert_pack(&config, &PropertiesFileReader) {
                Ok(report) => {
                    tracing::info!(command = "convert", ?report, "Conversion complete");
                    print_summary(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "convert", error = %e, "Conversion failed");
                    Err(anyhow::Error::new(e).context("Conversion failed"))
                }
            }
        }
    }
}

fn print_summary(report: &ConvertReport) {
    println!("Rule files discovered: {}", report.discovered);
    println!("Rule files converted: {}", report.converted);
    for (reason, count) in &report.rejections {
        println!("{}: {count}", reason.title());
    }
    if report.errors > 0 {
        println!("Rule files with conversion errors: {}", report.errors);
    }
    if report.duplicates > 0 {
        println!("Duplicated rule names: {}", report.duplicates);
    }
    println!("Conversion entries written: {}", report.ledger_entries);
}
