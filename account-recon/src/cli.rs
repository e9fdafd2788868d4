//! CLI glue for account-recon: command parsing, config overrides and the
//! async `run` entry point used by `main` and by integration tests.
//!
//! All reconciliation logic lives in `account-recon-core`; this module only
//! wires the production loader and account store into
//! [`account_recon_core::pipeline::run_pipeline`].

use crate::load_config::load_config;
use account_recon_core::account_source::SqlAccountSource;
use account_recon_core::pipeline::run_pipeline;
use account_recon_core::spreadsheet::SpreadsheetLoader;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for account-recon: reconcile declared account ranges against the account store.
#[derive(Parser)]
#[clap(
    name = "account-recon",
    version,
    about = "Reconcile spreadsheet account ranges against an account store and emit QR/PDF and missing-account reports"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full reconciliation using the given config file
    Reconcile {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Spreadsheet file or directory, overriding the config
        #[clap(long)]
        spreadsheet: Option<PathBuf>,
        /// Output path of the QR code PDF, overriding the config
        #[clap(long)]
        visual_report: Option<PathBuf>,
        /// Output path of the missing accounts report, overriding the config
        #[clap(long)]
        missing_report: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Reconcile {
            config,
            spreadsheet,
            visual_report,
            missing_report,
        } => {
            let mut config = load_config(config)?;
            if let Some(path) = spreadsheet {
                config.pipeline.spreadsheet = path;
            }
            if let Some(path) = visual_report {
                config.pipeline.output.visual_report = path;
            }
            if let Some(path) = missing_report {
                config.pipeline.output.missing_report = path;
            }
            tracing::info!(command = "reconcile", "Starting reconciliation");

            let loader = SpreadsheetLoader::new(config.columns.clone());
            let source = SqlAccountSource::new(&config.store)?;

            match run_pipeline(&loader, &source, &config.pipeline).await {
                Ok(report) => {
                    tracing::info!(command = "reconcile", summary = ?report.summary, "Reconciliation complete");
                    println!(
                        "Reconciled {} file numbers: {} expected, {} present, {} missing, {} rejected.",
                        report.summary.file_ids,
                        report.summary.expected,
                        report.summary.present,
                        report.summary.missing,
                        report.summary.rejected
                    );
                    for rejected in &report.rejected {
                        println!("Skipped FILE NO {}: {}", rejected.interval.file_id, rejected.error);
                    }
                    println!(
                        "QR codes: {} ({} pages)",
                        report.visual_report.display(),
                        report.pages.len()
                    );
                    println!("Missing accounts: {}", report.missing_report.display());
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "reconcile", error = %e, "Reconciliation failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
