//! `load_config` module: Loads a static YAML config file, injects the account-store
//! secret from the environment, and produces the core [`ReconConfig`].
//!
//! This module is the only place where the YAML file is parsed and mapped to the
//! strongly-typed core configuration.
//!
//! # Responsibilities
//! - Parse the YAML file into intermediate section structs
//! - Fill defaults for every optional key (column names, account width, store table/column, outputs)
//! - Read `ACCOUNT_STORE_URL` from the environment; credentials never live in the YAML file
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.
//!
//! Example config:
//!
//! ```yaml
//! spreadsheet: ./account_ranges.xlsx
//! columns:
//!   file_id: FILE NO
//!   start: START
//!   end: END
//! account_width: 14
//! store:
//!   table: documents
//!   column: name
//!   connect_timeout_secs: 10
//! output:
//!   visual_report: qr_codes.pdf
//!   missing_report: missing_accounts.txt
//!   qr:
//!     max_payload_bytes: 1273
//!     error_correction: H
//! ```

use account_recon_core::config::{
    ColumnNames, OutputConfig, PipelineConfig, QrOptions, ReconConfig, StoreConfig,
};
use account_recon_core::range::DEFAULT_ACCOUNT_WIDTH;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Environment variable holding the account store URL (with credentials).
pub const STORE_URL_ENV: &str = "ACCOUNT_STORE_URL";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    spreadsheet: PathBuf,
    #[serde(default)]
    columns: ColumnNames,
    #[serde(default = "default_account_width")]
    account_width: usize,
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StoreSection {
    table: String,
    column: String,
    connect_timeout_secs: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            table: "documents".into(),
            column: "name".into(),
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OutputSection {
    visual_report: PathBuf,
    missing_report: PathBuf,
    qr: QrOptions,
}

impl Default for OutputSection {
    fn default() -> Self {
        let defaults = OutputConfig::default();
        Self {
            visual_report: defaults.visual_report,
            missing_report: defaults.missing_report,
            qr: defaults.qr,
        }
    }
}

fn default_account_width() -> usize {
    DEFAULT_ACCOUNT_WIDTH
}

/// Loads a static YAML config file (no secrets) and injects the store URL from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ReconConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.account_width == 0 {
        error!("account_width must be positive");
        anyhow::bail!("account_width must be a positive number of digits");
    }
    if raw.output.qr.max_payload_bytes == 0 {
        error!("output.qr.max_payload_bytes must be positive");
        anyhow::bail!("output.qr.max_payload_bytes must be positive");
    }

    let url = match std::env::var(STORE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            info!("{STORE_URL_ENV} found in env");
            url
        }
        Ok(_) => {
            error!("{STORE_URL_ENV} is empty");
            anyhow::bail!("{STORE_URL_ENV} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{STORE_URL_ENV} environment variable not set");
            return Err(anyhow::anyhow!(
                "{STORE_URL_ENV} environment variable not set: {e}"
            ));
        }
    };

    let config = ReconConfig {
        pipeline: PipelineConfig {
            spreadsheet: raw.spreadsheet,
            account_width: raw.account_width,
            output: OutputConfig {
                visual_report: raw.output.visual_report,
                missing_report: raw.output.missing_report,
                qr: raw.output.qr,
            },
        },
        columns: raw.columns,
        store: StoreConfig {
            url,
            table: raw.store.table,
            column: raw.store.column,
            connect_timeout: Duration::from_secs(raw.store.connect_timeout_secs),
        },
    };
    config.trace_loaded();
    Ok(config)
}
