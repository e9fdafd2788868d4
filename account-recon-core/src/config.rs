use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::range::DEFAULT_ACCOUNT_WIDTH;

/// Fully resolved configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconConfig {
    pub pipeline: PipelineConfig,
    pub columns: ColumnNames,
    pub store: StoreConfig,
}

impl ReconConfig {
    pub fn trace_loaded(&self) {
        info!(
            spreadsheet = %self.pipeline.spreadsheet.display(),
            visual_report = %self.pipeline.output.visual_report.display(),
            missing_report = %self.pipeline.output.missing_report.display(),
            table = %self.store.table,
            column = %self.store.column,
            "Loaded ReconConfig"
        );
        debug!(?self, "ReconConfig loaded (full debug)");
    }
}

/// What the pipeline itself needs: where to read, how wide accounts are, where to write.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// A spreadsheet file, or a directory searched for the first `.xlsx`.
    pub spreadsheet: PathBuf,
    pub account_width: usize,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub visual_report: PathBuf,
    pub missing_report: PathBuf,
    pub qr: QrOptions,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            visual_report: PathBuf::from("qr_codes.pdf"),
            missing_report: PathBuf::from("missing_accounts.txt"),
            qr: QrOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(spreadsheet: impl Into<PathBuf>) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            account_width: DEFAULT_ACCOUNT_WIDTH,
            output: OutputConfig::default(),
        }
    }
}

/// Spreadsheet header names mapped onto interval fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub file_id: String,
    pub start: String,
    pub end: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            file_id: "FILE NO".into(),
            start: "START".into(),
            end: "END".into(),
        }
    }
}

/// QR error-correction level, mirroring `qrcode::EcLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

/// Byte capacity of a version 40 QR code at error-correction level H.
pub const QR_V40_H_BYTE_CAPACITY: usize = 1273;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Upper bound on one QR payload; longer account lists are split across pages.
    pub max_payload_bytes: usize,
    pub error_correction: ErrorCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            max_payload_bytes: QR_V40_H_BYTE_CAPACITY,
            error_correction: ErrorCorrection::H,
        }
    }
}

/// Connection and query parameters for the account store.
#[derive(Clone)]
pub struct StoreConfig {
    /// `sqlite:` or `postgres://` URL; carries credentials, never logged.
    pub url: String,
    pub table: String,
    pub column: String,
    pub connect_timeout: Duration,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            table: "documents".into(),
            column: "name".into(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = self.url.split(':').next().unwrap_or_default();
        f.debug_struct("StoreConfig")
            .field("url", &format_args!("{scheme}:<redacted>"))
            .field("table", &self.table)
            .field("column", &self.column)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
