//! # contract: shared data types, errors and I/O seams
//!
//! This module defines the plain data handed between pipeline stages, the
//! error taxonomy every stage reports through, and the two traits that sit
//! at the I/O boundaries of a reconciliation run:
//!
//! - [`IntervalLoader`]: yields the declared account ranges (spreadsheet in production)
//! - [`AccountSource`]: yields the account numbers the external store knows about
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so consumers get `MockIntervalLoader`
//!   and `MockAccountSource` under `cfg(test)` or the `test-export-mocks` feature.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mockall::automock;

/// One declared account range, read verbatim from a spreadsheet row.
///
/// Bounds are inclusive. A loaded interval is not guaranteed to be valid;
/// [`crate::range::expand`] rejects negative or reversed bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInterval {
    pub file_id: String,
    pub start: i64,
    pub end: i64,
}

impl AccountInterval {
    pub fn new(file_id: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            file_id: file_id.into(),
            start,
            end,
        }
    }
}

/// Outcome of reconciling one interval against the known accounts.
///
/// `present` and `missing` are disjoint, each ascending, and together cover
/// the full expansion of `interval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub file_id: String,
    pub interval: AccountInterval,
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub total_expected: u64,
}

/// Raised by the range expander for bounds that do not describe a valid range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid account range [{start}, {end}]: {reason}")]
pub struct InvalidRangeError {
    pub start: i64,
    pub end: i64,
    pub reason: String,
}

/// Every failure a reconciliation run can report.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error("spreadsheet not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("malformed spreadsheet row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("account store unreachable: {0}")]
    Connection(String),

    #[error("account query failed: {0}")]
    Query(String),

    #[error("cannot encode QR payload for FILE NO {file_id}: {reason}")]
    Encoding { file_id: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Loads the declared account intervals from some tabular input.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait IntervalLoader: Send + Sync {
    /// Read every interval at `path`, in input order.
    fn load(&self, path: &Path) -> Result<Vec<AccountInterval>, ReconError>;
}

/// Source of truth for which account numbers exist.
///
/// Implementations fetch fresh on every call; nothing is cached across runs.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Fetch the full set of known account-number strings.
    async fn fetch_known_accounts(&self) -> Result<HashSet<String>, ReconError>;
}
