//! Plain-text report of expected accounts the store does not know about.
//!
//! ```text
//! Missing accounts for FILE NO F1:
//! 00000000000001
//! 00000000000003
//!
//! ```
//!
//! File ids with nothing missing are omitted. When nothing is missing at all
//! the report is empty.

use std::path::Path;

use tracing::info;

use crate::contract::ReconError;
use crate::output::write_atomically;
use crate::reconcile::Reconciliation;

pub fn render_missing_report(reconciliation: &Reconciliation) -> String {
    let mut out = String::new();
    for result in reconciliation {
        if result.missing.is_empty() {
            continue;
        }
        out.push_str(&format!("Missing accounts for FILE NO {}:\n", result.file_id));
        for account in &result.missing {
            out.push_str(account);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Render and atomically write the missing-accounts report to `path`.
pub fn emit_missing_report(reconciliation: &Reconciliation, path: &Path) -> Result<(), ReconError> {
    let report = render_missing_report(reconciliation);
    write_atomically(path, report.as_bytes())?;
    info!(path = %path.display(), bytes = report.len(), "Missing accounts report written");
    Ok(())
}
