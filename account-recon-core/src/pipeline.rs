//! High-level pipeline: load intervals → fetch known accounts → reconcile → emit reports.
//!
//! [`run_pipeline`] is the single entry point for a reconciliation run. All
//! I/O collaborators are injected: an [`IntervalLoader`] for the declared
//! ranges and an [`AccountSource`] for the ground truth, so the whole flow
//! runs against mocks in tests.
//!
//! # Failure behaviour
//! - Loader and account-source errors are fatal and returned as-is.
//! - Invalid intervals are skipped and reported in [`PipelineReport::rejected`].
//! - Both reports are rendered in memory and staged as temp files before
//!   either is moved into place. If any step fails, no output file is created
//!   or modified.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::contract::{AccountSource, IntervalLoader, ReconError};
use crate::missing_report::render_missing_report;
use crate::output::stage;
use crate::reconcile::{reconcile, Reconciliation, ReconciliationSummary, RejectedInterval};
use crate::visual_report::{render_visual_report, PageSummary};

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub summary: ReconciliationSummary,
    pub pages: Vec<PageSummary>,
    pub rejected: Vec<RejectedInterval>,
    pub visual_report: PathBuf,
    pub missing_report: PathBuf,
}

pub async fn run_pipeline<L, S>(
    loader: &L,
    source: &S,
    config: &PipelineConfig,
) -> Result<PipelineReport, ReconError>
where
    L: IntervalLoader + ?Sized,
    S: AccountSource + ?Sized,
{
    info!(spreadsheet = %config.spreadsheet.display(), "[RECON] Starting reconciliation pipeline");

    // Step 1: declared ranges
    let intervals = loader.load(&config.spreadsheet).map_err(|e| {
        error!(error = %e, "[RECON][ERROR] Loading intervals failed");
        e
    })?;
    info!(intervals = intervals.len(), "[RECON] Intervals loaded");

    // Step 2: ground truth
    let known = source.fetch_known_accounts().await.map_err(|e| {
        error!(error = %e, "[RECON][ERROR] Fetching known accounts failed");
        e
    })?;
    info!(known = known.len(), "[RECON] Known accounts fetched");

    // Step 3: reconcile
    let reconciliation = reconcile(&intervals, &known, config.account_width);

    // Step 4: emit
    let pages = emit_reports(&reconciliation, config)?;

    let report = PipelineReport {
        summary: reconciliation.summary(),
        pages,
        rejected: reconciliation.rejected().to_vec(),
        visual_report: config.output.visual_report.clone(),
        missing_report: config.output.missing_report.clone(),
    };
    info!(
        file_ids = report.summary.file_ids,
        missing = report.summary.missing,
        pages = report.pages.len(),
        "[RECON] Pipeline complete"
    );
    Ok(report)
}

fn emit_reports(
    reconciliation: &Reconciliation,
    config: &PipelineConfig,
) -> Result<Vec<PageSummary>, ReconError> {
    let output = &config.output;
    let visual = render_visual_report(reconciliation, &output.qr).map_err(|e| {
        error!(error = %e, "[RECON][ERROR] Rendering visual report failed");
        e
    })?;
    let missing = render_missing_report(reconciliation);

    let staged_visual = stage(&output.visual_report, &visual.bytes)?;
    let staged_missing = stage(&output.missing_report, missing.as_bytes())?;

    let visual_path = staged_visual.commit()?;
    info!(path = %visual_path.display(), pages = visual.pages.len(), "[RECON] Visual report written");
    let missing_path = staged_missing.commit()?;
    info!(path = %missing_path.display(), bytes = missing.len(), "[RECON] Missing accounts report written");

    Ok(visual.pages)
}
