//! # visual_report: QR codes per file id, one PDF page per QR payload
//!
//! Each file id with present accounts gets one page per payload chunk (see
//! [`crate::qr::chunk_payloads`]). A page carries the QR symbol centered, the
//! label `FILE NO: <id> | Total Accounts: <n>` above it and, for file ids that
//! span several pages, `Part i of n` below it. Pages are landscape US letter.
//!
//! The QR symbol is drawn as filled vector rectangles, one per horizontal run
//! of dark modules, so no raster image is embedded.

use std::path::Path;

use printpdf::{
    BuiltinFont, Color, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage, PdfSaveOptions,
    Point, Polygon, PolygonRing, Pt, Rgb, TextItem, WindingOrder,
};
use tracing::{debug, info, warn};

use crate::config::QrOptions;
use crate::contract::ReconError;
use crate::output::write_atomically;
use crate::qr::{chunk_payloads, encode, QrMatrix};
use crate::reconcile::Reconciliation;

const PAGE_WIDTH_MM: f32 = 279.4;
const PAGE_HEIGHT_MM: f32 = 215.9;
const MARGIN_PT: f32 = 50.0;
const LABEL_SIZE_PT: f32 = 14.0;
const LABEL_GAP_PT: f32 = 12.0;
const QUIET_ZONE_MODULES: usize = 4;

/// What ended up on one page of the visual report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub file_id: String,
    pub part: usize,
    pub parts: usize,
    pub accounts: usize,
}

/// Rendered visual report, ready to be written.
#[derive(Debug, Clone)]
pub struct VisualReport {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageSummary>,
}

/// Render the QR/PDF document for every file id with present accounts.
pub fn render_visual_report(
    reconciliation: &Reconciliation,
    options: &QrOptions,
) -> Result<VisualReport, ReconError> {
    let mut pages = Vec::new();
    let mut summaries = Vec::new();

    for result in reconciliation {
        if result.present.is_empty() {
            debug!(file_id = %result.file_id, "No present accounts, skipping QR page");
            continue;
        }
        let chunks = chunk_payloads(&result.file_id, &result.present, options.max_payload_bytes)?;
        let parts = chunks.len();
        if parts > 1 {
            info!(file_id = %result.file_id, parts, "Present accounts split across several QR pages");
        }
        for (idx, payload) in chunks.iter().enumerate() {
            let matrix = encode(&result.file_id, payload, options.error_correction)?;
            let label = format!(
                "FILE NO: {} | Total Accounts: {}",
                result.file_id,
                result.present.len()
            );
            let part = (parts > 1).then(|| format!("Part {} of {}", idx + 1, parts));
            pages.push(qr_page(&matrix, &label, part.as_deref()));
            summaries.push(PageSummary {
                file_id: result.file_id.clone(),
                part: idx + 1,
                parts,
                accounts: payload.lines().count(),
            });
        }
    }

    if pages.is_empty() {
        warn!("No file id has present accounts; visual report holds a placeholder page");
        pages.push(placeholder_page());
    }

    let mut doc = PdfDocument::new("Account QR codes");
    doc.with_pages(pages);
    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "PDF serialisation produced warnings");
    }

    info!(pages = summaries.len(), bytes = bytes.len(), "Rendered visual report");
    Ok(VisualReport {
        bytes,
        pages: summaries,
    })
}

/// Render and atomically write the visual report to `path`.
pub fn emit_visual_report(
    reconciliation: &Reconciliation,
    path: &Path,
    options: &QrOptions,
) -> Result<VisualReport, ReconError> {
    let report = render_visual_report(reconciliation, options)?;
    write_atomically(path, &report.bytes)?;
    info!(path = %path.display(), "Visual report written");
    Ok(report)
}

fn page_size_pt() -> (f32, f32) {
    (Pt::from(Mm(PAGE_WIDTH_MM)).0, Pt::from(Mm(PAGE_HEIGHT_MM)).0)
}

fn qr_page(matrix: &QrMatrix, label: &str, part: Option<&str>) -> PdfPage {
    let (page_w, page_h) = page_size_pt();
    let reserved = 2.0 * (LABEL_SIZE_PT + LABEL_GAP_PT);
    let side = (page_h - 2.0 * MARGIN_PT - reserved).min(page_w - 2.0 * MARGIN_PT);
    let left = (page_w - side) / 2.0;
    let bottom = (page_h - side) / 2.0;

    let mut ops = Vec::new();
    ops.extend(qr_ops(matrix, left, bottom, side));
    ops.extend(centered_text(label, page_w, bottom + side + LABEL_GAP_PT));
    if let Some(part) = part {
        ops.extend(centered_text(part, page_w, bottom - LABEL_GAP_PT - LABEL_SIZE_PT));
    }
    PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
}

fn placeholder_page() -> PdfPage {
    let (page_w, page_h) = page_size_pt();
    let ops = centered_text("No accounts present", page_w, page_h / 2.0);
    PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
}

/// Dark modules as one polygon; rings don't overlap, so non-zero winding fills each.
fn qr_ops(matrix: &QrMatrix, left: f32, bottom: f32, side: f32) -> Vec<Op> {
    let modules = matrix.width() + 2 * QUIET_ZONE_MODULES;
    let module = side / modules as f32;
    let origin_x = left + QUIET_ZONE_MODULES as f32 * module;
    let top = bottom + side - QUIET_ZONE_MODULES as f32 * module;

    let mut rings = Vec::new();
    for y in 0..matrix.width() {
        let y1 = top - y as f32 * module;
        let y0 = y1 - module;
        for (x, len) in matrix.dark_runs(y) {
            let x0 = origin_x + x as f32 * module;
            let x1 = x0 + len as f32 * module;
            rings.push(PolygonRing {
                points: vec![corner(x0, y0), corner(x1, y0), corner(x1, y1), corner(x0, y1)],
            });
        }
    }

    vec![
        Op::SaveGraphicsState,
        Op::SetFillColor { col: black() },
        Op::DrawPolygon {
            polygon: Polygon {
                rings,
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        },
        Op::RestoreGraphicsState,
    ]
}

fn corner(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn black() -> Color {
    Color::Rgb(Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        icc_profile: None,
    })
}

/// Helvetica averages roughly half an em per glyph; good enough to center a label.
fn centered_text(text: &str, page_w: f32, baseline: f32) -> Vec<Op> {
    let approx_width = text.chars().count() as f32 * LABEL_SIZE_PT * 0.5;
    let x = ((page_w - approx_width) / 2.0).max(MARGIN_PT);
    vec![
        Op::StartTextSection,
        Op::SetFillColor { col: black() },
        Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(baseline) },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(LABEL_SIZE_PT),
            font: BuiltinFont::Helvetica,
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font: BuiltinFont::Helvetica,
        },
        Op::EndTextSection,
    ]
}
