//! Spreadsheet loader: reads declared account intervals from the first sheet
//! of a workbook (xlsx, xlsm, xls, xlsb, ods).
//!
//! The first non-empty row is the header. Columns are located by name (trimmed,
//! case-insensitive), so column order in the sheet does not matter.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, error, info, warn};

use crate::config::ColumnNames;
use crate::contract::{AccountInterval, IntervalLoader, ReconError};

const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Production [`IntervalLoader`] backed by calamine.
pub struct SpreadsheetLoader {
    columns: ColumnNames,
}

impl SpreadsheetLoader {
    pub fn new(columns: ColumnNames) -> Self {
        Self { columns }
    }
}

impl Default for SpreadsheetLoader {
    fn default() -> Self {
        Self::new(ColumnNames::default())
    }
}

impl IntervalLoader for SpreadsheetLoader {
    fn load(&self, path: &Path) -> Result<Vec<AccountInterval>, ReconError> {
        let path = if path.is_dir() {
            find_spreadsheet(path)?
        } else {
            path.to_path_buf()
        };
        load_intervals(&path, &self.columns)
    }
}

/// Return the first `.xlsx` file in `dir`, ordered by file name.
pub fn find_spreadsheet(dir: &Path) -> Result<PathBuf, ReconError> {
    debug!(dir = %dir.display(), "Searching directory for spreadsheet");
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_extension(p, &["xlsx"]))
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(found) => {
            info!(path = %found.display(), "Found spreadsheet in directory");
            Ok(found)
        }
        None => {
            error!(dir = %dir.display(), "No .xlsx file found in directory");
            Err(ReconError::FileNotFound(dir.to_path_buf()))
        }
    }
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Read all intervals from the first sheet of the workbook at `path`.
pub fn load_intervals(path: &Path, columns: &ColumnNames) -> Result<Vec<AccountInterval>, ReconError> {
    if !path.is_file() || !has_extension(path, SUPPORTED_EXTENSIONS) {
        error!(path = %path.display(), "Spreadsheet missing or not a supported workbook");
        return Err(ReconError::FileNotFound(path.to_path_buf()));
    }
    info!(path = %path.display(), "Loading account intervals from spreadsheet");

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        error!(error = %e, path = %path.display(), "Failed to open workbook");
        ReconError::Spreadsheet(e.to_string())
    })?;
    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            error!(error = %e, "Failed to read first sheet");
            return Err(ReconError::Spreadsheet(e.to_string()));
        }
        None => {
            error!(path = %path.display(), "Workbook contains no sheets");
            return Err(ReconError::Spreadsheet("workbook contains no sheets".into()));
        }
    };

    // Sheet rows are reported 1-based, as a spreadsheet user sees them.
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0) + 1;
    let mut rows = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| (first_row + idx, cells))
        .filter(|(_, cells)| !is_blank_row(cells));

    let Some((header_row, header)) = rows.next() else {
        warn!(path = %path.display(), "Spreadsheet has no rows");
        return Ok(Vec::new());
    };
    let layout = HeaderLayout::locate(header_row, header, columns)?;

    let mut intervals = Vec::new();
    for (row, cells) in rows {
        let interval = layout.read_row(row, cells)?;
        debug!(row, file_id = %interval.file_id, start = interval.start, end = interval.end, "Read interval");
        intervals.push(interval);
    }

    info!(count = intervals.len(), "Loaded account intervals");
    Ok(intervals)
}

fn is_blank_row(cells: &[Data]) -> bool {
    cells.iter().all(|c| match c {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

struct HeaderLayout<'a> {
    columns: &'a ColumnNames,
    file_id: usize,
    start: usize,
    end: usize,
}

impl<'a> HeaderLayout<'a> {
    fn locate(row: usize, header: &[Data], columns: &'a ColumnNames) -> Result<Self, ReconError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| matches!(cell, Data::String(s) if s.trim().eq_ignore_ascii_case(name.trim())))
                .ok_or_else(|| {
                    error!(row, column = name, "Header is missing a required column");
                    ReconError::MalformedRow {
                        row,
                        reason: format!("header has no `{name}` column"),
                    }
                })
        };
        Ok(Self {
            columns,
            file_id: find(&columns.file_id)?,
            start: find(&columns.start)?,
            end: find(&columns.end)?,
        })
    }

    fn read_row(&self, row: usize, cells: &[Data]) -> Result<AccountInterval, ReconError> {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&Data::Empty);

        let file_id = cell_file_id(cell(self.file_id), row, &self.columns.file_id)?;
        let start = cell_integer(cell(self.start), row, &self.columns.start)?;
        let end = cell_integer(cell(self.end), row, &self.columns.end)?;

        Ok(AccountInterval { file_id, start, end })
    }
}

fn malformed(row: usize, reason: String) -> ReconError {
    error!(row, reason = %reason, "Malformed spreadsheet row");
    ReconError::MalformedRow { row, reason }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn cell_file_id(cell: &Data, row: usize, column: &str) -> Result<String, ReconError> {
    match cell {
        Data::Empty => Err(malformed(row, format!("missing `{column}`"))),
        Data::String(s) if s.trim().is_empty() => Err(malformed(row, format!("missing `{column}`"))),
        other => cell_text(other)
            .ok_or_else(|| malformed(row, format!("`{column}` has an unsupported cell type: {other:?}"))),
    }
}

fn cell_integer(cell: &Data, row: usize, column: &str) -> Result<i64, ReconError> {
    match cell {
        Data::Int(n) => Ok(*n),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(*f as i64),
        Data::String(s) if !s.trim().is_empty() => s
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(row, format!("`{column}` is not an integer: {s:?}"))),
        Data::Empty => Err(malformed(row, format!("missing `{column}`"))),
        Data::String(_) => Err(malformed(row, format!("missing `{column}`"))),
        other => Err(malformed(row, format!("`{column}` is not an integer: {other:?}"))),
    }
}
