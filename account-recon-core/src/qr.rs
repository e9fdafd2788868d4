//! QR payload chunking and encoding.
//!
//! A file id's present accounts are joined with `\n`. When the joined list is
//! longer than the payload budget it is split greedily, in account order, into
//! the fewest consecutive chunks that each fit the budget.

use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

use crate::config::ErrorCorrection;
use crate::contract::ReconError;

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Split `accounts` into newline-joined payloads of at most `max_bytes` each.
pub fn chunk_payloads(
    file_id: &str,
    accounts: &[String],
    max_bytes: usize,
) -> Result<Vec<String>, ReconError> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for account in accounts {
        if account.len() > max_bytes {
            return Err(ReconError::Encoding {
                file_id: file_id.to_string(),
                reason: format!(
                    "account {account} is {} bytes, over the {max_bytes}-byte payload limit",
                    account.len()
                ),
            });
        }
        let needed = if current.is_empty() {
            account.len()
        } else {
            current.len() + 1 + account.len()
        };
        if needed > max_bytes {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(account);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

/// Square module grid of an encoded QR symbol, row-major, `true` for dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x]
    }

    /// Horizontal runs of dark modules in `row` as `(first_x, len)`.
    pub fn dark_runs(&self, row: usize) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut x = 0;
        while x < self.width {
            if self.is_dark(x, row) {
                let start = x;
                while x < self.width && self.is_dark(x, row) {
                    x += 1;
                }
                runs.push((start, x - start));
            } else {
                x += 1;
            }
        }
        runs
    }
}

/// Encode one payload at the given error-correction level.
pub fn encode(file_id: &str, payload: &str, level: ErrorCorrection) -> Result<QrMatrix, ReconError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), level.into()).map_err(|e| {
        let reason = match e {
            QrError::DataTooLong => format!("{} bytes exceed QR capacity at level {level:?}", payload.len()),
            other => other.to_string(),
        };
        ReconError::Encoding {
            file_id: file_id.to_string(),
            reason,
        }
    })?;
    let modules = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    Ok(QrMatrix {
        width: code.width(),
        modules,
    })
}
