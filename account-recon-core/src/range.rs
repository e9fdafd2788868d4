//! Expansion of inclusive account intervals into fixed-width account numbers.

use crate::contract::{AccountInterval, InvalidRangeError};

/// Width of account numbers in the observed format.
pub const DEFAULT_ACCOUNT_WIDTH: usize = 14;

/// Most accounts a single interval may expand to. Wider intervals are
/// rejected instead of being materialised.
pub const MAX_INTERVAL_LEN: u64 = 1_000_000;

/// Render a single account number, left-padded with `0` to `width`.
pub fn format_account(number: u64, width: usize) -> String {
    format!("{number:0width$}")
}

/// Expand the closed interval `[start, end]` into its ascending, zero-padded
/// account numbers.
pub fn expand(start: i64, end: i64, width: usize) -> Result<Vec<String>, InvalidRangeError> {
    let invalid = |reason: String| InvalidRangeError { start, end, reason };

    if start < 0 || end < 0 {
        return Err(invalid("bounds must be non-negative".into()));
    }
    if start > end {
        return Err(invalid("start is greater than end".into()));
    }
    let len = (end - start) as u64 + 1;
    if len > MAX_INTERVAL_LEN {
        return Err(invalid(format!(
            "interval spans {len} accounts, more than the limit of {MAX_INTERVAL_LEN}"
        )));
    }
    let digits = end.to_string().len();
    if digits > width {
        return Err(invalid(format!(
            "end has {digits} digits, wider than the account width {width}"
        )));
    }

    Ok((start as u64..=end as u64)
        .map(|n| format_account(n, width))
        .collect())
}

/// `first..last` rendering of an interval for log lines.
pub fn describe_range(interval: &AccountInterval, width: usize) -> String {
    if interval.start < 0 || interval.end < 0 {
        return format!("{}..{}", interval.start, interval.end);
    }
    format!(
        "{}..{}",
        format_account(interval.start as u64, width),
        format_account(interval.end as u64, width)
    )
}
