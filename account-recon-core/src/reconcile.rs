//! Reconciler: partitions each declared interval into present and missing
//! accounts and groups the results by file id.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::contract::{AccountInterval, InvalidRangeError, ReconciliationResult};
use crate::range::{describe_range, expand};

/// An interval that could not be expanded and was left out of the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedInterval {
    pub interval: AccountInterval,
    pub error: InvalidRangeError,
}

/// Results keyed by file id, in order of each file id's first appearance.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    results: Vec<ReconciliationResult>,
    index: HashMap<String, usize>,
    rejected: Vec<RejectedInterval>,
}

/// Totals across a reconciliation, for the closing log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconciliationSummary {
    pub file_ids: usize,
    pub expected: u64,
    pub present: u64,
    pub missing: u64,
    pub rejected: usize,
}

impl Reconciliation {
    /// Insert a result; a later result for the same file id replaces the
    /// earlier one in place.
    fn record(&mut self, result: ReconciliationResult) {
        match self.index.get(&result.file_id) {
            Some(&pos) => {
                warn!(
                    file_id = %result.file_id,
                    "Duplicate FILE NO: later interval replaces the earlier result"
                );
                self.results[pos] = result;
            }
            None => {
                self.index.insert(result.file_id.clone(), self.results.len());
                self.results.push(result);
            }
        }
    }

    pub fn get(&self, file_id: &str) -> Option<&ReconciliationResult> {
        self.index.get(file_id).map(|&pos| &self.results[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReconciliationResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn rejected(&self) -> &[RejectedInterval] {
        &self.rejected
    }

    pub fn summary(&self) -> ReconciliationSummary {
        self.results.iter().fold(
            ReconciliationSummary {
                rejected: self.rejected.len(),
                ..Default::default()
            },
            |mut acc, r| {
                acc.file_ids += 1;
                acc.expected += r.total_expected;
                acc.present += r.present.len() as u64;
                acc.missing += r.missing.len() as u64;
                acc
            },
        )
    }
}

impl<'a> IntoIterator for &'a Reconciliation {
    type Item = &'a ReconciliationResult;
    type IntoIter = std::slice::Iter<'a, ReconciliationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Reconcile every interval, in input order, against the known accounts.
///
/// Invalid intervals are skipped and listed in [`Reconciliation::rejected`];
/// the run continues with the remaining records.
pub fn reconcile(
    intervals: &[AccountInterval],
    known: &HashSet<String>,
    width: usize,
) -> Reconciliation {
    info!(intervals = intervals.len(), known = known.len(), "Reconciling intervals");
    let mut reconciliation = Reconciliation::default();

    for interval in intervals {
        let expected = match expand(interval.start, interval.end, width) {
            Ok(expected) => expected,
            Err(error) => {
                warn!(file_id = %interval.file_id, error = %error, "Skipping invalid interval");
                reconciliation.rejected.push(RejectedInterval {
                    interval: interval.clone(),
                    error,
                });
                continue;
            }
        };

        let total_expected = expected.len() as u64;
        let (present, missing): (Vec<String>, Vec<String>) =
            expected.into_iter().partition(|account| known.contains(account));

        debug!(
            file_id = %interval.file_id,
            range = %describe_range(interval, width),
            present = present.len(),
            missing = missing.len(),
            "Reconciled interval"
        );

        reconciliation.record(ReconciliationResult {
            file_id: interval.file_id.clone(),
            interval: interval.clone(),
            present,
            missing,
            total_expected,
        });
    }

    let summary = reconciliation.summary();
    info!(
        file_ids = summary.file_ids,
        expected = summary.expected,
        present = summary.present,
        missing = summary.missing,
        rejected = summary.rejected,
        "Reconciliation complete"
    );
    reconciliation
}
