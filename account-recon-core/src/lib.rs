#![doc = "account-recon-core: core logic library for account-recon."]

//! This crate holds the reconciliation pipeline: range expansion, spreadsheet
//! loading, the account-store client, the reconciler and both report emitters.
//!
//! # Usage
//! Call [`pipeline::run_pipeline`] with an [`contract::IntervalLoader`] and an
//! [`contract::AccountSource`]; production implementations are
//! [`spreadsheet::SpreadsheetLoader`] and [`account_source::SqlAccountSource`].

pub mod account_source;
pub mod config;
pub mod contract;
pub mod missing_report;
pub mod output;
pub mod pipeline;
pub mod qr;
pub mod range;
pub mod reconcile;
pub mod spreadsheet;
pub mod visual_report;
