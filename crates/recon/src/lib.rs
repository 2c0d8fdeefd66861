//! `orderpack-recon` — Order reconciliation packet engine.
//!
//! Joins an order's transaction rows and return rows onto the order's
//! externally-produced summary PDF: CSV ingest, order grouping, summary
//! lookup, supplemental page rendering, page-level merge, and the run loop
//! that accounts for misses.

pub mod config;
pub mod error;
pub mod group;
pub mod ingest;
pub mod locate;
pub mod merge;
pub mod model;
pub mod render;
pub mod run;

pub use config::RunConfig;
pub use error::ReconError;
pub use model::{Located, OrderGroup, Outcome, ReturnRecord, RunSummary, TxnRecord};
pub use run::run;
