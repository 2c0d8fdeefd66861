//! The run loop: one pass over the order groups, combining each order's
//! summary PDF with its rendered supplemental page and accounting for every
//! order that produced no combined document.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{combined_file_name, supplement_file_name, RunConfig, MISS_REPORT_FILE};
use crate::error::ReconError;
use crate::model::{Located, OrderGroup, Outcome, ReturnRecord, RunSummary};
use crate::{group, ingest, locate, merge, render};

/// Process every order group per `config`. Progress goes to stdout; the
/// returned summary carries per-order outcomes and the miss-report path.
///
/// Input problems abort the run. Per-order render/merge failures are caught
/// here, logged, and recorded, so one bad order never blocks the batch.
pub fn run(config: &RunConfig) -> Result<RunSummary, ReconError> {
    let txns = ingest::load_transactions(&config.transactions_csv)?;
    let returns = ingest::load_returns(&config.returns_csv)?;

    fs::create_dir_all(&config.output_dir).map_err(|e| {
        ReconError::Io(format!("cannot create {}: {e}", config.output_dir.display()))
    })?;

    let groups = group::group_by_order(&txns);
    let cap = config.order_cap().unwrap_or(groups.len());

    let mut summary = RunSummary::default();
    for order_group in groups.iter().take(cap) {
        let order_id = order_group.order_id.as_str();
        println!("Processing Order ID {order_id}...");

        let outcome = match locate::find_summary(&config.summary_dir, order_id)? {
            Located::NotFound => {
                println!("  !! No summary PDF found for {order_id}");
                Outcome::Missing
            }
            Located::Ambiguous(matches) => {
                println!(
                    "  !! {} summary PDFs match {order_id}; skipped as ambiguous",
                    matches.len()
                );
                Outcome::Ambiguous { matches: matches.len() }
            }
            Located::Unique(summary_pdf) => {
                match combine_order(config, order_group, &returns, &summary_pdf) {
                    Ok(out_pdf) => {
                        println!("  ✔ Output written: {}", out_pdf.display());
                        Outcome::Combined
                    }
                    Err(e @ (ReconError::Render(_) | ReconError::Merge(_))) => {
                        println!("  !! {order_id} not combined: {e}");
                        Outcome::Failed { reason: e.to_string() }
                    }
                    Err(e) => return Err(e),
                }
            }
        };
        summary.record(order_group.order_id.clone(), outcome);
    }

    if summary.has_unprocessed() {
        let report_path = config.output_dir.join(MISS_REPORT_FILE);
        write_miss_report(&report_path, summary.unprocessed())?;
        println!("\n⚠ Missing summary PDFs exported to: {}", report_path.display());
        summary.miss_report = Some(report_path);
    } else {
        println!("\nAll summary PDFs found.");
    }

    Ok(summary)
}

/// Render the supplemental page to a temp file and append it onto the
/// summary. The temp file is removed by the guard, merge outcome
/// notwithstanding.
fn combine_order(
    config: &RunConfig,
    order_group: &OrderGroup,
    returns: &[ReturnRecord],
    summary_pdf: &Path,
) -> Result<PathBuf, ReconError> {
    let temp = TempPage::new(config.output_dir.join(supplement_file_name(&order_group.order_id)));
    render::render_supplement(order_group, returns, temp.path())?;

    let out_pdf = config.output_dir.join(combined_file_name(&order_group.order_id));
    merge::append_pages(summary_pdf, temp.path(), &out_pdf)?;
    Ok(out_pdf)
}

/// Scoped supplemental page file.
struct TempPage {
    path: PathBuf,
}

impl TempPage {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempPage {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Single-column CSV of the unprocessed order identifiers.
fn write_miss_report<'a>(
    path: &Path,
    order_ids: impl Iterator<Item = &'a str>,
) -> Result<(), ReconError> {
    let report_err = |e: csv::Error| ReconError::Report {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
    writer.write_record(["Order ID"]).map_err(report_err)?;
    for order_id in order_ids {
        writer.write_record([order_id]).map_err(report_err)?;
    }
    writer.flush().map_err(|e| ReconError::Report {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(())
}
