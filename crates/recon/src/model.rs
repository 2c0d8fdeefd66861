use std::path::PathBuf;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Date handling
// ---------------------------------------------------------------------------

/// A date column value: the parsed date when the cell was parseable, plus
/// the string the renderer displays.
///
/// Parse failure keeps the row — `parsed` stays `None`, `display` stays the
/// raw cell text, and the row sorts after every dated row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateField {
    pub parsed: Option<NaiveDate>,
    pub display: String,
}

impl DateField {
    /// Ascending sort key: dated rows first in date order, undated rows last.
    pub fn sort_key(&self) -> (bool, Option<NaiveDate>) {
        (self.parsed.is_none(), self.parsed)
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One row of the transactions table. All fields are carried as text;
/// absent cells are empty strings.
#[derive(Debug, Clone)]
pub struct TxnRecord {
    pub txn_date: DateField,
    pub payment_ref: String,
    pub txn_type: String,
    pub currency: String,
    pub amount: String,
    pub account_group: String,
    /// Derived display field: payment instrument type and payment
    /// identifier joined by one space, then trimmed.
    pub card: String,
    pub account_user: String,
    pub order_date: String,
    pub order_id: String,
    pub po_number: String,
    pub order_status: String,
}

/// One row of the returns table.
#[derive(Debug, Clone)]
pub struct ReturnRecord {
    pub order_date: String,
    pub order_id: String,
    pub account_group: String,
    pub po_number: String,
    pub account_user: String,
    pub return_date: DateField,
    pub return_reason: String,
    pub return_quantity: String,
    pub asin: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// All transactions sharing one order identifier, in the loader's
/// date-ascending order. Returns are looked up separately by the same key.
#[derive(Debug, Clone)]
pub struct OrderGroup {
    pub order_id: String,
    pub txns: Vec<TxnRecord>,
}

// ---------------------------------------------------------------------------
// Summary lookup
// ---------------------------------------------------------------------------

/// Outcome of a summary lookup in the summary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Exactly one file name contains the order identifier.
    Unique(PathBuf),
    /// No file name contains the order identifier.
    NotFound,
    /// More than one file name matches; the list is sorted by file name.
    Ambiguous(Vec<PathBuf>),
}

// ---------------------------------------------------------------------------
// Run accounting
// ---------------------------------------------------------------------------

/// Per-order processing outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Combined document written.
    Combined,
    /// No summary file matched the order identifier.
    Missing,
    /// More than one summary file matched; the order was skipped.
    Ambiguous { matches: usize },
    /// Render or merge failed; the error text is kept for the log.
    Failed { reason: String },
}

impl Outcome {
    pub fn is_combined(&self) -> bool {
        matches!(self, Self::Combined)
    }
}

/// Accounting for one full run: every processed order identifier with its
/// outcome, in processing order, plus counts per outcome.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub orders: Vec<(String, Outcome)>,
    pub combined: usize,
    pub missing: usize,
    pub ambiguous: usize,
    pub failed: usize,
    /// Path of the miss report, when one was written.
    pub miss_report: Option<PathBuf>,
}

impl RunSummary {
    pub fn record(&mut self, order_id: String, outcome: Outcome) {
        match &outcome {
            Outcome::Combined => self.combined += 1,
            Outcome::Missing => self.missing += 1,
            Outcome::Ambiguous { .. } => self.ambiguous += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        self.orders.push((order_id, outcome));
    }

    /// Order identifiers that produced no combined document, in processing
    /// order. These are the rows of the miss report.
    pub fn unprocessed(&self) -> impl Iterator<Item = &str> {
        self.orders
            .iter()
            .filter(|(_, outcome)| !outcome.is_combined())
            .map(|(order_id, _)| order_id.as_str())
    }

    pub fn has_unprocessed(&self) -> bool {
        self.unprocessed().next().is_some()
    }
}
