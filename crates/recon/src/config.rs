use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Fixed constants
// ---------------------------------------------------------------------------
// The column sets, link template and output file naming are part of the
// report format, not runtime configuration.

/// Header row of the rendered transactions table, in column order.
pub const TXN_TABLE_COLUMNS: [&str; 12] = [
    "Transaction Date",
    "Payment Reference ID",
    "Transaction Type",
    "Currency",
    "Payment Amount",
    "Account Group",
    "Card", // derived: Payment Instrument Type + Payment Identifier
    "Account User",
    "Order Date",
    "Order ID",
    "PO Number",
    "Order Status",
];

/// Header row of the rendered returns table (information rows).
pub const RETURN_INFO_COLUMNS: [&str; 9] = [
    "Order Date",
    "Order Id",
    "Account Group",
    "PO Number",
    "Account User",
    "Return Date",
    "Return Reason",
    "Return Quantity",
    "ASIN",
];

/// Display-only link to the payment provider's transaction view. Never
/// fetched by this program.
pub const URL_TEMPLATE: &str =
    "https://www.amazon.com/cpe/yourpayments/transactions?transactionTag={order_id}&ref_=ppx_od_dt_b_yt";

/// Miss report file name, written into the output directory.
pub const MISS_REPORT_FILE: &str = "missing_summary_pdfs.csv";

pub fn transaction_link(order_id: &str) -> String {
    URL_TEMPLATE.replace("{order_id}", order_id)
}

pub fn combined_file_name(order_id: &str) -> String {
    format!("Amazon_{order_id}_combined.pdf")
}

pub fn supplement_file_name(order_id: &str) -> String {
    format!("{order_id}_transactions.pdf")
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub transactions_csv: PathBuf,
    pub returns_csv: PathBuf,
    pub summary_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub mode: ModeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
    /// When set, only the first `max_orders` groups are processed.
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default = "default_max_orders")]
    pub max_orders: usize,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self { test_mode: false, max_orders: default_max_orders() }
    }
}

fn default_max_orders() -> usize {
    5
}

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (name, path) in [
            ("transactions_csv", &self.transactions_csv),
            ("returns_csv", &self.returns_csv),
            ("summary_dir", &self.summary_dir),
            ("output_dir", &self.output_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{name} must not be empty")));
            }
        }

        if self.mode.test_mode && self.mode.max_orders == 0 {
            return Err(ReconError::ConfigValidation(
                "max_orders must be at least 1 in test mode".into(),
            ));
        }

        Ok(())
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.transactions_csv,
            &mut self.returns_csv,
            &mut self.summary_dir,
            &mut self.output_dir,
        ] {
            if path.is_relative() {
                let joined = base.join(path.as_path());
                *path = joined;
            }
        }
    }

    /// Cap on processed order groups; `None` outside test mode.
    pub fn order_cap(&self) -> Option<usize> {
        self.mode.test_mode.then_some(self.mode.max_orders)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
