//! Input loading: the transactions table and the returns table.
//!
//! Every field is text; absent cells normalize to the empty string. The two
//! exports disagree on the spelling of the join key (`Order ID` in the
//! transactions file, `Order Id` in the returns file) — both resolve to the
//! same `order_id` model field via the named constants below.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ReconError;
use crate::model::{DateField, ReturnRecord, TxnRecord};

// Transactions table headers.
const COL_TXN_DATE: &str = "Transaction Date";
const COL_PAYMENT_REF: &str = "Payment Reference ID";
const COL_TXN_TYPE: &str = "Transaction Type";
const COL_CURRENCY: &str = "Currency";
const COL_AMOUNT: &str = "Payment Amount";
const COL_ACCOUNT_GROUP: &str = "Account Group";
const COL_INSTRUMENT_TYPE: &str = "Payment Instrument Type";
const COL_PAYMENT_IDENT: &str = "Payment Identifier";
const COL_ACCOUNT_USER: &str = "Account User";
const COL_ORDER_DATE: &str = "Order Date";
/// Join key as spelled in the transactions export.
pub const COL_TXN_ORDER_ID: &str = "Order ID";
const COL_PO_NUMBER: &str = "PO Number";
const COL_ORDER_STATUS: &str = "Order Status";

// Returns table headers.
/// Join key as spelled in the returns export.
pub const COL_RET_ORDER_ID: &str = "Order Id";
const COL_RETURN_DATE: &str = "Return Date";
const COL_RETURN_REASON: &str = "Return Reason";
const COL_RETURN_QTY: &str = "Return Quantity";
const COL_ASIN: &str = "ASIN";
const COL_TITLE: &str = "Title";

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

// The exports mix plain dates and timestamps depending on the report window.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Lenient date-cell parse. On success the display string is the canonical
/// `YYYY-MM-DD` form; on failure the raw text is kept and the row sorts
/// after every dated row.
fn parse_date_cell(raw: &str) -> DateField {
    let trimmed = raw.trim();
    let parsed = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        });

    match parsed {
        Some(date) => DateField {
            parsed: Some(date),
            display: date.format("%Y-%m-%d").to_string(),
        },
        None => DateField { parsed: None, display: raw.to_string() },
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and parse the transactions table, sorted ascending by transaction
/// date. A missing or unreadable file aborts the run.
pub fn load_transactions(path: &Path) -> Result<Vec<TxnRecord>, ReconError> {
    let data = fs::read_to_string(path).map_err(|e| ReconError::InputUnavailable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    parse_transactions(&data)
}

/// Read and parse the returns table, sorted ascending by return date.
pub fn load_returns(path: &Path) -> Result<Vec<ReturnRecord>, ReconError> {
    let data = fs::read_to_string(path).map_err(|e| ReconError::InputUnavailable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    parse_returns(&data)
}

pub fn parse_transactions(csv_data: &str) -> Result<Vec<TxnRecord>, ReconError> {
    const TABLE: &str = "transactions";

    let mut reader = csv_reader(csv_data);
    let headers = header_row(&mut reader, TABLE)?;
    let idx = |name: &str| column_index(&headers, TABLE, name);

    let txn_date_idx = idx(COL_TXN_DATE)?;
    let payment_ref_idx = idx(COL_PAYMENT_REF)?;
    let txn_type_idx = idx(COL_TXN_TYPE)?;
    let currency_idx = idx(COL_CURRENCY)?;
    let amount_idx = idx(COL_AMOUNT)?;
    let account_group_idx = idx(COL_ACCOUNT_GROUP)?;
    let instrument_idx = idx(COL_INSTRUMENT_TYPE)?;
    let payment_ident_idx = idx(COL_PAYMENT_IDENT)?;
    let account_user_idx = idx(COL_ACCOUNT_USER)?;
    let order_date_idx = idx(COL_ORDER_DATE)?;
    let order_id_idx = idx(COL_TXN_ORDER_ID)?;
    let po_number_idx = idx(COL_PO_NUMBER)?;
    let order_status_idx = idx(COL_ORDER_STATUS)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::InputMalformed {
            table: TABLE,
            detail: e.to_string(),
        })?;
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();

        let instrument = cell(instrument_idx);
        let ident = cell(payment_ident_idx);

        rows.push(TxnRecord {
            txn_date: parse_date_cell(&cell(txn_date_idx)),
            payment_ref: cell(payment_ref_idx),
            txn_type: cell(txn_type_idx),
            currency: cell(currency_idx),
            amount: cell(amount_idx),
            account_group: cell(account_group_idx),
            card: format!("{instrument} {ident}").trim().to_string(),
            account_user: cell(account_user_idx),
            order_date: cell(order_date_idx),
            order_id: cell(order_id_idx),
            po_number: cell(po_number_idx),
            order_status: cell(order_status_idx),
        });
    }

    rows.sort_by_key(|r| r.txn_date.sort_key());
    Ok(rows)
}

pub fn parse_returns(csv_data: &str) -> Result<Vec<ReturnRecord>, ReconError> {
    const TABLE: &str = "returns";

    let mut reader = csv_reader(csv_data);
    let headers = header_row(&mut reader, TABLE)?;
    let idx = |name: &str| column_index(&headers, TABLE, name);

    let order_date_idx = idx(COL_ORDER_DATE)?;
    let order_id_idx = idx(COL_RET_ORDER_ID)?;
    let account_group_idx = idx(COL_ACCOUNT_GROUP)?;
    let po_number_idx = idx(COL_PO_NUMBER)?;
    let account_user_idx = idx(COL_ACCOUNT_USER)?;
    let return_date_idx = idx(COL_RETURN_DATE)?;
    let return_reason_idx = idx(COL_RETURN_REASON)?;
    let return_qty_idx = idx(COL_RETURN_QTY)?;
    let asin_idx = idx(COL_ASIN)?;
    let title_idx = idx(COL_TITLE)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::InputMalformed {
            table: TABLE,
            detail: e.to_string(),
        })?;
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();

        rows.push(ReturnRecord {
            order_date: cell(order_date_idx),
            order_id: cell(order_id_idx),
            account_group: cell(account_group_idx),
            po_number: cell(po_number_idx),
            account_user: cell(account_user_idx),
            return_date: parse_date_cell(&cell(return_date_idx)),
            return_reason: cell(return_reason_idx),
            return_quantity: cell(return_qty_idx),
            asin: cell(asin_idx),
            title: cell(title_idx),
        });
    }

    rows.sort_by_key(|r| r.return_date.sort_key());
    Ok(rows)
}

fn csv_reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
}

fn header_row(
    reader: &mut csv::Reader<&[u8]>,
    table: &'static str,
) -> Result<Vec<String>, ReconError> {
    Ok(reader
        .headers()
        .map_err(|e| ReconError::InputMalformed { table, detail: e.to_string() })?
        .iter()
        .map(|h| h.to_string())
        .collect())
}

fn column_index(
    headers: &[String],
    table: &'static str,
    name: &str,
) -> Result<usize, ReconError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReconError::MissingColumn { table, column: name.into() })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TXN_HEADER: &str = "Transaction Date,Payment Reference ID,Transaction Type,Currency,Payment Amount,Account Group,Payment Instrument Type,Payment Identifier,Account User,Order Date,Order ID,PO Number,Order Status";
    const RET_HEADER: &str = "Order Date,Order Id,Account Group,PO Number,Account User,Return Date,Return Reason,Return Quantity,ASIN,Title";

    #[test]
    fn parse_transactions_basic() {
        let csv = format!(
            "{TXN_HEADER}\n\
             2025-03-02,P-2,Charge,USD,10.00,Main,Visa,1234,alice,2025-03-01,111,PO-1,Closed\n\
             2025-03-01,P-1,Charge,USD,5.00,Main,Visa,1234,alice,2025-03-01,111,PO-1,Closed\n"
        );
        let rows = parse_transactions(&csv).unwrap();
        assert_eq!(rows.len(), 2);
        // Sorted ascending by transaction date.
        assert_eq!(rows[0].payment_ref, "P-1");
        assert_eq!(rows[1].payment_ref, "P-2");
        assert_eq!(rows[0].card, "Visa 1234");
        assert_eq!(rows[0].order_id, "111");
    }

    #[test]
    fn card_field_trims_absent_parts() {
        let csv = format!(
            "{TXN_HEADER}\n\
             2025-03-01,P-1,Charge,USD,5.00,Main,,1234,alice,2025-03-01,111,PO-1,Closed\n\
             2025-03-01,P-2,Charge,USD,5.00,Main,Visa,,alice,2025-03-01,111,PO-1,Closed\n\
             2025-03-01,P-3,Charge,USD,5.00,Main,,,alice,2025-03-01,111,PO-1,Closed\n"
        );
        let rows = parse_transactions(&csv).unwrap();
        assert_eq!(rows[0].card, "1234");
        assert_eq!(rows[1].card, "Visa");
        assert_eq!(rows[2].card, "");
    }

    #[test]
    fn unparseable_date_keeps_row_and_sorts_last() {
        let csv = format!(
            "{TXN_HEADER}\n\
             soon,P-odd,Charge,USD,1.00,Main,Visa,1,alice,2025-03-01,111,PO-1,Closed\n\
             2025-03-05,P-late,Charge,USD,1.00,Main,Visa,1,alice,2025-03-01,111,PO-1,Closed\n\
             2025-03-01,P-early,Charge,USD,1.00,Main,Visa,1,alice,2025-03-01,111,PO-1,Closed\n"
        );
        let rows = parse_transactions(&csv).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].payment_ref, "P-early");
        assert_eq!(rows[1].payment_ref, "P-late");
        assert_eq!(rows[2].payment_ref, "P-odd");
        assert_eq!(rows[2].txn_date.parsed, None);
        assert_eq!(rows[2].txn_date.display, "soon");
    }

    #[test]
    fn timestamp_and_us_dates_canonicalize() {
        let csv = format!(
            "{TXN_HEADER}\n\
             2025-03-01 14:22:05,P-1,Charge,USD,1.00,Main,Visa,1,alice,2025-03-01,111,PO-1,Closed\n\
             03/02/2025,P-2,Charge,USD,1.00,Main,Visa,1,alice,2025-03-01,111,PO-1,Closed\n"
        );
        let rows = parse_transactions(&csv).unwrap();
        assert_eq!(rows[0].txn_date.display, "2025-03-01");
        assert_eq!(rows[1].txn_date.display, "2025-03-02");
    }

    #[test]
    fn short_rows_normalize_to_empty() {
        let csv = format!("{TXN_HEADER}\n2025-03-01,P-1,Charge\n");
        let rows = parse_transactions(&csv).unwrap();
        assert_eq!(rows[0].currency, "");
        assert_eq!(rows[0].order_id, "");
        assert_eq!(rows[0].card, "");
    }

    #[test]
    fn parse_returns_uses_alias_join_key() {
        let csv = format!(
            "{RET_HEADER}\n\
             2025-03-01,111,Main,PO-1,alice,2025-03-10,Defective,1,B000TEST01,Widget\n"
        );
        let rows = parse_returns(&csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, "111");
        assert_eq!(rows[0].title, "Widget");
        assert_eq!(rows[0].return_date.display, "2025-03-10");
    }

    #[test]
    fn returns_sort_by_return_date() {
        let csv = format!(
            "{RET_HEADER}\n\
             2025-03-01,111,Main,PO-1,alice,2025-03-12,Defective,1,B000TEST02,Late\n\
             2025-03-01,111,Main,PO-1,alice,2025-03-10,Defective,1,B000TEST01,Early\n"
        );
        let rows = parse_returns(&csv).unwrap();
        assert_eq!(rows[0].title, "Early");
        assert_eq!(rows[1].title, "Late");
    }

    #[test]
    fn missing_join_column_is_reported() {
        let csv = "Transaction Date,Payment Reference ID\n2025-03-01,P-1\n";
        let err = parse_transactions(csv).unwrap_err();
        assert!(err.to_string().contains("Transaction Type"));
    }

    #[test]
    fn missing_file_is_input_unavailable() {
        let err = load_transactions(Path::new("/nonexistent/transactions.csv")).unwrap_err();
        assert!(matches!(err, ReconError::InputUnavailable { .. }));
    }
}
