//! Supplemental page rendering.
//!
//! One PDF per order: a title line, the provider link, the 12-column
//! transactions table, and — only when the order has returns — the returns
//! table where every return occupies an information row plus a bold title
//! row spanning all columns.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    Actions, BuiltinFont, Color, IndirectFontRef, Line, LinkAnnotation, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon, Pt, Rect, Rgb,
};

use crate::config::{transaction_link, RETURN_INFO_COLUMNS, TXN_TABLE_COLUMNS};
use crate::error::ReconError;
use crate::model::{OrderGroup, ReturnRecord, TxnRecord};

// ---------------------------------------------------------------------------
// Layout constants (points)
// ---------------------------------------------------------------------------
// Landscape US Letter with a 40pt margin on all sides.

const PAGE_W: f32 = 792.0;
const PAGE_H: f32 = 612.0;
const MARGIN: f32 = 40.0;
const USABLE_W: f32 = PAGE_W - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 14.0;
const CELL_SIZE: f32 = 6.0;
const HEADER_LEADING: f32 = 6.0;
const ROW_H: f32 = 9.5;
const PAD_X: f32 = 2.0;
const PAD_Y: f32 = 1.0;
const GRID_W: f32 = 0.25;

// Width adjustments to the even 12-way split. The two pairs cancel, so the
// table total stays the usable width.
const WIDEN: f32 = 36.0;
const NARROW: f32 = 18.0;

// Positions inside TXN_TABLE_COLUMNS of the adjusted columns.
const IDX_TXN_DATE: usize = 0;
const IDX_PAYMENT_REF: usize = 1;
const IDX_ORDER_ID: usize = 9;
const IDX_ORDER_STATUS: usize = 11;

/// Transactions column widths: even split, then the four fixed adjustments.
fn txn_column_widths() -> [f32; 12] {
    let base = USABLE_W / TXN_TABLE_COLUMNS.len() as f32;
    let mut widths = [base; 12];
    widths[IDX_PAYMENT_REF] += WIDEN;
    widths[IDX_ORDER_ID] += WIDEN;
    widths[IDX_TXN_DATE] -= NARROW;
    widths[IDX_ORDER_STATUS] -= NARROW;
    widths
}

/// Returns columns: the transactions table's total width, split evenly.
/// Only the totals of the two tables line up, not individual columns.
fn return_column_widths(txn_widths: &[f32]) -> [f32; 9] {
    let total: f32 = txn_widths.iter().sum();
    [total / RETURN_INFO_COLUMNS.len() as f32; 9]
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the supplemental page document for one order to `out_path`.
/// Matching returns are selected from `returns` by order identifier; with
/// no matches the returns section is omitted entirely.
pub fn render_supplement(
    group: &OrderGroup,
    returns: &[ReturnRecord],
    out_path: &Path,
) -> Result<(), ReconError> {
    let order_id = group.order_id.as_str();
    let mut page = PageWriter::new(&format!("Transactions for Order ID {order_id}"))?;

    page.heading(&format!("Transactions for Order ID {order_id}"));
    page.spacer(4.0);
    page.link_line(&transaction_link(order_id));
    page.spacer(6.0);

    let txn_widths = txn_column_widths();
    page.header_row(&txn_widths, &TXN_TABLE_COLUMNS);
    for txn in &group.txns {
        page.data_row(&txn_widths, &txn_cells(txn));
    }

    let order_returns: Vec<&ReturnRecord> =
        returns.iter().filter(|r| r.order_id == order_id).collect();
    if !order_returns.is_empty() {
        page.spacer(6.0);
        page.heading(&format!("Returns for Order ID {order_id}"));
        page.spacer(4.0);

        let ret_widths = return_column_widths(&txn_widths);
        let total: f32 = ret_widths.iter().sum();
        page.header_row(&ret_widths, &RETURN_INFO_COLUMNS);
        for ret in &order_returns {
            page.data_row(&ret_widths, &return_cells(ret));
            page.span_row(total, &ret.title);
        }
    }

    page.save(out_path)
}

/// Cell values in TXN_TABLE_COLUMNS order.
fn txn_cells(txn: &TxnRecord) -> [String; 12] {
    [
        txn.txn_date.display.clone(),
        txn.payment_ref.clone(),
        txn.txn_type.clone(),
        txn.currency.clone(),
        txn.amount.clone(),
        txn.account_group.clone(),
        txn.card.clone(),
        txn.account_user.clone(),
        txn.order_date.clone(),
        txn.order_id.clone(),
        txn.po_number.clone(),
        txn.order_status.clone(),
    ]
}

/// Cell values in RETURN_INFO_COLUMNS order. The title is not here — it
/// gets its own spanning row.
fn return_cells(ret: &ReturnRecord) -> [String; 9] {
    [
        ret.order_date.clone(),
        ret.order_id.clone(),
        ret.account_group.clone(),
        ret.po_number.clone(),
        ret.account_user.clone(),
        ret.return_date.display.clone(),
        ret.return_reason.clone(),
        ret.return_quantity.clone(),
        ret.asin.clone(),
    ]
}

// ---------------------------------------------------------------------------
// Page writer
// ---------------------------------------------------------------------------

/// Cursor-style writer over a growing document. `y` is the top of the next
/// element, in points from the page bottom; crossing the bottom margin
/// starts a new page (header rows are not repeated on continuations).
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: f32,
}

impl PageWriter {
    fn new(doc_title: &str) -> Result<Self, ReconError> {
        let (doc, page, layer) = PdfDocument::new(doc_title, mm(PAGE_W), mm(PAGE_H), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self { doc, layer, font, font_bold, y: PAGE_H - MARGIN })
    }

    /// Start a new page when fewer than `needed` points remain.
    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN {
            let (page, layer) = self.doc.add_page(mm(PAGE_W), mm(PAGE_H), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_H - MARGIN;
        }
    }

    fn spacer(&mut self, points: f32) {
        self.y -= points;
    }

    fn heading(&mut self, text: &str) {
        self.ensure_room(TITLE_SIZE + 4.0);
        self.y -= TITLE_SIZE;
        self.layer
            .use_text(text, TITLE_SIZE, mm(MARGIN), mm(self.y), &self.font_bold);
    }

    /// The blue provider-link line. The URL is carried by a link
    /// annotation over the label; it is display-only and never fetched.
    fn link_line(&mut self, url: &str) {
        const LABEL: &str = "[LINK TO TRANSACTIONS]";
        self.ensure_room(CELL_SIZE + 4.0);
        self.y -= CELL_SIZE + 2.0;
        self.layer.set_fill_color(link_blue());
        self.layer
            .use_text(LABEL, CELL_SIZE, mm(MARGIN), mm(self.y), &self.font);
        self.layer.set_fill_color(black());

        let label_w = approx_width(LABEL, CELL_SIZE);
        self.layer.add_link_annotation(LinkAnnotation::new(
            Rect::new(
                mm(MARGIN),
                mm(self.y - 2.0),
                mm(MARGIN + label_w),
                mm(self.y + CELL_SIZE),
            ),
            None,
            None,
            Actions::uri(url.to_string()),
            None,
        ));
    }

    /// Shaded header row: bold light text on a grey band. Labels wrap onto
    /// extra lines when they exceed the column width.
    fn header_row(&mut self, widths: &[f32], labels: &[&str]) {
        let wrapped: Vec<Vec<String>> = labels
            .iter()
            .zip(widths)
            .map(|(label, w)| wrap_words(label, w - 2.0 * PAD_X, CELL_SIZE))
            .collect();
        let line_count = wrapped.iter().map(|c| c.len()).max().unwrap_or(1);
        let row_h = line_count as f32 * HEADER_LEADING + 2.0 * PAD_Y + 1.5;
        self.ensure_room(row_h);
        let top = self.y;

        let total: f32 = widths.iter().sum();
        self.layer.set_fill_color(grey());
        self.layer
            .add_polygon(filled_rect(MARGIN, top - row_h, MARGIN + total, top));

        self.grid(widths, top, row_h);

        self.layer.set_fill_color(whitesmoke());
        let mut x = MARGIN;
        for (cell, w) in wrapped.iter().zip(widths) {
            let mut baseline = top - PAD_Y - CELL_SIZE + 1.0;
            for line in cell {
                self.layer
                    .use_text(line.as_str(), CELL_SIZE, mm(x + PAD_X), mm(baseline), &self.font_bold);
                baseline -= HEADER_LEADING;
            }
            x += w;
        }
        self.layer.set_fill_color(black());
        self.y = top - row_h;
    }

    /// Single-line data row. Cell text is not wrapped.
    fn data_row(&mut self, widths: &[f32], cells: &[String]) {
        self.ensure_room(ROW_H);
        let top = self.y;
        self.grid(widths, top, ROW_H);

        let baseline = top - PAD_Y - CELL_SIZE + 1.0;
        let mut x = MARGIN;
        for (cell, w) in cells.iter().zip(widths) {
            if !cell.is_empty() {
                self.layer
                    .use_text(cell.as_str(), CELL_SIZE, mm(x + PAD_X), mm(baseline), &self.font);
            }
            x += w;
        }
        self.y = top - ROW_H;
    }

    /// A bold row drawn as one cell spanning the table's full width.
    fn span_row(&mut self, total_width: f32, text: &str) {
        self.ensure_room(ROW_H);
        let top = self.y;
        self.grid(&[total_width], top, ROW_H);
        let baseline = top - PAD_Y - CELL_SIZE + 1.0;
        self.layer
            .use_text(text, CELL_SIZE, mm(MARGIN + PAD_X), mm(baseline), &self.font_bold);
        self.y = top - ROW_H;
    }

    /// Thin border around every cell of one row.
    fn grid(&self, widths: &[f32], top: f32, row_h: f32) {
        self.layer.set_outline_color(black());
        self.layer.set_outline_thickness(GRID_W);
        let mut x = MARGIN;
        for w in widths {
            self.layer.add_line(cell_outline(x, top - row_h, x + w, top));
            x += w;
        }
    }

    fn save(self, out_path: &Path) -> Result<(), ReconError> {
        let file = File::create(out_path).map_err(render_err)?;
        let mut writer = BufWriter::new(file);
        self.doc.save(&mut writer).map_err(render_err)?;
        Ok(())
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> ReconError {
    ReconError::Render(e.to_string())
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn cell_outline(x0: f32, y0: f32, x1: f32, y1: f32) -> Line {
    Line {
        points: vec![
            (Point::new(mm(x0), mm(y0)), false),
            (Point::new(mm(x1), mm(y0)), false),
            (Point::new(mm(x1), mm(y1)), false),
            (Point::new(mm(x0), mm(y1)), false),
        ],
        is_closed: true,
    }
}

fn filled_rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Polygon {
    Polygon {
        rings: vec![vec![
            (Point::new(mm(x0), mm(y0)), false),
            (Point::new(mm(x1), mm(y0)), false),
            (Point::new(mm(x1), mm(y1)), false),
            (Point::new(mm(x0), mm(y1)), false),
        ]],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    }
}

fn grey() -> Color {
    Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None))
}

fn whitesmoke() -> Color {
    Color::Rgb(Rgb::new(0.96, 0.96, 0.96, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn link_blue() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 1.0, None))
}

// ---------------------------------------------------------------------------
// Text measurement
// ---------------------------------------------------------------------------

/// Approximate Helvetica advance per glyph; good enough to wrap the short
/// header labels and size the link annotation.
const APPROX_CHAR_W: f32 = 0.5;

fn approx_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * APPROX_CHAR_W
}

/// Greedy word wrap on the approximate glyph width. Never returns an empty
/// vec; a single word longer than the width gets its own line.
fn wrap_words(text: &str, width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || approx_width(&candidate, size) <= width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DateField;

    fn txn(order_id: &str, date: &str) -> TxnRecord {
        TxnRecord {
            txn_date: DateField {
                parsed: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
                display: date.to_string(),
            },
            payment_ref: "P-1".into(),
            txn_type: "Charge".into(),
            currency: "USD".into(),
            amount: "10.00".into(),
            account_group: "Main".into(),
            card: "Visa 1234".into(),
            account_user: "alice".into(),
            order_date: date.to_string(),
            order_id: order_id.to_string(),
            po_number: "PO-1".into(),
            order_status: "Closed".into(),
        }
    }

    fn group(order_id: &str, rows: usize) -> OrderGroup {
        OrderGroup {
            order_id: order_id.to_string(),
            txns: (0..rows).map(|_| txn(order_id, "2025-03-01")).collect(),
        }
    }

    #[test]
    fn adjusted_indexes_match_headers() {
        assert_eq!(TXN_TABLE_COLUMNS[IDX_TXN_DATE], "Transaction Date");
        assert_eq!(TXN_TABLE_COLUMNS[IDX_PAYMENT_REF], "Payment Reference ID");
        assert_eq!(TXN_TABLE_COLUMNS[IDX_ORDER_ID], "Order ID");
        assert_eq!(TXN_TABLE_COLUMNS[IDX_ORDER_STATUS], "Order Status");
    }

    #[test]
    fn txn_widths_preserve_total() {
        let widths = txn_column_widths();
        let total: f32 = widths.iter().sum();
        assert!((total - USABLE_W).abs() < 0.01);
        let base = USABLE_W / 12.0;
        assert!((widths[IDX_PAYMENT_REF] - (base + WIDEN)).abs() < 0.01);
        assert!((widths[IDX_TXN_DATE] - (base - NARROW)).abs() < 0.01);
    }

    #[test]
    fn return_widths_share_txn_total() {
        let txn_widths = txn_column_widths();
        let ret_widths = return_column_widths(&txn_widths);
        let txn_total: f32 = txn_widths.iter().sum();
        let ret_total: f32 = ret_widths.iter().sum();
        assert!((txn_total - ret_total).abs() < 0.01);
    }

    #[test]
    fn wrap_words_splits_on_width() {
        // "Transaction Date" at 6pt in a 37pt cell: 12 glyphs per line.
        let lines = wrap_words("Transaction Date", 37.0, 6.0);
        assert_eq!(lines, vec!["Transaction", "Date"]);

        let one = wrap_words("Currency", 100.0, 6.0);
        assert_eq!(one, vec!["Currency"]);
    }

    #[test]
    fn wrap_words_never_empty() {
        assert_eq!(wrap_words("", 10.0, 6.0), vec![String::new()]);
    }

    #[test]
    fn renders_single_page_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("supplement.pdf");
        render_supplement(&group("111", 3), &[], &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_groups_paginate() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("supplement.pdf");
        render_supplement(&group("111", 250), &[], &out).unwrap();

        let doc = lopdf::Document::load(&out).unwrap();
        assert!(doc.get_pages().len() >= 2, "250 rows should overflow one page");
    }

    #[test]
    fn unwritable_path_is_render_error() {
        let err = render_supplement(&group("111", 1), &[], Path::new("/nonexistent/out.pdf"))
            .unwrap_err();
        assert!(matches!(err, ReconError::Render(_)));
    }
}
