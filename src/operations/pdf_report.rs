//! The printable summary: totals followed by a fixed-width table of every transaction.

use super::summary::{Summary, format_amount, summarize};
use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::{DATE_FORMAT, Transaction};
use chrono::{Local, NaiveDateTime};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_TITLE: &str = "Personal Expense Tracker Report";
pub const COLUMN_HEADERS: [&str; 6] = ["ID", "Date", "Type", "Category", "Amount", "Description"];
/// Column widths in millimetres.
pub const COLUMN_WIDTHS: [f32; 6] = [10.0, 25.0, 20.0, 30.0, 20.0, 75.0];

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const HEADER_ROW_HEIGHT: f32 = 7.0;
const ROW_HEIGHT: f32 = 6.0;
const CELL_PADDING: f32 = 1.0;
const TABLE_FONT_SIZE: f32 = 9.0;
// Mean Helvetica glyph width at 9pt, used to decide where cell text is cut.
const TABLE_CHAR_WIDTH: f32 = 1.65;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub summary: Summary,
    pub rows: Vec<[String; 6]>,
}

impl ReportDocument {
    pub fn build(transactions: &[Transaction], generated_at: NaiveDateTime) -> Self {
        let rows = transactions
            .iter()
            .map(|t| {
                [
                    t.id.to_string(),
                    t.date.format(DATE_FORMAT).to_string(),
                    t.kind.label().to_string(),
                    t.category.clone(),
                    format_amount(t.amount),
                    t.description.clone(),
                ]
            })
            .collect();

        Self {
            title: REPORT_TITLE.to_string(),
            generated_at,
            summary: summarize(transactions),
            rows,
        }
    }

    /// The lines printed above the table.
    pub fn heading_lines(&self) -> Vec<String> {
        vec![
            format!(
                "Date Generated: {}",
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("Total Income: {}", format_amount(self.summary.total_income)),
            format!("Total Expense: {}", format_amount(self.summary.total_expense)),
            format!("Net Balance: {}", format_amount(self.summary.net_balance)),
        ]
    }
}

pub fn default_report_file_name(now: NaiveDateTime) -> String {
    format!("Expense_Report_{}.pdf", now.format("%Y%m%d_%H%M%S"))
}

/// Cuts `text` so it fits in a column of `width_mm`, marking the cut with `...`.
pub fn fit_to_width(text: &str, width_mm: f32) -> String {
    let capacity = ((width_mm - 2.0 * CELL_PADDING) / TABLE_CHAR_WIDTH).floor().max(1.0) as usize;
    if text.chars().count() <= capacity {
        return text.to_string();
    }
    if capacity <= 3 {
        return text.chars().take(capacity).collect();
    }
    let mut cut: String = text.chars().take(capacity - 3).collect();
    cut.push_str("...");
    cut
}

/// Builds a report over every stored transaction and writes it to `output`,
/// or to a timestamped file inside `dir` when no output is given.
pub fn save_report(conn: &Connection, output: Option<&Path>, dir: &Path) -> Result<PathBuf> {
    let transactions = repository::get_all_transactions(conn)?;
    if transactions.is_empty() {
        return Err(Error::validation(
            "No transactions found to generate a PDF report.",
        ));
    }

    let now = Local::now().naive_local();
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => dir.join(default_report_file_name(now)),
    };

    let document = ReportDocument::build(&transactions, now);
    write_pdf(&document, &path)?;
    info!("Saved report with {} rows to {}", document.rows.len(), path.display());
    Ok(path)
}

pub fn write_pdf(document: &ReportDocument, path: &Path) -> Result<()> {
    let (doc, page, layer) =
        PdfDocument::new(&document.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;

    y -= 10.0;
    layer.use_text(document.title.clone(), 16.0, Mm(title_x(&document.title)), Mm(y), &regular);
    y -= 4.0;
    for line in document.heading_lines() {
        y -= 8.0;
        layer.use_text(line, 12.0, Mm(MARGIN), Mm(y), &regular);
    }
    y -= 5.0;

    y = draw_table_header(&layer, &bold, y);
    for row in &document.rows {
        if y - ROW_HEIGHT < MARGIN {
            layer = new_page(&doc);
            y = draw_table_header(&layer, &bold, PAGE_HEIGHT - MARGIN);
        }
        draw_row(&layer, &regular, row, y, ROW_HEIGHT);
        y -= ROW_HEIGHT;
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file)).map_err(pdf_error)?;
    Ok(())
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    doc.get_page(page).get_layer(layer)
}

fn draw_table_header(layer: &PdfLayerReference, font: &IndirectFontRef, top: f32) -> f32 {
    let header = COLUMN_HEADERS.map(|h| h.to_string());
    draw_row(layer, font, &header, top, HEADER_ROW_HEIGHT);
    top - HEADER_ROW_HEIGHT
}

fn draw_row(layer: &PdfLayerReference, font: &IndirectFontRef, cells: &[String; 6], top: f32, height: f32) {
    let mut x = MARGIN;
    for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
        layer.add_line(rectangle(x, top - height, width, height));
        layer.use_text(
            fit_to_width(cell, width),
            TABLE_FONT_SIZE,
            Mm(x + CELL_PADDING),
            Mm(top - height + 2.0),
            font,
        );
        x += width;
    }
}

fn rectangle(x: f32, y: f32, width: f32, height: f32) -> Line {
    Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y + height)), false),
            (Point::new(Mm(x), Mm(y + height)), false),
        ],
        is_closed: true,
    }
}

fn title_x(title: &str) -> f32 {
    // 16pt Helvetica averages about 2.9mm per glyph
    let width = title.chars().count() as f32 * 2.9;
    ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
}

fn pdf_error(err: printpdf::Error) -> Error {
    Error::Pdf(err.to_string())
}
