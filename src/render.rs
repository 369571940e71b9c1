//! Result rows, terminal rendering and CSV export.

use crate::error::Result;
use crate::pagination::{PageControls, PageEntry};
use crate::patent::BibliographicRecord;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// CSV column order for exported rows
pub const ROW_COLUMNS: &[&str] = &[
    "position",
    "patent_id",
    "title",
    "applicants",
    "inventors",
    "application_date",
    "publication_date",
];

/// Column headings and display widths for the terminal table
const TABLE_COLUMNS: &[(&str, usize)] = &[
    ("#", 5),
    ("Patent ID", 36),
    ("Title", 40),
    ("Applicants", 24),
    ("Inventors", 24),
    ("Applied", 10),
    ("Published", 10),
];

/// One table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// 1-based position across all pages
    pub position: u64,
    pub patent_id: String,
    pub title: String,
    /// Applicant names, comma-joined in record order
    pub applicants: String,
    pub inventors: String,
    pub application_date: String,
    pub publication_date: String,
}

impl ResultRow {
    pub fn from_record(record: &BibliographicRecord, position: u64) -> Self {
        Self {
            position,
            patent_id: record.patent_id.clone(),
            title: record.title().to_string(),
            applicants: record.applicant_names().join(","),
            inventors: record.inventor_names().join(","),
            application_date: record.application_date().to_string(),
            publication_date: record.publication_date().to_string(),
        }
    }

    fn cells(&self) -> [String; 7] {
        [
            self.position.to_string(),
            self.patent_id.clone(),
            self.title.clone(),
            self.applicants.clone(),
            self.inventors.clone(),
            self.application_date.clone(),
            self.publication_date.clone(),
        ]
    }
}

/// Pad or cut a cell to `width` characters
fn fit(cell: &str, width: usize) -> String {
    let count = cell.chars().count();
    if count <= width {
        format!("{}{}", cell, " ".repeat(width - count))
    } else {
        let mut cut: String = cell.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Heading with the total hit count
pub fn render_heading(total_results: u64) -> String {
    format!("Found {} results", total_results)
}

/// Fixed-width text table of rows
pub fn render_table(rows: &[ResultRow]) -> String {
    let header: Vec<String> = TABLE_COLUMNS.iter().map(|(name, w)| fit(name, *w)).collect();
    let rule: Vec<String> = TABLE_COLUMNS.iter().map(|(_, w)| "-".repeat(*w)).collect();

    let mut lines = vec![header.join(" | ").trim_end().to_string(), rule.join("-+-")];
    lines.extend(rows.iter().map(|row| {
        let cells: Vec<String> = row
            .cells()
            .iter()
            .zip(TABLE_COLUMNS)
            .map(|(cell, (_, w))| fit(cell, *w))
            .collect();
        cells.join(" | ").trim_end().to_string()
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Pagination bar; the current page is bracketed, disabled arrows are dropped
pub fn render_controls(controls: &PageControls) -> String {
    let mut parts: Vec<String> = Vec::new();

    if controls.show_prev_next && !controls.prev_disabled {
        parts.push("< Prev".to_string());
    }
    for button in &controls.buttons {
        match button.entry {
            PageEntry::Page(n) if button.current => parts.push(format!("[{}]", n)),
            entry => parts.push(entry.to_string()),
        }
    }
    if controls.show_prev_next && !controls.next_disabled {
        parts.push("Next >".to_string());
    }

    parts.join(" ")
}

/// Save rows to a CSV file; the header row is written even when `data` is empty
pub fn save_csv<T: Serialize>(path: &Path, headers: &[&str], data: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(headers)?;
    for item in data {
        wtr.serialize(item)?;
    }

    wtr.flush()?;
    info!(path = ?path, rows = data.len(), "Saved CSV");
    Ok(())
}
