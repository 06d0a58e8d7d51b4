pub mod date;
pub mod numerals;
pub mod row;

use scraper::{Html, Selector};

use crate::db::GenerationRecord;
use row::{RowError, RowOutcome};

/// Records extracted from one report page, plus how many rows were dropped
/// for a malformed date.
pub struct ParsedPage {
    pub records: Vec<GenerationRecord>,
    pub dropped: usize,
}

/// Extract all generation rows from one report page.
///
/// A document without a data table yields zero records. A row whose date
/// cell fails to parse is dropped and counted; a non-numeric measurement
/// cell fails the whole page.
pub fn parse_page(html: &str) -> Result<ParsedPage, RowError> {
    let doc = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tbody tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let mut records = Vec::new();
    let mut dropped = 0;

    if let Some(table) = doc.select(&table_sel).next() {
        for tr in table.select(&row_sel) {
            let cells: Vec<String> = tr
                .select(&cell_sel)
                .map(|td| td.text().collect::<String>())
                .collect();
            match row::extract(&cells)? {
                RowOutcome::Valid(rec) => records.push(rec),
                RowOutcome::BadDate => dropped += 1,
            }
        }
    }

    Ok(ParsedPage { records, dropped })
}
