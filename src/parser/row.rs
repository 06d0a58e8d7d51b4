use thiserror::Error;

use crate::db::GenerationRecord;
use crate::parser::{date, numerals};

pub const EXPECTED_CELLS: usize = 14;

/// Faults that mean the table no longer matches the layout this tool was
/// built against. These abort the whole run; they are never per-row.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected 14 cells in row, got {0}")]
    CellCount(usize),
    #[error("column {column} ({field}) is not numeric after normalization: {value:?}")]
    NonNumeric {
        column: usize,
        field: &'static str,
        value: String,
    },
}

/// Result of extracting one table row.
#[derive(Debug)]
pub enum RowOutcome {
    Valid(GenerationRecord),
    /// Date cell failed to parse; the row is dropped by the caller.
    BadDate,
}

#[derive(Clone, Copy, Debug)]
enum Column {
    Date,
    Time,
    Numeric(NumericField),
    Comment,
}

#[derive(Clone, Copy, Debug)]
enum NumericField {
    Produced,
    Load,
    Loss,
    LoadShed,
    Gas,
    Liquid,
    Coal,
    Hydro,
    Solar,
    Veramara,
    Tripura,
}

impl NumericField {
    fn name(self) -> &'static str {
        match self {
            Self::Produced => "produced",
            Self::Load => "load",
            Self::Loss => "loss",
            Self::LoadShed => "load_shed",
            Self::Gas => "gas",
            Self::Liquid => "liquid",
            Self::Coal => "coal",
            Self::Hydro => "hydro",
            Self::Solar => "solar",
            Self::Veramara => "veramara",
            Self::Tripura => "tripura",
        }
    }

    fn slot(self, rec: &mut GenerationRecord) -> &mut String {
        match self {
            Self::Produced => &mut rec.produced,
            Self::Load => &mut rec.load,
            Self::Loss => &mut rec.loss,
            Self::LoadShed => &mut rec.load_shed,
            Self::Gas => &mut rec.gas,
            Self::Liquid => &mut rec.liquid,
            Self::Coal => &mut rec.coal,
            Self::Hydro => &mut rec.hydro,
            Self::Solar => &mut rec.solar,
            Self::Veramara => &mut rec.veramara,
            Self::Tripura => &mut rec.tripura,
        }
    }
}

/// Column contract of the report table, in document order. The server's
/// column order is load-bearing; changing it here means the scrape is wrong.
const COLUMNS: [Column; EXPECTED_CELLS] = [
    Column::Date,
    Column::Time,
    Column::Numeric(NumericField::Produced),
    Column::Numeric(NumericField::Load),
    Column::Numeric(NumericField::Loss),
    Column::Numeric(NumericField::LoadShed),
    Column::Numeric(NumericField::Gas),
    Column::Numeric(NumericField::Liquid),
    Column::Numeric(NumericField::Coal),
    Column::Numeric(NumericField::Hydro),
    Column::Numeric(NumericField::Solar),
    Column::Numeric(NumericField::Veramara),
    Column::Numeric(NumericField::Tripura),
    Column::Comment,
];

/// Turn one row's ordered cell texts into a record.
///
/// Date faults are recoverable (the row is dropped upstream); anything else
/// that fails here means the page layout diverged and the run must stop.
pub fn extract(cells: &[String]) -> Result<RowOutcome, RowError> {
    if cells.len() != EXPECTED_CELLS {
        return Err(RowError::CellCount(cells.len()));
    }

    let mut rec = GenerationRecord::default();
    let mut bad_date = false;

    for (column, (kind, raw)) in COLUMNS.iter().zip(cells).enumerate() {
        match kind {
            Column::Date => {
                let parsed = date::reverse(&numerals::normalize(raw));
                rec.year = parsed.year;
                rec.month = parsed.month;
                rec.day = parsed.day;
                if parsed.fault.is_some() {
                    bad_date = true;
                }
            }
            Column::Time => rec.time = numerals::normalize(raw),
            Column::Numeric(field) => {
                let mut value = numerals::normalize(raw);
                if value.is_empty() {
                    value = "0".to_string();
                }
                if value.parse::<f64>().is_err() {
                    return Err(RowError::NonNumeric {
                        column,
                        field: field.name(),
                        value,
                    });
                }
                *field.slot(&mut rec) = value;
            }
            Column::Comment => rec.comment = raw.trim().to_string(),
        }
    }

    if bad_date {
        Ok(RowOutcome::BadDate)
    } else {
        Ok(RowOutcome::Valid(rec))
    }
}
