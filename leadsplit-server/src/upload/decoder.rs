//! Tabular decoding
//!
//! Turns a stored CSV or spreadsheet file into a lazy sequence of
//! header-keyed rows. The first record/row is the header. Spreadsheets
//! contribute their first sheet only. Fully blank rows are skipped; missing
//! cells decode as empty strings so header matching still sees every column.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::normalizer::{normalize_row, CanonicalRecord, RawRow, RowRejection};

/// Accepted upload extensions (lower case, without the dot)
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Declared file format, derived from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Format for a lower-case extension, None when unsupported
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Label used in rejection messages
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Spreadsheet => "XLSX",
        }
    }
}

/// Failure reading the file itself (as opposed to a rejected row)
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("workbook contains no sheets")]
    NoSheets,
}

/// Failure of a whole-batch decode
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{format} file could not be read: {source}")]
    Unreadable {
        format: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("{format} format invalid: row {line}: {reason}")]
    InvalidRow {
        format: &'static str,
        line: u64,
        reason: RowRejection,
    },
}

/// A decoded row with its 1-based line (CSV) or row number (sheet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub line: u64,
    pub row: RawRow,
}

/// Lazy, finite, single-pass row sequence
pub enum RowSource {
    Csv {
        headers: Vec<String>,
        records: csv::StringRecordsIntoIter<Box<dyn Read + Send>>,
    },
    Sheet {
        headers: Vec<String>,
        first_line: u64,
        rows: std::iter::Enumerate<std::vec::IntoIter<Vec<String>>>,
    },
}

impl RowSource {
    /// Open a stored file in the given format
    pub fn open(path: &Path, format: FileFormat) -> Result<Self, DecodeError> {
        match format {
            FileFormat::Csv => {
                let file = File::open(path).map_err(csv::Error::from)?;
                Self::from_csv_reader(file)
            }
            FileFormat::Spreadsheet => {
                let mut workbook = open_workbook_auto(path)?;
                let range = workbook
                    .worksheet_range_at(0)
                    .ok_or(DecodeError::NoSheets)??;
                Ok(Self::from_sheet(&range))
            }
        }
    }

    /// Stream CSV records from any reader
    pub fn from_csv_reader<R: Read + Send + 'static>(reader: R) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(Box::new(reader) as Box<dyn Read + Send>);

        let headers = reader.headers()?.iter().map(clean_header).collect();

        Ok(Self::Csv {
            headers,
            records: reader.into_records(),
        })
    }

    /// Rows of an already-loaded sheet; the first row is the header
    pub fn from_sheet(range: &Range<Data>) -> Self {
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

        let headers = rows
            .next()
            .map(|header| header.iter().map(|h| clean_header(h)).collect())
            .unwrap_or_default();

        // Header occupies the range's first row; data starts one below it
        let first_line = range.start().map(|(row, _)| u64::from(row)).unwrap_or(0) + 2;

        Self::Sheet {
            headers,
            first_line,
            rows: rows.collect::<Vec<_>>().into_iter().enumerate(),
        }
    }

    pub fn headers(&self) -> &[String] {
        match self {
            Self::Csv { headers, .. } | Self::Sheet { headers, .. } => headers,
        }
    }
}

impl Iterator for RowSource {
    type Item = Result<SourceRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (line, row) = match self {
                Self::Csv { headers, records } => match records.next()? {
                    Ok(record) => {
                        let line = record.position().map(|p| p.line()).unwrap_or(0);
                        (line, keyed_row(headers, record.iter()))
                    }
                    Err(e) => return Some(Err(e.into())),
                },
                Self::Sheet {
                    headers,
                    first_line,
                    rows,
                } => {
                    let (offset, cells) = rows.next()?;
                    let row = keyed_row(headers, cells.iter().map(String::as_str));
                    (*first_line + offset as u64, row)
                }
            };

            if row.is_blank() {
                continue;
            }

            return Some(Ok(SourceRow { line, row }));
        }
    }
}

/// Decode and normalize an entire file. The first rejected row aborts the
/// batch; partial results are never returned.
pub fn decode_batch(path: &Path, format: FileFormat) -> Result<Vec<CanonicalRecord>, BatchError> {
    let source = RowSource::open(path, format).map_err(|source| BatchError::Unreadable {
        format: format.label(),
        source,
    })?;
    debug!(format = format.label(), columns = ?source.headers(), "Decoding upload");

    normalize_all(source, format)
}

/// Normalize every row of a source, stopping at the first failure
pub fn normalize_all(source: RowSource, format: FileFormat) -> Result<Vec<CanonicalRecord>, BatchError> {
    let mut records = Vec::new();

    for decoded in source {
        let SourceRow { line, row } = decoded.map_err(|source| BatchError::Unreadable {
            format: format.label(),
            source,
        })?;

        let record = normalize_row(&row).map_err(|reason| BatchError::InvalidRow {
            format: format.label(),
            line,
            reason,
        })?;

        records.push(record);
    }

    Ok(records)
}

/// Pair cells with headers; short rows are padded, surplus cells dropped
fn keyed_row<'a>(headers: &[String], cells: impl Iterator<Item = &'a str>) -> RawRow {
    let mut cells = cells;
    headers
        .iter()
        .map(|header| (header.clone(), cells.next().unwrap_or_default().to_string()))
        .collect()
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            // Integral numbers (phone numbers typed as numbers) drop the ".0"
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{:.0}", f)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#ERROR: {:?}", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
