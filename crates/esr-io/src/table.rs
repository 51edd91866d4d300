//! Raw workbook access.
//!
//! Agency downloads are spreadsheets whose layout drifts between vintages.
//! They are consumed as CSV exports: a single `.csv` file is a one-sheet
//! workbook (the sheet is named after the file stem), and a directory of
//! `.csv` files is a workbook with one sheet per file, ordered by file name.
//! Cells are kept as raw strings until a layout has been chosen.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SourceError;
use crate::layout::SheetRef;

/// One sheet of raw cells, no header interpretation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(name, rows))
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_reader(name, File::open(path)?)
    }

    /// Interpret row `header_row` as the header; rows above it are dropped.
    pub fn frame(&self, header_row: usize) -> Option<Frame> {
        let header = self.rows.get(header_row)?;
        let headers: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
        let rows = self.rows[header_row + 1..]
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .cloned()
            .collect();
        Some(Frame { headers, rows })
    }
}

/// A set of named sheets loaded from disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub path: PathBuf,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(path: impl Into<PathBuf>, sheets: Vec<Sheet>) -> Self {
        Self {
            path: path.into(),
            sheets,
        }
    }

    /// Load a `.csv` file or a directory of `.csv` sheets.
    pub fn open(source_name: &str, path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::MissingSource {
                source_name: source_name.to_string(),
                path: path.display().to_string(),
            });
        }

        let sheets = if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .map(|ext| ext.eq_ignore_ascii_case("csv"))
                        .unwrap_or(false)
                })
                .collect();
            files.sort();
            files
                .iter()
                .map(|file| Sheet::from_path(file))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![Sheet::from_path(path)?]
        };

        debug!(
            source = source_name,
            path = %path.display(),
            sheets = sheets.len(),
            "opened workbook"
        );
        Ok(Self::new(path, sheets))
    }

    pub fn sheet(&self, sheet: &SheetRef) -> Option<&Sheet> {
        match sheet {
            SheetRef::Index(index) => self.sheets.get(*index),
            SheetRef::Name(name) => self.sheets.iter().find(|s| s.name == *name),
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A sheet viewed through a chosen header row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `column`); short rows read as blank.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }

    /// Numeric cells of a column; everything else counts as missing.
    pub fn numeric_values(&self, column: usize) -> Vec<f64> {
        self.column(column).filter_map(parse_number).collect()
    }

    /// True when the column has numbers and nothing but numbers or blanks.
    pub fn is_numeric_column(&self, column: usize) -> bool {
        let mut seen = false;
        for cell in self.column(column) {
            if cell.is_empty() {
                continue;
            }
            if parse_number(cell).is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    pub fn numeric_column_count(&self) -> usize {
        (0..self.headers.len())
            .filter(|col| self.is_numeric_column(*col))
            .count()
    }
}

/// Parse a spreadsheet number: thousands separators and `$` are tolerated.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sheet(text: &str) -> Sheet {
        Sheet::from_reader("test", text.as_bytes()).unwrap()
    }

    #[test]
    fn test_frame_skips_rows_above_header_and_blank_rows() {
        let sheet = sheet("Title line\n\nHub,Price\nA,1\n,\nB,2\n");
        let frame = sheet.frame(2).unwrap();
        assert_eq!(frame.headers, vec!["Hub", "Price"]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.cell(1, 0), "B");
        assert_eq!(frame.cell(5, 5), "");
    }

    #[test]
    fn test_numeric_column_detection() {
        let frame = sheet("a,b,c\n1,x,\n\"2,500\",3,\n").frame(0).unwrap();
        assert!(frame.is_numeric_column(0));
        assert!(!frame.is_numeric_column(1));
        assert!(!frame.is_numeric_column(2));
        assert_eq!(frame.numeric_values(0), vec![1.0, 2500.0]);
        assert_eq!(frame.numeric_values(1), vec![3.0]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" $1,234.5 "), Some(1234.5));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_open_directory_orders_sheets_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_queue.csv", "a_data.csv", "notes.txt"] {
            let mut file = File::create(dir.path().join(name)).unwrap();
            writeln!(file, "h\n1").unwrap();
        }
        let workbook = Workbook::open("queue", dir.path()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["a_data", "b_queue"]);
        assert!(workbook.sheet(&SheetRef::Name("b_queue")).is_some());
        assert_eq!(workbook.sheet(&SheetRef::Index(0)).unwrap().name, "a_data");
    }

    #[test]
    fn test_open_missing_path() {
        let err = Workbook::open("retail", Path::new("/nonexistent/epm.csv")).unwrap_err();
        assert!(matches!(err, SourceError::MissingSource { .. }));
    }
}
