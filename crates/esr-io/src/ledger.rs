//! Ledger file access. The ledger is only ever read whole or appended to.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use esr_core::diagnostics::Diagnostics;
use esr_core::record::{Ledger, LedgerRow, MetricRecord, LEDGER_COLUMNS};
use tracing::{debug, info};

/// Parse ledger CSV; each row keeps the file line it started on.
///
/// Cells beyond the header width are dropped with a warning on that line.
pub fn read_ledger<R: Read>(reader: R, diag: &mut Diagnostics) -> Result<Ledger, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut ledger = Ledger::new(columns);
    for record in csv_reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(ledger.rows.len() + 2);
        if record.len() > ledger.columns.len() {
            diag.add_warning_at_line(
                "format",
                &format!(
                    "{} fields for {} columns; extra cells ignored",
                    record.len(),
                    ledger.columns.len()
                ),
                line,
            );
        }
        let values = ledger
            .columns
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string));
        ledger.rows.push(LedgerRow::new(line, values));
    }
    Ok(ledger)
}

pub fn load_ledger(path: &Path, diag: &mut Diagnostics) -> Result<Ledger> {
    let file = File::open(path).with_context(|| format!("opening ledger '{}'", path.display()))?;
    let ledger = read_ledger(file, diag)
        .with_context(|| format!("parsing ledger '{}'", path.display()))?;
    debug!(path = %path.display(), rows = ledger.len(), "loaded ledger");
    Ok(ledger)
}

/// Append records in the file's own column order.
///
/// A missing or empty file is created with the current schema header.
/// Returns the number of rows written.
pub fn append_records(path: &Path, records: &[MetricRecord]) -> Result<usize> {
    let existing = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("reading ledger '{}'", path.display()))?
    } else {
        String::new()
    };

    let (columns, write_header) = if existing.trim().is_empty() {
        let columns: Vec<String> = LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect();
        (columns, true)
    } else {
        let header = read_ledger(existing.as_bytes(), &mut Diagnostics::new())
            .with_context(|| format!("parsing ledger header '{}'", path.display()))?
            .columns;
        (header, false)
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating ledger directory '{}'", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening ledger '{}' for append", path.display()))?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if write_header {
        writer.write_record(&columns)?;
    }
    for record in records {
        writer.write_record(record.to_values(&columns))?;
    }
    writer
        .flush()
        .with_context(|| format!("writing ledger '{}'", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "appended ledger rows");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esr_core::record::View;

    #[test]
    fn test_rows_keep_file_lines() {
        let text = "view,year,id,qualitative_note\n\
                    iso,2024,PJM,\"two\nlines\"\n\
                    state,2024,TX,plain\n";
        let mut diag = Diagnostics::new();
        let ledger = read_ledger(text.as_bytes(), &mut diag).unwrap();
        assert!(!diag.has_issues());
        assert_eq!(ledger.rows[0].line, 2);
        assert_eq!(ledger.rows[1].line, 4);
        assert_eq!(ledger.rows[0].get("qualitative_note"), "two\nlines");
        assert!(ledger.find(View::State, 2024, "TX").is_some());
    }

    #[test]
    fn test_overlong_row_warns_with_line() {
        let text = "view,year,id\niso,2024,PJM\nstate,2024,TX,stray,cells\n";
        let mut diag = Diagnostics::new();
        let ledger = read_ledger(text.as_bytes(), &mut diag).unwrap();

        assert_eq!(ledger.rows[1].get("id"), "TX");
        assert_eq!(diag.warning_count(), 1);
        let issue = diag.warnings().next().unwrap();
        assert_eq!(issue.line, Some(3));
        assert!(issue.message.contains("5 fields for 3 columns"));
    }

    #[test]
    fn test_append_creates_then_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger").join("audit.csv");

        let mut first = MetricRecord::new(View::State, 2025, "TX");
        first.qualitative_note = "comma, inside".into();
        append_records(&path, &[first]).unwrap();
        append_records(&path, &[MetricRecord::new(View::State, 2025, "OK")]).unwrap();

        let ledger = load_ledger(&path, &mut Diagnostics::new()).unwrap();
        assert_eq!(ledger.columns.len(), LEDGER_COLUMNS.len());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.rows[0].get("qualitative_note"), "comma, inside");
        assert_eq!(ledger.rows[1].line, 3);
    }

    #[test]
    fn test_append_follows_existing_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        fs::write(&path, "id,view,year\nPJM,iso,2024").unwrap();

        append_records(&path, &[MetricRecord::new(View::State, 2025, "NJ")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "id,view,year\nPJM,iso,2024\nNJ,state,2025\n");
    }
}
