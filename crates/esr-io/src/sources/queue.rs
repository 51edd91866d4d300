//! Interconnection-queue completion rates (LBNL "Queued Up").
//!
//! Completion rate = projects that reached commercial operation / all
//! projects that entered the queue, restricted to entry cohorts old enough
//! to have had a fair chance at completion.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration as DateDuration, NaiveDate};
use esr_core::registry;
use esr_core::units::round_to;
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::columns::{AliasTable, MatchMode};
use crate::error::SourceError;
use crate::layout::{discover_layout, LayoutCandidate, LayoutRule, SheetRef};
use crate::sources::{SourceOutput, TabularSource};
use crate::table::{parse_number, Workbook};

pub const SOURCE_NAME: &str = "queue";
pub const DEFAULT_FLOOR_YEAR: i32 = 2000;
pub const DEFAULT_CUTOFF_YEAR: i32 = 2020;

pub const QUEUE_COLUMNS: AliasTable = AliasTable::new(
    MatchMode::Exact,
    &[
        ("region", "iso"),
        ("iso/rto", "iso"),
        ("iso", "iso"),
        ("rto", "iso"),
        ("entity", "iso"),
        ("queue date", "entry_year"),
        ("queue year", "entry_year"),
        ("year entered", "entry_year"),
        ("year", "entry_year"),
        ("entry year", "entry_year"),
        ("q_date", "entry_year"),
        ("status", "status"),
        ("queue status", "status"),
        ("project status", "status"),
        ("current status", "status"),
        ("cod", "cod"),
        ("commercial operation date", "cod"),
        ("commercial_operation_date", "cod"),
        ("in-service date", "cod"),
        ("actual cod", "cod"),
    ],
);

/// Region labels used by the queue dataset → ISO id
const REGION_NAMES: &[(&str, &str)] = &[
    ("ERCOT", "ERCOT"),
    ("SPP", "SPP"),
    ("MISO", "MISO"),
    ("CAISO", "CAISO"),
    ("California ISO", "CAISO"),
    ("PJM", "PJM"),
    ("NYISO", "NYISO"),
    ("New York ISO", "NYISO"),
    ("ISO-NE", "ISO-NE"),
    ("ISO New England", "ISO-NE"),
    ("ISONE", "ISO-NE"),
];

static COMPLETED_STATUSES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "operational",
        "op",
        "completed",
        "commercial operation",
        "built",
        "active - operational",
        "in service",
    ]
});

/// Spreadsheet placeholders for an empty date
const BLANK_DATES: [&str; 4] = ["nan", "nat", "none", "n/a"];

const CANDIDATES: [LayoutCandidate; 6] = [
    LayoutCandidate::new(SheetRef::Name("Data"), 0),
    LayoutCandidate::new(SheetRef::Name("data"), 0),
    LayoutCandidate::new(SheetRef::Name("All Projects"), 0),
    LayoutCandidate::new(SheetRef::Name("Queue"), 0),
    LayoutCandidate::new(SheetRef::Index(0), 0),
    LayoutCandidate::new(SheetRef::Index(0), 1).with_rule(LayoutRule::MinDataRows(1)),
];

pub fn region_to_iso(label: &str) -> Option<&'static str> {
    let label = label.trim();
    REGION_NAMES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, iso)| *iso)
}

/// Entry year from a year, an ISO date, a US date or a spreadsheet serial.
pub fn parse_entry_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Some(number) = parse_number(cell) {
        if (1000.0..10000.0).contains(&number) {
            return Some(number as i32);
        }
        // days since 1899-12-30, the spreadsheet epoch
        if (1.0..2_958_466.0).contains(&number) {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            let date = epoch.checked_add_signed(DateDuration::days(number.trunc() as i64))?;
            return Some(date.year());
        }
        return None;
    }
    let date_part = cell.split([' ', 'T']).next().unwrap_or(cell);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .map(|date| date.year())
        .ok()
}

pub fn is_completed(status: &str, cod: &str) -> bool {
    let status = status.trim().to_lowercase();
    if COMPLETED_STATUSES.contains(&status.as_str()) {
        return true;
    }
    let cod = cod.trim();
    !cod.is_empty() && !BLANK_DATES.contains(&cod.to_lowercase().as_str())
}

#[derive(Debug, Clone, Copy)]
pub struct QueueCompletion {
    pub floor_year: i32,
    pub cutoff_year: i32,
}

impl Default for QueueCompletion {
    fn default() -> Self {
        Self {
            floor_year: DEFAULT_FLOOR_YEAR,
            cutoff_year: DEFAULT_CUTOFF_YEAR,
        }
    }
}

impl QueueCompletion {
    pub fn new(floor_year: i32, cutoff_year: i32) -> Self {
        Self {
            floor_year,
            cutoff_year,
        }
    }

    pub fn cohort_label(&self) -> String {
        format!("{}-{}", self.floor_year, self.cutoff_year)
    }
}

impl TabularSource for QueueCompletion {
    type Output = SourceOutput;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn normalize(&self, workbook: &Workbook) -> Result<SourceOutput, SourceError> {
        let (layout, frame) =
            discover_layout(SOURCE_NAME, workbook, &CANDIDATES, LayoutRule::MinDataRows(11))?;

        let iso_column = QUEUE_COLUMNS.find(&frame.headers, "iso").ok_or_else(|| {
            SourceError::SchemaMismatch {
                source_name: SOURCE_NAME.to_string(),
                concept: "iso".to_string(),
                available: frame.headers.clone(),
            }
        })?;
        let entry_column = QUEUE_COLUMNS.find(&frame.headers, "entry_year");
        let status_column = QUEUE_COLUMNS.find(&frame.headers, "status");
        let cod_column = QUEUE_COLUMNS.find(&frame.headers, "cod");

        let mut output = SourceOutput::default();
        output.used_columns = [Some(&iso_column), entry_column.as_ref(), status_column.as_ref(), cod_column.as_ref()]
            .into_iter()
            .flatten()
            .map(|m| m.header.clone())
            .collect();
        if entry_column.is_none() {
            output.diagnostics.add_warning(
                "column",
                "no entry-year column; all cohorts counted",
            );
        }
        if status_column.is_none() && cod_column.is_none() {
            output.diagnostics.add_warning(
                "column",
                "neither status nor COD column found; no project counts as completed",
            );
        }

        // iso → (total, completed)
        let mut tallies: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
        let mut unmapped = 0usize;
        let mut outside_cohort = 0usize;
        for row in 0..frame.len() {
            let Some(iso) = region_to_iso(frame.cell(row, iso_column.index)) else {
                unmapped += 1;
                continue;
            };
            if let Some(column) = &entry_column {
                let in_cohort = parse_entry_year(frame.cell(row, column.index))
                    .map(|year| (self.floor_year..=self.cutoff_year).contains(&year))
                    .unwrap_or(false);
                if !in_cohort {
                    outside_cohort += 1;
                    continue;
                }
            }
            let status = status_column
                .as_ref()
                .map(|c| frame.cell(row, c.index))
                .unwrap_or("");
            let cod = cod_column
                .as_ref()
                .map(|c| frame.cell(row, c.index))
                .unwrap_or("");

            let tally = tallies.entry(iso).or_default();
            tally.0 += 1;
            if is_completed(status, cod) {
                tally.1 += 1;
            }
        }
        debug!(unmapped, outside_cohort, "queue rows excluded");

        for iso in registry::iso_list() {
            let Some((total, completed)) = tallies.get(iso.id).copied() else {
                continue;
            };
            let rate = round_to(100.0 * completed as f64 / total as f64, 1);
            output.insert(
                iso.id,
                rate,
                format!(
                    "LBNL Queued Up {} ({} cohort, {} of {} projects)",
                    layout,
                    self.cohort_label(),
                    completed,
                    total
                ),
            );
        }

        info!(
            source = SOURCE_NAME,
            layout = %layout,
            cohort = %self.cohort_label(),
            isos = ?output.entities(),
            "normalized queue completion"
        );
        output.layout = Some(layout);
        Ok(output)
    }
}
