//! Layout discovery: which sheet, and which row holds the header.
//!
//! Each source declares an ordered list of [`LayoutCandidate`]s and a
//! [`LayoutRule`]. Candidates are tried in order and the first whose frame
//! satisfies the rule is accepted. A candidate may carry its own rule, which
//! replaces the source-wide one for that candidate only.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::debug;

use crate::error::SourceError;
use crate::table::{Frame, Workbook};

/// Sheet selector: position in the workbook or exact name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SheetRef {
    Index(usize),
    Name(&'static str),
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Index(i) => write!(f, "#{}", i),
            SheetRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutRule {
    /// At least `n` non-blank rows below the header
    MinDataRows(usize),
    /// At least `n` columns holding only numbers (and blanks)
    MinNumericColumns(usize),
}

impl LayoutRule {
    pub fn accepts(&self, frame: &Frame) -> bool {
        match self {
            LayoutRule::MinDataRows(n) => frame.len() >= *n,
            LayoutRule::MinNumericColumns(n) => frame.numeric_column_count() >= *n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutCandidate {
    pub sheet: SheetRef,
    pub header_row: usize,
    pub rule: Option<LayoutRule>,
}

impl LayoutCandidate {
    pub const fn new(sheet: SheetRef, header_row: usize) -> Self {
        Self {
            sheet,
            header_row,
            rule: None,
        }
    }

    pub const fn with_rule(self, rule: LayoutRule) -> Self {
        Self {
            rule: Some(rule),
            ..self
        }
    }
}

impl fmt::Display for LayoutCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} header {}", self.sheet, self.header_row)
    }
}

/// Every sheet × every header row, sheet-major.
pub fn candidate_grid(sheets: &[SheetRef], header_rows: RangeInclusive<usize>) -> Vec<LayoutCandidate> {
    sheets
        .iter()
        .flat_map(|sheet| {
            header_rows
                .clone()
                .map(move |row| LayoutCandidate::new(*sheet, row))
        })
        .collect()
}

/// The accepted candidate, resolved to a concrete sheet name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub sheet_name: String,
    pub header_row: usize,
    pub candidate: LayoutCandidate,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet '{}' header row {}", self.sheet_name, self.header_row)
    }
}

/// Try `candidates` in order; the first frame passing its rule wins.
pub fn discover_layout(
    source_name: &str,
    workbook: &Workbook,
    candidates: &[LayoutCandidate],
    rule: LayoutRule,
) -> Result<(Layout, Frame), SourceError> {
    for candidate in candidates {
        let Some(sheet) = workbook.sheet(&candidate.sheet) else {
            continue;
        };
        let Some(frame) = sheet.frame(candidate.header_row) else {
            continue;
        };
        if candidate.rule.unwrap_or(rule).accepts(&frame) {
            debug!(source = source_name, layout = %candidate, "layout accepted");
            let layout = Layout {
                sheet_name: sheet.name.clone(),
                header_row: candidate.header_row,
                candidate: *candidate,
            };
            return Ok((layout, frame));
        }
    }

    Err(SourceError::LayoutNotFound {
        source_name: source_name.to_string(),
        tried: candidates.iter().map(|c| c.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Sheet;

    fn workbook(sheets: &[(&str, &str)]) -> Workbook {
        let sheets = sheets
            .iter()
            .map(|(name, text)| Sheet::from_reader(*name, text.as_bytes()).unwrap())
            .collect();
        Workbook::new("memory", sheets)
    }

    #[test]
    fn test_grid_is_sheet_major() {
        let grid = candidate_grid(&[SheetRef::Index(0), SheetRef::Name("Data")], 0..=1);
        let labels: Vec<String> = grid.iter().map(|c| c.to_string()).collect();
        assert_eq!(labels, ["#0 header 0", "#0 header 1", "'Data' header 0", "'Data' header 1"]);
    }

    #[test]
    fn test_finds_header_below_title_rows() {
        let wb = workbook(&[(
            "prices",
            "Wholesale prices 2024\nsource: EIA\nDate,PJM West,SP15\nJan,41.0,52.0\nFeb,39.0,48.0\n",
        )]);
        let grid = candidate_grid(&[SheetRef::Index(0)], 0..=3);
        let (layout, frame) =
            discover_layout("wholesale", &wb, &grid, LayoutRule::MinNumericColumns(2)).unwrap();
        assert_eq!(layout.header_row, 2);
        assert_eq!(frame.headers[1], "PJM West");
    }

    #[test]
    fn test_candidate_rule_overrides_source_rule() {
        let wb = workbook(&[("tiny", "x\ny\na\n")]);
        let candidates = [
            LayoutCandidate::new(SheetRef::Index(0), 0),
            LayoutCandidate::new(SheetRef::Index(0), 1).with_rule(LayoutRule::MinDataRows(1)),
        ];
        let (layout, _) =
            discover_layout("queue", &wb, &candidates, LayoutRule::MinDataRows(11)).unwrap();
        assert_eq!(layout.header_row, 1);
    }

    #[test]
    fn test_failure_names_every_candidate() {
        let wb = workbook(&[("notes", "just text\nmore text\n")]);
        let candidates = [
            LayoutCandidate::new(SheetRef::Index(0), 0),
            LayoutCandidate::new(SheetRef::Name("Hub Prices"), 0),
        ];
        let err = discover_layout("wholesale", &wb, &candidates, LayoutRule::MinNumericColumns(2))
            .unwrap_err();
        match err {
            SourceError::LayoutNotFound { tried, .. } => {
                assert_eq!(tried, vec!["#0 header 0", "'Hub Prices' header 0"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
