//! Ledger schema and row types.
//!
//! The ledger is the append-only audit table of every published metric
//! record. Rows are kept as raw strings ([`LedgerRow`]) so the validator can
//! report malformed values exactly as they appear in the file; freshly
//! computed rows are built as typed [`MetricRecord`]s and rendered to strings
//! only when appended.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EsrError;

/// Ledger columns in file order.
pub const LEDGER_COLUMNS: [&str; 25] = [
    "view",
    "year",
    "id",
    "name",
    "region",
    "is_estimate",
    "color_group",
    "siting_regime",
    "confidence",
    "wholesale_price_mwh",
    "all_in_price_mwh",
    "retail_price_cents_kwh",
    "price_2023_mwh",
    "capacity_additions_mw",
    "capacity_additions_elcc_mw",
    "project_count",
    "peak_demand_gw",
    "queue_completion_pct",
    "queue_cohort",
    "avg_queue_duration_months",
    "qualitative_note",
    "source_price",
    "source_capacity",
    "source_peak",
    "source_queue",
];

/// Schema columns that older ledgers may omit.
pub const OPTIONAL_COLUMNS: [&str; 2] = ["siting_regime", "avg_queue_duration_months"];

pub const NUMERIC_COLUMNS: [&str; 10] = [
    "wholesale_price_mwh",
    "all_in_price_mwh",
    "retail_price_cents_kwh",
    "price_2023_mwh",
    "capacity_additions_mw",
    "capacity_additions_elcc_mw",
    "project_count",
    "peak_demand_gw",
    "queue_completion_pct",
    "avg_queue_duration_months",
];

/// Citations every ISO row must carry.
pub const SOURCE_COLUMNS: [&str; 4] = ["source_price", "source_capacity", "source_peak", "source_queue"];

/// Columns that must be present in every ledger file.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    LEDGER_COLUMNS
        .into_iter()
        .filter(|c| !OPTIONAL_COLUMNS.contains(c))
}

/// Granularity of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Iso,
    State,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Iso => "iso",
            View::State => "state",
        }
    }
}

impl FromStr for View {
    type Err = EsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iso" => Ok(View::Iso),
            "state" => Ok(View::State),
            other => Err(EsrError::Parse(format!("invalid view '{other}'"))),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative reliability color of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorGroup {
    Functional,
    Intermediate,
    Broken,
}

impl ColorGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorGroup::Functional => "functional",
            ColorGroup::Intermediate => "intermediate",
            ColorGroup::Broken => "broken",
        }
    }
}

impl FromStr for ColorGroup {
    type Err = EsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "functional" => Ok(ColorGroup::Functional),
            "intermediate" => Ok(ColorGroup::Intermediate),
            "broken" => Ok(ColorGroup::Broken),
            other => Err(EsrError::Parse(format!("invalid color_group '{other}'"))),
        }
    }
}

/// Literal tokens accepted in the `is_estimate` column.
pub fn estimate_token(is_estimate: bool) -> &'static str {
    if is_estimate {
        "True"
    } else {
        "False"
    }
}

/// Parse an optional numeric cell. Blank means absent.
pub fn parse_optional_number(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some)
}

/// Render a number the way the ledger stores it (`80`, `44.8`).
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Uniqueness key of a ledger row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub view: String,
    pub year: String,
    pub id: String,
}

impl RowKey {
    pub fn new(view: View, year: i32, id: &str) -> Self {
        Self {
            view: view.as_str().to_string(),
            year: year.to_string(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', '{}', '{}')", self.view, self.year, self.id)
    }
}

/// One raw ledger row as read from disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerRow {
    /// File line number (the header is line 1)
    pub line: usize,
    values: BTreeMap<String, String>,
}

impl LedgerRow {
    pub fn new<I, K, V>(line: usize, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            line,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Cell value, or `""` when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.values.insert(column.to_string(), value.into());
    }

    pub fn key(&self) -> RowKey {
        RowKey {
            view: self.get("view").to_string(),
            year: self.get("year").to_string(),
            id: self.get("id").to_string(),
        }
    }

    /// `view/year/id`, used as the entity locator in diagnostics
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.get("view"), self.get("year"), self.get("id"))
    }

    pub fn matches(&self, view: View, year: i32, id: &str) -> bool {
        self.get("view") == view.as_str()
            && self.get("year").trim() == year.to_string()
            && self.get("id") == id
    }
}

/// In-memory snapshot of the ledger file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    pub columns: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Empty ledger with the current schema.
    pub fn with_schema() -> Self {
        Self::new(LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    /// Append a row given in column order; assigns the next file line.
    pub fn push_values(&mut self, values: Vec<String>) {
        let line = self.rows.len() + 2;
        let row = LedgerRow::new(line, self.columns.iter().cloned().zip(values));
        self.rows.push(row);
    }

    pub fn push_record(&mut self, record: &MetricRecord) {
        let values = record.to_values(&self.columns);
        self.push_values(values);
    }

    pub fn find(&self, view: View, year: i32, id: &str) -> Option<&LedgerRow> {
        self.rows.iter().find(|row| row.matches(view, year, id))
    }

    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.rows.iter().any(|row| &row.key() == key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A typed ledger row produced by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub view: View,
    pub year: i32,
    pub id: String,
    pub name: String,
    pub region: String,
    pub is_estimate: bool,
    pub color_group: Option<ColorGroup>,
    pub siting_regime: String,
    pub confidence: String,
    pub wholesale_price_mwh: Option<f64>,
    pub all_in_price_mwh: Option<f64>,
    pub retail_price_cents_kwh: Option<f64>,
    pub price_2023_mwh: Option<f64>,
    pub capacity_additions_mw: Option<f64>,
    pub capacity_additions_elcc_mw: Option<f64>,
    pub project_count: Option<u32>,
    pub peak_demand_gw: Option<f64>,
    pub queue_completion_pct: Option<f64>,
    pub queue_cohort: String,
    pub avg_queue_duration_months: Option<f64>,
    pub qualitative_note: String,
    pub source_price: String,
    pub source_capacity: String,
    pub source_peak: String,
    pub source_queue: String,
}

impl MetricRecord {
    /// Blank record for a key; every metric starts absent.
    pub fn new(view: View, year: i32, id: &str) -> Self {
        Self {
            view,
            year,
            id: id.to_string(),
            name: String::new(),
            region: String::new(),
            is_estimate: false,
            color_group: None,
            siting_regime: String::new(),
            confidence: String::new(),
            wholesale_price_mwh: None,
            all_in_price_mwh: None,
            retail_price_cents_kwh: None,
            price_2023_mwh: None,
            capacity_additions_mw: None,
            capacity_additions_elcc_mw: None,
            project_count: None,
            peak_demand_gw: None,
            queue_completion_pct: None,
            queue_cohort: String::new(),
            avg_queue_duration_months: None,
            qualitative_note: String::new(),
            source_price: String::new(),
            source_capacity: String::new(),
            source_peak: String::new(),
            source_queue: String::new(),
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey::new(self.view, self.year, &self.id)
    }

    /// Ledger cell for `column`; unknown columns render blank.
    pub fn value(&self, column: &str) -> String {
        let num = |v: Option<f64>| v.map(format_number).unwrap_or_default();
        match column {
            "view" => self.view.as_str().to_string(),
            "year" => self.year.to_string(),
            "id" => self.id.clone(),
            "name" => self.name.clone(),
            "region" => self.region.clone(),
            "is_estimate" => estimate_token(self.is_estimate).to_string(),
            "color_group" => self
                .color_group
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            "siting_regime" => self.siting_regime.clone(),
            "confidence" => self.confidence.clone(),
            "wholesale_price_mwh" => num(self.wholesale_price_mwh),
            "all_in_price_mwh" => num(self.all_in_price_mwh),
            "retail_price_cents_kwh" => num(self.retail_price_cents_kwh),
            "price_2023_mwh" => num(self.price_2023_mwh),
            "capacity_additions_mw" => num(self.capacity_additions_mw),
            "capacity_additions_elcc_mw" => num(self.capacity_additions_elcc_mw),
            "project_count" => self
                .project_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
            "peak_demand_gw" => num(self.peak_demand_gw),
            "queue_completion_pct" => num(self.queue_completion_pct),
            "queue_cohort" => self.queue_cohort.clone(),
            "avg_queue_duration_months" => num(self.avg_queue_duration_months),
            "qualitative_note" => self.qualitative_note.clone(),
            "source_price" => self.source_price.clone(),
            "source_capacity" => self.source_capacity.clone(),
            "source_peak" => self.source_peak.clone(),
            "source_queue" => self.source_queue.clone(),
            _ => String::new(),
        }
    }

    /// Cells in the order of `columns` (normally the ledger header).
    pub fn to_values(&self, columns: &[String]) -> Vec<String> {
        columns.iter().map(|c| self.value(c)).collect()
    }

    /// MW of nameplate additions per GW of system peak
    pub fn mw_per_gw_peak(&self) -> Option<f64> {
        per_gw_peak(self.capacity_additions_mw, self.peak_demand_gw)
    }

    /// ELCC-weighted MW of additions per GW of system peak
    pub fn elcc_mw_per_gw_peak(&self) -> Option<f64> {
        per_gw_peak(self.capacity_additions_elcc_mw, self.peak_demand_gw)
            .filter(|ratio| *ratio > 0.0)
    }
}

/// Capacity per GW of peak, one decimal; absent without a positive peak.
pub fn per_gw_peak(capacity_mw: Option<f64>, peak_gw: Option<f64>) -> Option<f64> {
    match (capacity_mw, peak_gw) {
        (Some(cap), Some(peak)) if peak > 0.0 => Some(crate::units::round_to(cap / peak, 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_columns_exclude_optional() {
        let required: Vec<_> = required_columns().collect();
        assert_eq!(required.len(), 23);
        assert!(!required.contains(&"siting_regime"));
        assert!(required.contains(&"source_queue"));
    }

    #[test]
    fn test_record_renders_in_column_order() {
        let mut record = MetricRecord::new(View::State, 2025, "TX");
        record.is_estimate = true;
        record.color_group = Some(ColorGroup::Functional);
        record.capacity_additions_mw = Some(80.0);
        record.capacity_additions_elcc_mw = Some(44.8);

        let columns: Vec<String> = LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect();
        let values = record.to_values(&columns);
        assert_eq!(values[0], "state");
        assert_eq!(values[1], "2025");
        assert_eq!(values[5], "True");
        assert_eq!(values[6], "functional");
        assert_eq!(values[13], "80");
        assert_eq!(values[14], "44.8");
        assert_eq!(values[9], "");
    }

    #[test]
    fn test_ledger_find_and_line_numbers() {
        let mut ledger = Ledger::with_schema();
        ledger.push_record(&MetricRecord::new(View::Iso, 2024, "PJM"));
        ledger.push_record(&MetricRecord::new(View::State, 2024, "PA"));

        let row = ledger.find(View::State, 2024, "PA").unwrap();
        assert_eq!(row.line, 3);
        assert_eq!(row.label(), "state/2024/PA");
        assert!(ledger.find(View::State, 2025, "PA").is_none());
        assert!(ledger.contains_key(&RowKey::new(View::Iso, 2024, "PJM")));
    }

    #[test]
    fn test_enum_tokens_are_exact() {
        assert_eq!("broken".parse::<ColorGroup>().unwrap(), ColorGroup::Broken);
        assert!("Broken".parse::<ColorGroup>().is_err());
        assert!("ISO".parse::<View>().is_err());
    }

    #[test]
    fn test_per_gw_peak_requires_positive_peak() {
        assert_eq!(per_gw_peak(Some(1000.0), Some(80.0)), Some(12.5));
        assert_eq!(per_gw_peak(Some(1000.0), Some(0.0)), None);
        assert_eq!(per_gw_peak(None, Some(80.0)), None);
    }
}
