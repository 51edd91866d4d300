//! Ledger validation engine.
//!
//! A pure function of the ledger snapshot: it does not know whether a row
//! came from a normalizer, the roll-forward deriver or a hand edit. Checks
//! run in a fixed order and every violation is collected, so a curator sees
//! all problems in one pass:
//!
//! 1. required columns present (missing columns stop the run)
//! 2. unexpected columns (warning only)
//! 3. duplicate `(view, year, id)` keys, reported at the later row
//! 4. per-row invariants: enum tokens, numeric cells, price and capacity
//!    ordering, ISO source citations

use std::collections::HashSet;

use esr_core::diagnostics::Diagnostics;
use esr_core::error::{EsrError, EsrResult};
use esr_core::record::{
    parse_optional_number, required_columns, Ledger, LedgerRow, LEDGER_COLUMNS,
    NUMERIC_COLUMNS, SOURCE_COLUMNS,
};
use tracing::info;

const VALID_VIEWS: [&str; 2] = ["iso", "state"];
const VALID_COLOR_GROUPS: [&str; 3] = ["functional", "intermediate", "broken"];
const VALID_IS_ESTIMATE: [&str; 2] = ["True", "False"];

/// Validate the full ledger. Errors and warnings are independent lists in
/// the returned diagnostics.
pub fn validate_ledger(ledger: &Ledger) -> Diagnostics {
    let mut diag = Diagnostics::new();

    if !check_columns(ledger, &mut diag) {
        return diag;
    }
    check_duplicates(ledger, &mut diag);
    for row in &ledger.rows {
        check_row(row, &mut diag);
    }

    info!(
        rows = ledger.len(),
        errors = diag.error_count(),
        warnings = diag.warning_count(),
        "validated ledger"
    );
    diag
}

/// Validate and turn any error into [`EsrError::Validation`].
///
/// The error message lists every error issue; warnings are returned on
/// success.
pub fn ensure_valid(ledger: &Ledger) -> EsrResult<Diagnostics> {
    let diag = validate_ledger(ledger);
    if diag.has_errors() {
        let issues: Vec<String> = diag.errors().map(|issue| issue.to_string()).collect();
        return Err(EsrError::Validation(format!(
            "{} error(s) found in {} rows: {}",
            diag.error_count(),
            ledger.len(),
            issues.join("; ")
        )));
    }
    Ok(diag)
}

/// Returns false when required columns are missing.
fn check_columns(ledger: &Ledger, diag: &mut Diagnostics) -> bool {
    let missing: Vec<&str> = required_columns()
        .filter(|c| !ledger.columns.iter().any(|h| h == c))
        .collect();
    let extra: Vec<&str> = ledger
        .columns
        .iter()
        .map(String::as_str)
        .filter(|h| !LEDGER_COLUMNS.contains(h))
        .collect();

    if !extra.is_empty() {
        diag.add_warning("columns", &format!("Extra columns (ignored): {:?}", extra));
    }
    if !missing.is_empty() {
        diag.add_error("columns", &format!("Missing columns: {:?}", missing));
        return false;
    }
    true
}

fn check_duplicates(ledger: &Ledger, diag: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for row in &ledger.rows {
        let key = row.key();
        if seen.contains(&key) {
            diag.add_row_error(
                "duplicate",
                &format!("Duplicate row {}", key),
                row.line,
                &row.label(),
            );
        } else {
            seen.insert(key);
        }
    }
}

fn check_row(row: &LedgerRow, diag: &mut Diagnostics) {
    let label = row.label();
    let mut error = |category: &str, message: String| {
        diag.add_row_error(category, &message, row.line, &label);
    };

    let view = row.get("view");
    if !VALID_VIEWS.contains(&view) {
        error("enum", format!("Invalid view '{}'", view));
    }
    let color = row.get("color_group");
    if !VALID_COLOR_GROUPS.contains(&color) {
        error("enum", format!("Invalid color_group '{}'", color));
    }
    let estimate = row.get("is_estimate");
    if !VALID_IS_ESTIMATE.contains(&estimate) {
        error("enum", format!("Invalid is_estimate '{}'", estimate));
    }

    for field in NUMERIC_COLUMNS {
        let value = row.get(field).trim();
        if !value.is_empty() && value.parse::<f64>().is_err() {
            error("numeric", format!("Non-numeric {}='{}'", field, value));
        }
    }

    // malformed cells were reported above; ordering checks need both numbers
    let number = |field: &str| parse_optional_number(row.get(field)).ok().flatten();

    if let (Some(wholesale), Some(all_in)) =
        (number("wholesale_price_mwh"), number("all_in_price_mwh"))
    {
        if all_in < wholesale {
            error(
                "cross-field",
                format!("all_in_price < wholesale_price ({} < {})", all_in, wholesale),
            );
        }
    }

    if let (Some(nameplate), Some(elcc)) = (
        number("capacity_additions_mw"),
        number("capacity_additions_elcc_mw"),
    ) {
        if elcc > nameplate {
            error(
                "cross-field",
                format!("ELCC > nameplate capacity ({} > {})", elcc, nameplate),
            );
        }
    }

    if view == "iso" {
        for column in SOURCE_COLUMNS {
            if row.get(column).trim().is_empty() {
                error("citation", format!("Missing {} for ISO row", column));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esr_core::record::{ColorGroup, MetricRecord, View};

    fn iso_record(year: i32, id: &str) -> MetricRecord {
        let mut record = MetricRecord::new(View::Iso, year, id);
        record.name = id.to_string();
        record.color_group = Some(ColorGroup::Intermediate);
        record.wholesale_price_mwh = Some(30.0);
        record.all_in_price_mwh = Some(45.0);
        record.capacity_additions_mw = Some(100.0);
        record.capacity_additions_elcc_mw = Some(60.0);
        record.source_price = "EIA".into();
        record.source_capacity = "EIA-860M".into();
        record.source_peak = "EIA-930".into();
        record.source_queue = "LBNL".into();
        record
    }

    fn ledger_of(records: &[MetricRecord]) -> Ledger {
        let mut ledger = Ledger::with_schema();
        for record in records {
            ledger.push_record(record);
        }
        ledger
    }

    #[test]
    fn test_clean_ledger_passes() {
        let diag = validate_ledger(&ledger_of(&[iso_record(2024, "PJM"), iso_record(2024, "MISO")]));
        assert!(!diag.has_issues(), "{diag}");
        assert!(ensure_valid(&ledger_of(&[iso_record(2024, "PJM")])).is_ok());
    }

    #[test]
    fn test_missing_required_column_stops_validation() {
        let mut ledger = ledger_of(&[iso_record(2024, "PJM")]);
        ledger.columns.retain(|c| c != "source_peak");
        ledger.rows[0].set("color_group", "green");

        let diag = validate_ledger(&ledger);
        assert_eq!(diag.error_count(), 1);
        let message = &diag.errors().next().unwrap().message;
        assert!(message.contains("source_peak"), "{message}");
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let mut ledger = ledger_of(&[iso_record(2024, "PJM")]);
        ledger
            .columns
            .retain(|c| c != "siting_regime" && c != "avg_queue_duration_months");
        assert!(!validate_ledger(&ledger).has_issues());
    }

    #[test]
    fn test_extra_column_is_only_a_warning() {
        let mut ledger = ledger_of(&[iso_record(2024, "PJM")]);
        ledger.columns.push("reviewer".into());
        let diag = validate_ledger(&ledger);
        assert_eq!(diag.error_count(), 0);
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.warnings().next().unwrap().message.contains("reviewer"));
    }

    #[test]
    fn test_duplicate_reported_once_at_second_row() {
        let mut second = iso_record(2024, "PJM");
        second.qualitative_note = "revised".into();
        let diag = validate_ledger(&ledger_of(&[iso_record(2024, "PJM"), second]));

        let duplicates: Vec<_> = diag.issues_by_category("duplicate").collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].line, Some(3));
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn test_all_in_below_wholesale() {
        let mut record = iso_record(2024, "NYISO");
        record.wholesale_price_mwh = Some(30.0);
        record.all_in_price_mwh = Some(25.0);
        let diag = validate_ledger(&ledger_of(&[record]));

        assert_eq!(diag.error_count(), 1);
        let issue = diag.errors().next().unwrap();
        assert!(issue.message.contains("all_in_price < wholesale_price"));
        assert_eq!(issue.line, Some(2));
    }

    #[test]
    fn test_elcc_above_nameplate() {
        let mut record = iso_record(2024, "SPP");
        record.capacity_additions_mw = Some(100.0);
        record.capacity_additions_elcc_mw = Some(120.0);
        let diag = validate_ledger(&ledger_of(&[record]));

        assert_eq!(diag.error_count(), 1);
        assert!(diag
            .errors()
            .next()
            .unwrap()
            .message
            .contains("ELCC > nameplate capacity"));
    }

    #[test]
    fn test_row_can_collect_several_errors() {
        let mut ledger = ledger_of(&[iso_record(2024, "ERCOT")]);
        let row = &mut ledger.rows[0];
        row.set("is_estimate", "true");
        row.set("color_group", "");
        row.set("peak_demand_gw", "85,5");
        row.set("source_queue", " ");

        let diag = validate_ledger(&ledger);
        assert_eq!(diag.error_count(), 4, "{diag}");
        assert_eq!(diag.issues_by_category("enum").count(), 2);
        assert_eq!(diag.issues_by_category("numeric").count(), 1);
        assert_eq!(diag.issues_by_category("citation").count(), 1);
    }

    #[test]
    fn test_state_rows_need_no_citations() {
        let mut record = MetricRecord::new(View::State, 2025, "TX");
        record.color_group = Some(ColorGroup::Functional);
        assert!(!validate_ledger(&ledger_of(&[record])).has_errors());
    }

    #[test]
    fn test_non_numeric_cell_skips_cross_field_check() {
        let mut ledger = ledger_of(&[iso_record(2024, "CAISO")]);
        ledger.rows[0].set("all_in_price_mwh", "n/a");
        let diag = validate_ledger(&ledger);
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.issues_by_category("numeric").count(), 1);
    }

    #[test]
    fn test_ensure_valid_reports_error_count() {
        let mut record = iso_record(2024, "PJM");
        record.source_price.clear();
        let err = ensure_valid(&ledger_of(&[record])).unwrap_err();
        assert!(err.to_string().contains("1 error(s) found in 1 rows"));
        assert!(err.to_string().contains("Line 2 (iso/2024/PJM)"));
    }
}
