//! Wholesale hub prices.
//!
//! Hub columns are matched by substring because EIA renames them between
//! vintages. SPP and NYISO hubs are rarely present in the download; those
//! ISOs take their annual average from the market monitor reports below when
//! no column matched.

use esr_core::units::round_to;
use tracing::{info, warn};

use crate::columns::{AliasTable, ColumnMatch, MatchMode};
use crate::error::SourceError;
use crate::layout::{candidate_grid, discover_layout, LayoutRule, SheetRef};
use crate::sources::{SourceOutput, TabularSource};
use crate::table::Workbook;

pub const SOURCE_NAME: &str = "wholesale";

pub const HUB_ALIASES: AliasTable = AliasTable::new(
    MatchMode::Contains,
    &[
        ("ercot north", "ERCOT"),
        ("ercot", "ERCOT"),
        ("indiana hub", "MISO"),
        ("indiana", "MISO"),
        ("sp15", "CAISO"),
        ("sp-15", "CAISO"),
        ("sp 15", "CAISO"),
        ("pjm west", "PJM"),
        ("pjm-west", "PJM"),
        ("mass hub", "ISO-NE"),
        ("nepool", "ISO-NE"),
    ],
);

/// Annual averages for ISOs whose hubs the download does not carry reliably.
pub const FALLBACK_PRICES: &[(&str, f64, &str)] = &[
    ("SPP", 27.56, "SPP 2024 Annual SOM Report (DA system avg)"),
    (
        "NYISO",
        38.0,
        "Potomac Economics 2024 NYISO SOM (est. system-wide DA avg)",
    ),
];

const SHEETS: [SheetRef; 4] = [
    SheetRef::Index(0),
    SheetRef::Name("Hub Prices"),
    SheetRef::Name("Wholesale Prices"),
    SheetRef::Name("Data"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct WholesalePrices;

impl TabularSource for WholesalePrices {
    type Output = SourceOutput;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn normalize(&self, workbook: &Workbook) -> Result<SourceOutput, SourceError> {
        let candidates = candidate_grid(&SHEETS, 0..=3);
        let (layout, frame) = discover_layout(
            SOURCE_NAME,
            workbook,
            &candidates,
            LayoutRule::MinNumericColumns(2),
        )?;

        // candidate columns per ISO, ISOs in order of first appearance
        let mut hubs: Vec<(&'static str, Vec<ColumnMatch>)> = Vec::new();
        for column in HUB_ALIASES.resolve(&frame.headers) {
            match hubs.iter_mut().find(|(iso, _)| *iso == column.concept) {
                Some((_, columns)) => columns.push(column),
                None => hubs.push((column.concept, vec![column])),
            }
        }

        let mut output = SourceOutput::default();
        for (iso, columns) in hubs {
            for column in columns {
                let values = frame.numeric_values(column.index);
                if values.is_empty() {
                    output.diagnostics.add_warning_with_entity(
                        "column",
                        &format!("hub column '{}' has no numeric cells", column.header),
                        iso,
                    );
                    continue;
                }
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                output.insert(
                    iso,
                    round_to(mean, 2),
                    format!(
                        "{} column '{}' (mean of {} values)",
                        layout, column.header, values.len()
                    ),
                );
                output.used_columns.push(column.header);
                break;
            }
        }

        for (iso, price, citation) in FALLBACK_PRICES {
            if !output.values.contains_key(*iso) {
                warn!(iso, price, "hub not in download, using market monitor fallback");
                output.insert(iso, *price, *citation);
            }
        }

        info!(
            source = SOURCE_NAME,
            layout = %layout,
            isos = ?output.entities(),
            "normalized wholesale prices"
        );
        output.layout = Some(layout);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Sheet;

    fn workbook(text: &str) -> Workbook {
        Workbook::new("memory", vec![Sheet::from_reader("prices", text.as_bytes()).unwrap()])
    }

    #[test]
    fn test_hub_means_and_fallbacks() {
        let wb = workbook(
            "Month,ERCOT North Hub,Indiana Hub,SP15,PJM West,Mass Hub\n\
             Jan,30.111,35,50,40,60\n\
             Feb,31.002,37,,42,58\n\
             Mar,n/a,39,54,44,59\n",
        );
        let output = WholesalePrices.normalize(&wb).unwrap();
        assert_eq!(output.values["ERCOT"], 30.56);
        assert_eq!(output.values["MISO"], 37.0);
        assert_eq!(output.values["CAISO"], 52.0);
        assert_eq!(output.values["ISO-NE"], 59.0);
        assert_eq!(output.values["SPP"], 27.56);
        assert_eq!(output.values["NYISO"], 38.0);
        assert_eq!(
            output.provenance["SPP"],
            "SPP 2024 Annual SOM Report (DA system avg)"
        );
        assert_eq!(output.used_columns.len(), 5);
    }

    #[test]
    fn test_substring_match_leaves_spp_on_fallback() {
        let wb = workbook("Date,SPP South Hub ercot,PJM West\nJan,20,40\nFeb,22,42\n");
        let output = WholesalePrices.normalize(&wb).unwrap();
        // the substring "ercot" claims the column for ERCOT, SPP stays on fallback
        assert_eq!(output.values["ERCOT"], 21.0);
        assert_eq!(output.values["SPP"], 27.56);
    }

    #[test]
    fn test_skips_text_column_for_later_hub_column() {
        let wb = workbook(
            "Date,ERCOT Notes,ERCOT North Hub,PJM West
             Jan,see memo,30,40
             Feb,revised,32,42
",
        );
        let output = WholesalePrices.normalize(&wb).unwrap();
        assert_eq!(output.values["ERCOT"], 31.0);
        assert_eq!(output.values["PJM"], 41.0);
        assert!(output.provenance["ERCOT"].contains("'ERCOT North Hub'"));
        assert_eq!(output.used_columns, vec!["ERCOT North Hub", "PJM West"]);
        assert!(output
            .diagnostics
            .warnings()
            .any(|w| w.message.contains("'ERCOT Notes'")));
    }

    #[test]
    fn test_layout_not_found() {
        let wb = workbook("only,text\nhere,too\n");
        let err = WholesalePrices.normalize(&wb).unwrap_err();
        match err {
            SourceError::LayoutNotFound { tried, .. } => assert_eq!(tried.len(), 16),
            other => panic!("unexpected error: {other}"),
        }
    }
}
