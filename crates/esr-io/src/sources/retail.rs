//! Average retail price by state (EIA Electric Power Monthly, table 5.6.B).
//!
//! The table lists one row per state (plus census-division subtotals) with
//! a price column per sector; the first "All Sectors" column is the current
//! period. Values are cents/kWh, keyed here by state code.

use esr_core::registry;
use esr_core::units::round_to;
use tracing::info;

use crate::columns::{AliasTable, MatchMode};
use crate::error::SourceError;
use crate::layout::{candidate_grid, discover_layout, LayoutRule, SheetRef};
use crate::sources::{SourceOutput, TabularSource};
use crate::table::{parse_number, Workbook};

pub const SOURCE_NAME: &str = "retail";

pub const RETAIL_COLUMNS: AliasTable = AliasTable::new(
    MatchMode::Contains,
    &[("all sectors", "all_sectors"), ("state", "state")],
);

#[derive(Debug, Clone, Copy, Default)]
pub struct RetailPrices;

impl TabularSource for RetailPrices {
    type Output = SourceOutput;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn normalize(&self, workbook: &Workbook) -> Result<SourceOutput, SourceError> {
        let candidates = candidate_grid(&[SheetRef::Index(0)], 0..=5);
        let (layout, frame) = discover_layout(
            SOURCE_NAME,
            workbook,
            &candidates,
            LayoutRule::MinNumericColumns(1),
        )?;

        let price_column = RETAIL_COLUMNS
            .find(&frame.headers, "all_sectors")
            .ok_or_else(|| SourceError::SchemaMismatch {
                source_name: SOURCE_NAME.to_string(),
                concept: "all_sectors".to_string(),
                available: frame.headers.clone(),
            })?;
        // the state name column is usually unlabeled or "Census Division and State"
        let state_index = RETAIL_COLUMNS
            .find(&frame.headers, "state")
            .map(|m| m.index)
            .unwrap_or(0);

        let mut output = SourceOutput::default();
        output.used_columns = vec![
            frame.headers.get(state_index).cloned().unwrap_or_default(),
            price_column.header.clone(),
        ];

        for row in 0..frame.len() {
            let Some(state) = registry::state_by_name(frame.cell(row, state_index)) else {
                continue;
            };
            match parse_number(frame.cell(row, price_column.index)) {
                Some(price) => output.insert(
                    state.code,
                    round_to(price, 2),
                    format!("EIA EPM 5.6.B {} column '{}'", layout, price_column.header),
                ),
                None => output.diagnostics.add_warning_with_entity(
                    "value",
                    &format!(
                        "non-numeric retail price '{}'",
                        frame.cell(row, price_column.index)
                    ),
                    state.code,
                ),
            }
        }

        for state in registry::state_list() {
            if !output.values.contains_key(state.code) {
                output
                    .diagnostics
                    .add_warning_with_entity("value", "no retail price", state.code);
            }
        }

        info!(
            source = SOURCE_NAME,
            layout = %layout,
            states = output.len(),
            "normalized retail prices"
        );
        output.layout = Some(layout);
        Ok(output)
    }
}
