//! EIA-860M generator inventory: capacity added in a target operating year.
//!
//! The monthly workbook carries a few title rows above the header; its
//! `Operating` sheet lists one generator per row. Generators are assigned to
//! an ISO through their balancing authority, falling back to the plant
//! state's ISO when the authority code is blank or unknown.

use std::collections::BTreeMap;

use esr_algo::elcc::{effective_capacity, CapacitySummary, ElccFactors};
use esr_core::diagnostics::Diagnostics;
use esr_core::registry;
use esr_core::technology::GenerationAsset;
use esr_core::units::{round_to, Megawatts};
use serde::Serialize;
use tracing::{debug, info};

use crate::columns::{AliasTable, MatchMode};
use crate::error::SourceError;
use crate::layout::{candidate_grid, discover_layout, LayoutRule, SheetRef};
use crate::sources::{SourceOutput, TabularSource};
use crate::table::{parse_number, Frame, Workbook};

pub const SOURCE_NAME: &str = "generators";

pub const GENERATOR_COLUMNS: AliasTable = AliasTable::new(
    MatchMode::Exact,
    &[
        ("plant state", "state"),
        ("state", "state"),
        ("nameplate capacity (mw)", "nameplate"),
        ("nameplate capacity", "nameplate"),
        ("technology", "technology"),
        ("operating year", "operating_year"),
        ("balancing authority code", "balancing_authority"),
        ("balancing authority", "balancing_authority"),
    ],
);

const REQUIRED: [&str; 4] = ["state", "nameplate", "technology", "operating_year"];

const SHEETS: [SheetRef; 2] = [SheetRef::Name("Operating"), SheetRef::Index(0)];

/// Read every generator row of an accepted frame.
///
/// Rows without a state or a positive nameplate are skipped and counted in a
/// single warning.
pub fn parse_assets(frame: &Frame, diagnostics: &mut Diagnostics) -> Result<Vec<GenerationAsset>, SourceError> {
    let mut index = BTreeMap::new();
    for concept in REQUIRED {
        let column = GENERATOR_COLUMNS
            .find(&frame.headers, concept)
            .ok_or_else(|| SourceError::SchemaMismatch {
                source_name: SOURCE_NAME.to_string(),
                concept: concept.to_string(),
                available: frame.headers.clone(),
            })?;
        index.insert(concept, column.index);
    }
    let ba_column = GENERATOR_COLUMNS
        .find(&frame.headers, "balancing_authority")
        .map(|m| m.index);

    let mut assets = Vec::new();
    let mut skipped = 0usize;
    for row in 0..frame.len() {
        let state = frame.cell(row, index["state"]);
        let nameplate = parse_number(frame.cell(row, index["nameplate"])).filter(|mw| *mw > 0.0);
        let (false, Some(nameplate)) = (state.is_empty(), nameplate) else {
            skipped += 1;
            continue;
        };
        let technology = match frame.cell(row, index["technology"]) {
            "" => "Unknown",
            label => label,
        };
        let operating_year = parse_number(frame.cell(row, index["operating_year"])).map(|y| y as i32);
        let balancing_authority = ba_column
            .map(|col| frame.cell(row, col))
            .filter(|code| !code.is_empty())
            .map(str::to_string);

        assets.push(GenerationAsset {
            state: state.to_string(),
            balancing_authority,
            nameplate: Megawatts(nameplate),
            technology: technology.to_string(),
            operating_year,
        });
    }

    if skipped > 0 {
        diagnostics.add_warning(
            "row",
            &format!("{} generator rows skipped (blank state or no positive nameplate)", skipped),
        );
    }
    Ok(assets)
}

/// ISO for an asset: balancing authority first, then plant state.
pub fn asset_iso(asset: &GenerationAsset) -> Option<&'static str> {
    asset
        .balancing_authority
        .as_deref()
        .and_then(registry::iso_for_ba)
        .or_else(|| registry::parent_iso(&asset.state))
        .map(|iso| iso.id)
}

/// Nameplate additions plus the ELCC-weighted view of the same generators
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdditionsOutput {
    /// Nameplate MW per ISO, with layout and provenance
    pub nameplate: SourceOutput,
    pub effective: BTreeMap<String, f64>,
    pub project_counts: BTreeMap<String, u32>,
    /// Generators of the target year, kept for the state roll-forward
    pub assets: Vec<GenerationAsset>,
}

#[derive(Debug, Clone)]
pub struct GeneratorAdditions {
    pub year: i32,
    pub factors: ElccFactors,
}

impl GeneratorAdditions {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            factors: ElccFactors::default(),
        }
    }

    pub fn with_factors(mut self, factors: ElccFactors) -> Self {
        self.factors = factors;
        self
    }

    /// Group target-year assets per tracked ISO and weight them.
    pub fn summarize(&self, assets: &[GenerationAsset]) -> BTreeMap<&'static str, CapacitySummary> {
        let mut grouped: BTreeMap<&'static str, Vec<GenerationAsset>> = BTreeMap::new();
        let mut untracked = 0usize;
        for asset in assets.iter().filter(|a| a.operating_year == Some(self.year)) {
            match asset_iso(asset) {
                Some(iso) => grouped.entry(iso).or_default().push(asset.clone()),
                None => untracked += 1,
            }
        }
        debug!(year = self.year, untracked, "generators outside tracked ISOs");

        grouped
            .into_iter()
            .map(|(iso, assets)| (iso, effective_capacity(&assets, iso, &self.factors)))
            .collect()
    }
}

impl TabularSource for GeneratorAdditions {
    type Output = AdditionsOutput;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn normalize(&self, workbook: &Workbook) -> Result<AdditionsOutput, SourceError> {
        let candidates = candidate_grid(&SHEETS, 0..=3);
        let (layout, frame) = discover_layout(
            SOURCE_NAME,
            workbook,
            &candidates,
            LayoutRule::MinNumericColumns(2),
        )?;

        let mut output = AdditionsOutput::default();
        let assets = parse_assets(&frame, &mut output.nameplate.diagnostics)?;
        output.nameplate.used_columns = GENERATOR_COLUMNS
            .resolve_first(&frame.headers)
            .into_iter()
            .map(|m| m.header)
            .collect();

        for (iso, summary) in self.summarize(&assets) {
            output.nameplate.insert(
                iso,
                round_to(summary.nameplate.value(), 1),
                format!("EIA-860M {} (operating year {})", layout, self.year),
            );
            output
                .effective
                .insert(iso.to_string(), round_to(summary.effective.value(), 1));
            output
                .project_counts
                .insert(iso.to_string(), summary.project_count as u32);
        }
        output.assets = assets
            .into_iter()
            .filter(|a| a.operating_year == Some(self.year))
            .collect();

        info!(
            source = SOURCE_NAME,
            year = self.year,
            layout = %layout,
            generators = output.assets.len(),
            isos = ?output.nameplate.entities(),
            "normalized generator additions"
        );
        output.nameplate.layout = Some(layout);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Sheet;

    const FIXTURE: &str = "\
Monthly Generator Inventory,,,,,\n\
January 2026,,,,,\n\
Plant State,Balancing Authority Code,Nameplate Capacity (MW),Technology,Operating Year,Generator ID\n\
TX,ERCO,50,Solar Photovoltaic,2025,1\n\
TX,ERCO,30,Natural Gas Fired Combustion Turbine,2025,2\n\
AR,SWPP,100,Onshore Wind Turbine,2025,3\n\
AR,,20,Batteries,2025,4\n\
WA,BPAT,300,Onshore Wind Turbine,2025,5\n\
IL,MISO,75,Solar Photovoltaic,2024,6\n\
,MISO,10,Batteries,2025,7\n\
OH,PJM,0,Batteries,2025,8\n";

    fn workbook() -> Workbook {
        Workbook::new(
            "memory",
            vec![Sheet::from_reader("Operating", FIXTURE.as_bytes()).unwrap()],
        )
    }

    #[test]
    fn test_additions_grouped_by_balancing_authority_then_state() {
        let output = GeneratorAdditions::new(2025).normalize(&workbook()).unwrap();

        assert_eq!(output.nameplate.layout.as_ref().unwrap().header_row, 2);
        assert_eq!(output.nameplate.values["ERCOT"], 80.0);
        assert_eq!(output.effective["ERCOT"], 44.8);
        assert_eq!(output.project_counts["ERCOT"], 2);
        // AR wind sits in SPP by authority, the AR battery in MISO by state
        assert_eq!(output.nameplate.values["SPP"], 100.0);
        assert_eq!(output.effective["SPP"], 22.5);
        assert_eq!(output.nameplate.values["MISO"], 20.0);
        assert!(!output.nameplate.values.contains_key("PJM"));
        assert_eq!(output.assets.len(), 5);
        assert_eq!(output.nameplate.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_missing_required_column() {
        let wb = Workbook::new(
            "memory",
            vec![Sheet::from_reader(
                "Operating",
                "Plant State,Nameplate Capacity (MW),Operating Year\nTX,1,2025\nTX,2,2025\n".as_bytes(),
            )
            .unwrap()],
        );
        let err = GeneratorAdditions::new(2025).normalize(&wb).unwrap_err();
        match err {
            SourceError::SchemaMismatch { concept, available, .. } => {
                assert_eq!(concept, "technology");
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_asset_iso_prefers_balancing_authority() {
        let mut asset = GenerationAsset::new("AR", 1.0, "Batteries", 2025);
        assert_eq!(asset_iso(&asset), Some("MISO"));
        asset.balancing_authority = Some("swpp".into());
        assert_eq!(asset_iso(&asset), Some("SPP"));
        asset.balancing_authority = Some("TVA".into());
        assert_eq!(asset_iso(&asset), Some("MISO"));
        asset.state = "WA".into();
        assert_eq!(asset_iso(&asset), None);
    }
}
