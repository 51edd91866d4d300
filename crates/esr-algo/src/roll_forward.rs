//! Roll-forward of ISO estimates down to state rows for a new period.
//!
//! A state's new row combines three inputs:
//!
//! - **parent ISO, same period**: wholesale and all-in price
//! - **fresh sources**: nameplate and ELCC-weighted additions from the
//!   state's own generators, and the retail price matched by state name
//! - **the state itself, prior period**: every qualitative field (color,
//!   siting regime, peak proxy, queue metrics, note, queue citation)
//!
//! Missing inputs never abort the run. The affected fields stay empty and a
//! warning is recorded; the validation engine decides whether the resulting
//! row is acceptable.

use std::collections::BTreeMap;

use esr_core::diagnostics::Diagnostics;
use esr_core::record::{parse_optional_number, ColorGroup, Ledger, LedgerRow, MetricRecord, View};
use esr_core::registry::{self, State};
use esr_core::technology::GenerationAsset;
use tracing::{info, warn};

use crate::elcc::{effective_capacity, ElccFactors};

pub const DEFAULT_CAPACITY_SOURCE: &str = "EIA-860M (operating year of the derived period)";

/// Inputs read by the deriver. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct RollForwardInputs<'a> {
    /// Full ledger snapshot (ISO rows for the new period, state rows for the
    /// prior one)
    pub ledger: &'a Ledger,
    /// Generator roster; filtered to each state and the new year
    pub assets: &'a [GenerationAsset],
    /// State code → retail price (cents/kWh)
    pub retail_prices: &'a BTreeMap<String, f64>,
    pub factors: &'a ElccFactors,
}

#[derive(Debug, Clone, Default)]
pub struct RollForwardOutcome {
    pub records: Vec<MetricRecord>,
    pub diagnostics: Diagnostics,
}

/// Derives state rows for `year` from the ledger and fresh sources
#[derive(Debug, Clone)]
pub struct RollForward {
    pub year: i32,
    /// Citation written to `source_capacity`
    pub capacity_source: String,
    pub states: Vec<State>,
}

impl RollForward {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            capacity_source: DEFAULT_CAPACITY_SOURCE.to_string(),
            states: registry::state_list().to_vec(),
        }
    }

    pub fn with_capacity_source(mut self, source: impl Into<String>) -> Self {
        self.capacity_source = source.into();
        self
    }

    pub fn with_states(mut self, states: Vec<State>) -> Self {
        self.states = states;
        self
    }

    pub fn derive(&self, inputs: RollForwardInputs<'_>) -> RollForwardOutcome {
        let mut outcome = RollForwardOutcome::default();

        for state in &self.states {
            let entity = format!("state/{}/{}", self.year, state.code);
            if inputs.ledger.find(View::State, self.year, state.code).is_some() {
                warn!(state = state.code, year = self.year, "row already in ledger, skipping");
                outcome.diagnostics.add_warning_with_entity(
                    "roll-forward",
                    "row already present in the ledger; not derived again",
                    &entity,
                );
                continue;
            }
            let record = self.derive_state(state, inputs, &entity, &mut outcome.diagnostics);
            outcome.records.push(record);
        }

        info!(
            year = self.year,
            rows = outcome.records.len(),
            warnings = outcome.diagnostics.warning_count(),
            "rolled forward state rows"
        );
        outcome
    }

    fn derive_state(
        &self,
        state: &State,
        inputs: RollForwardInputs<'_>,
        entity: &str,
        diag: &mut Diagnostics,
    ) -> MetricRecord {
        let prior_year = self.year - 1;
        let mut record = MetricRecord::new(View::State, self.year, state.code);
        record.is_estimate = true;
        record.confidence = "estimated".to_string();
        record.name = state.name.to_string();

        // parent ISO, same period
        match inputs.ledger.find(View::Iso, self.year, state.iso) {
            Some(iso_row) => {
                record.wholesale_price_mwh =
                    inherit_number(iso_row, "wholesale_price_mwh", entity, diag);
                record.all_in_price_mwh = inherit_number(iso_row, "all_in_price_mwh", entity, diag);
            }
            None => {
                let message = format!(
                    "no {} {} ISO row; price fields left empty",
                    state.iso, self.year
                );
                warn!(state = state.code, "{message}");
                diag.add_warning_with_entity("roll-forward", &message, entity);
            }
        }
        record.source_price = format!("Inherited from {} {} estimate", state.iso, self.year);

        // fresh generator roster
        let state_assets: Vec<GenerationAsset> = inputs
            .assets
            .iter()
            .filter(|a| a.state.trim().eq_ignore_ascii_case(state.code))
            .filter(|a| a.operating_year == Some(self.year))
            .cloned()
            .collect();
        let summary = effective_capacity(&state_assets, state.iso, inputs.factors);
        record.capacity_additions_mw = Some(summary.nameplate.value().round());
        record.capacity_additions_elcc_mw = Some(summary.effective.value().round());
        record.project_count = Some(summary.project_count as u32);
        record.source_capacity = self.capacity_source.clone();

        // retail table, matched by state name upstream
        match inputs.retail_prices.get(state.code) {
            Some(price) => record.retail_price_cents_kwh = Some(*price),
            None => {
                warn!(state = state.code, "retail price missing");
                diag.add_warning_with_entity(
                    "roll-forward",
                    "retail price missing; retail_price_cents_kwh left empty",
                    entity,
                );
            }
        }

        // the state's own prior-period row
        match inputs.ledger.find(View::State, prior_year, state.code) {
            Some(prev) => self.inherit_prior(&mut record, prev, entity, diag),
            None => {
                let message = format!(
                    "no {} state row for {}; qualitative fields left empty",
                    prior_year, state.code
                );
                warn!(state = state.code, "{message}");
                diag.add_warning_with_entity("roll-forward", &message, entity);
                record.source_peak = format!("{} proxy", prior_year);
            }
        }

        record
    }

    fn inherit_prior(
        &self,
        record: &mut MetricRecord,
        prev: &LedgerRow,
        entity: &str,
        diag: &mut Diagnostics,
    ) {
        if !prev.get("name").trim().is_empty() {
            record.name = prev.get("name").to_string();
        }
        record.region = prev.get("region").to_string();
        record.siting_regime = prev.get("siting_regime").to_string();
        record.color_group = match prev.get("color_group").parse::<ColorGroup>() {
            Ok(color) => Some(color),
            Err(err) => {
                diag.add_warning_with_entity("roll-forward", &format!("prior row has {err}"), entity);
                None
            }
        };
        record.peak_demand_gw = inherit_number(prev, "peak_demand_gw", entity, diag);
        record.queue_completion_pct = inherit_number(prev, "queue_completion_pct", entity, diag);
        record.queue_cohort = prev.get("queue_cohort").to_string();
        record.avg_queue_duration_months =
            inherit_number(prev, "avg_queue_duration_months", entity, diag);
        record.qualitative_note = prev.get("qualitative_note").to_string();
        record.source_queue = prev.get("source_queue").to_string();

        let prior_peak = prev.get("source_peak").trim();
        record.source_peak = if prior_peak.is_empty() {
            format!("{} proxy", self.year - 1)
        } else {
            format!("{} proxy ({})", self.year - 1, prior_peak)
        };
    }
}

/// Copy a numeric cell; a malformed source cell becomes a warning.
fn inherit_number(row: &LedgerRow, column: &str, entity: &str, diag: &mut Diagnostics) -> Option<f64> {
    match parse_optional_number(row.get(column)) {
        Ok(value) => value,
        Err(_) => {
            diag.add_warning_with_entity(
                "roll-forward",
                &format!(
                    "cannot inherit {}='{}' from line {}",
                    column,
                    row.get(column),
                    row.line
                ),
                entity,
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texas_only() -> Vec<State> {
        vec![*registry::lookup_state("TX").unwrap()]
    }

    fn seeded_ledger() -> Ledger {
        let mut ledger = Ledger::with_schema();

        let mut iso = MetricRecord::new(View::Iso, 2025, "ERCOT");
        iso.wholesale_price_mwh = Some(31.2);
        iso.all_in_price_mwh = Some(38.9);
        ledger.push_record(&iso);

        let mut prev = MetricRecord::new(View::State, 2024, "TX");
        prev.name = "Texas".into();
        prev.region = "South Central".into();
        prev.color_group = Some(ColorGroup::Functional);
        prev.siting_regime = "permissive".into();
        prev.peak_demand_gw = Some(85.5);
        prev.queue_completion_pct = Some(23.4);
        prev.queue_cohort = "2015-2020".into();
        prev.qualitative_note = "energy-only market".into();
        prev.source_peak = "EIA-861".into();
        prev.source_queue = "LBNL Queued Up 2024".into();
        ledger.push_record(&prev);

        ledger
    }

    #[test]
    fn test_roll_forward_combines_all_three_inputs() {
        let ledger = seeded_ledger();
        let assets = vec![
            GenerationAsset::new("TX", 50.0, "Solar Photovoltaic", 2025),
            GenerationAsset::new("TX", 30.0, "Natural Gas Fired Combined Cycle", 2025),
            GenerationAsset::new("TX", 500.0, "Batteries", 2024),
            GenerationAsset::new("OK", 70.0, "Onshore Wind Turbine", 2025),
        ];
        let retail = BTreeMap::from([("TX".to_string(), 15.31)]);
        let factors = ElccFactors::default();

        let outcome = RollForward::new(2025).with_states(texas_only()).derive(RollForwardInputs {
            ledger: &ledger,
            assets: &assets,
            retail_prices: &retail,
            factors: &factors,
        });

        assert!(!outcome.diagnostics.has_issues(), "{}", outcome.diagnostics);
        let row = &outcome.records[0];
        assert_eq!(row.capacity_additions_mw, Some(80.0));
        assert_eq!(row.capacity_additions_elcc_mw, Some(45.0));
        assert_eq!(row.project_count, Some(2));
        assert_eq!(row.wholesale_price_mwh, Some(31.2));
        assert_eq!(row.all_in_price_mwh, Some(38.9));
        assert_eq!(row.retail_price_cents_kwh, Some(15.31));
        assert_eq!(row.queue_cohort, "2015-2020");
        assert_eq!(row.color_group, Some(ColorGroup::Functional));
        assert_eq!(row.peak_demand_gw, Some(85.5));
        assert_eq!(row.source_price, "Inherited from ERCOT 2025 estimate");
        assert_eq!(row.source_peak, "2024 proxy (EIA-861)");
        assert_eq!(row.source_queue, "LBNL Queued Up 2024");
        assert!(row.is_estimate);
    }

    #[test]
    fn test_missing_inputs_become_warnings() {
        let ledger = Ledger::with_schema();
        let factors = ElccFactors::default();
        let outcome = RollForward::new(2025).with_states(texas_only()).derive(RollForwardInputs {
            ledger: &ledger,
            assets: &[],
            retail_prices: &BTreeMap::new(),
            factors: &factors,
        });

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.diagnostics.warning_count(), 3);
        assert_eq!(outcome.diagnostics.error_count(), 0);
        let row = &outcome.records[0];
        assert_eq!(row.wholesale_price_mwh, None);
        assert_eq!(row.retail_price_cents_kwh, None);
        assert_eq!(row.color_group, None);
        assert_eq!(row.capacity_additions_mw, Some(0.0));
        assert_eq!(row.name, "Texas");
    }

    #[test]
    fn test_existing_key_is_not_derived_again() {
        let mut ledger = seeded_ledger();
        ledger.push_record(&MetricRecord::new(View::State, 2025, "TX"));
        let factors = ElccFactors::default();
        let outcome = RollForward::new(2025).with_states(texas_only()).derive(RollForwardInputs {
            ledger: &ledger,
            assets: &[],
            retail_prices: &BTreeMap::new(),
            factors: &factors,
        });
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_malformed_prior_cell_is_not_copied() {
        let mut ledger = seeded_ledger();
        ledger.rows[1].set("peak_demand_gw", "about 85");
        let factors = ElccFactors::default();
        let retail = BTreeMap::from([("TX".to_string(), 15.0)]);
        let outcome = RollForward::new(2025).with_states(texas_only()).derive(RollForwardInputs {
            ledger: &ledger,
            assets: &[],
            retail_prices: &retail,
            factors: &factors,
        });
        assert_eq!(outcome.records[0].peak_demand_gw, None);
        assert_eq!(outcome.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_default_state_set_covers_registry() {
        let roll = RollForward::new(2025);
        assert_eq!(roll.states.len(), 32);
    }
}
