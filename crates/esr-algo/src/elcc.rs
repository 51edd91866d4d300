//! Effective Load Carrying Capability (ELCC) weighting of nameplate capacity.
//!
//! Each generation asset counts toward peak coverage at a fraction of its
//! nameplate rating. The fraction comes from a two-level lookup: an
//! ISO-specific override table is consulted first, then the generic
//! per-technology table.
//!
//! | Category   | Generic | Overrides                     |
//! |------------|---------|-------------------------------|
//! | gas        | 0.95    |                               |
//! | battery    | 0.85    | SPP 0.90, CAISO 0.875         |
//! | solar      | 0.325   | MISO 0.50                     |
//! | wind       | 0.20    | SPP 0.225                     |
//! | hydro      | 0.50    |                               |
//! | other_firm | 0.80    |                               |
//!
//! Factors are clamped into `[0, 1]` per asset before weighting, so the
//! weighted total can never exceed the nameplate total, whatever the tables
//! contain.

use std::collections::BTreeMap;

use esr_core::technology::{GenerationAsset, TechCategory};
use esr_core::units::Megawatts;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Factor used when a category is missing from the generic table.
pub const DEFAULT_FACTOR: f64 = 0.50;

/// Generic and per-ISO ELCC factors
///
/// Deserialized tables are layered over [`ElccFactors::default`]: a listed
/// entry replaces the built-in one, anything unlisted keeps its built-in
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FactorLayer")]
pub struct ElccFactors {
    pub generic: BTreeMap<TechCategory, f64>,
    pub overrides: BTreeMap<String, BTreeMap<TechCategory, f64>>,
}

/// Factor entries as written in a config file
#[derive(Debug, Deserialize)]
struct FactorLayer {
    #[serde(default)]
    generic: BTreeMap<TechCategory, f64>,
    #[serde(default)]
    overrides: BTreeMap<String, BTreeMap<TechCategory, f64>>,
}

impl From<FactorLayer> for ElccFactors {
    fn from(layer: FactorLayer) -> Self {
        let mut factors = ElccFactors::default();
        factors.layer(layer);
        factors
    }
}

impl Default for ElccFactors {
    fn default() -> Self {
        let generic = BTreeMap::from([
            (TechCategory::Gas, 0.95),
            (TechCategory::Battery, 0.85),
            // midpoint of 30-35%
            (TechCategory::Solar, 0.325),
            // midpoint of 15-25%
            (TechCategory::Wind, 0.20),
            (TechCategory::OtherFirm, 0.80),
            (TechCategory::Hydro, 0.50),
        ]);
        let overrides = BTreeMap::from([
            (
                "SPP".to_string(),
                BTreeMap::from([(TechCategory::Battery, 0.90), (TechCategory::Wind, 0.225)]),
            ),
            (
                "CAISO".to_string(),
                BTreeMap::from([(TechCategory::Battery, 0.875)]),
            ),
            (
                "MISO".to_string(),
                BTreeMap::from([(TechCategory::Solar, 0.50)]),
            ),
        ]);
        Self { generic, overrides }
    }
}

impl ElccFactors {
    /// Tables with no entries; every lookup yields [`DEFAULT_FACTOR`].
    pub fn empty() -> Self {
        Self {
            generic: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    fn layer(&mut self, layer: FactorLayer) {
        self.generic.extend(layer.generic);
        for (iso, table) in layer.overrides {
            self.overrides.entry(iso).or_default().extend(table);
        }
    }

    pub fn with_generic(mut self, category: TechCategory, factor: f64) -> Self {
        self.generic.insert(category, factor);
        self
    }

    pub fn with_override(mut self, iso: &str, category: TechCategory, factor: f64) -> Self {
        self.overrides
            .entry(iso.to_string())
            .or_default()
            .insert(category, factor);
        self
    }

    /// Raw table factor for `category` in `iso` (override first).
    pub fn factor(&self, category: TechCategory, iso: &str) -> f64 {
        self.overrides
            .get(iso)
            .and_then(|table| table.get(&category))
            .or_else(|| self.generic.get(&category))
            .copied()
            .unwrap_or(DEFAULT_FACTOR)
    }

    /// Factor actually applied to an asset, clamped into `[0, 1]`.
    pub fn applied_factor(&self, category: TechCategory, iso: &str) -> f64 {
        let raw = self.factor(category, iso);
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(0.0, 1.0)
    }
}

/// Nameplate and ELCC-weighted totals for a set of assets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CapacitySummary {
    pub nameplate: Megawatts,
    pub effective: Megawatts,
    pub project_count: usize,
}

impl CapacitySummary {
    pub fn add(&mut self, other: CapacitySummary) {
        self.nameplate += other.nameplate;
        self.effective += other.effective;
        self.project_count += other.project_count;
    }
}

/// ELCC-weighted capacity of one asset located in `iso`.
pub fn weighted_capacity(asset: &GenerationAsset, iso: &str, factors: &ElccFactors) -> Megawatts {
    let nameplate = Megawatts(asset.nameplate.value().max(0.0));
    nameplate * factors.applied_factor(asset.category(), iso)
}

/// Weight every asset with the factors for `iso` and total them.
pub fn effective_capacity(
    assets: &[GenerationAsset],
    iso: &str,
    factors: &ElccFactors,
) -> CapacitySummary {
    let mut summary = CapacitySummary::default();
    for asset in assets {
        let nameplate = Megawatts(asset.nameplate.value().max(0.0));
        summary.nameplate += nameplate;
        summary.effective += weighted_capacity(asset, iso, factors);
        summary.project_count += 1;
    }
    // float summation can drift a hair above the nameplate total
    summary.effective = summary.effective.min(summary.nameplate);
    debug!(
        iso,
        assets = assets.len(),
        nameplate_mw = summary.nameplate.value(),
        effective_mw = summary.effective.value(),
        "weighted capacity"
    );
    summary
}
