//! Dataset merger: combines the per-source ISO maps with registry metadata.

use std::collections::BTreeMap;

use esr_core::dataset::{DatasetMetadata, IsoDataPoint, PublishedDataset};
use esr_core::registry::{self, Iso};

/// Normalizer outputs keyed by ISO id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricMaps {
    pub wholesale_prices: BTreeMap<String, f64>,
    pub capacity_additions: BTreeMap<String, f64>,
    pub peak_demand: BTreeMap<String, f64>,
    pub queue_completion: BTreeMap<String, f64>,
    /// ELCC-weighted additions, reported alongside nameplate additions
    pub effective_additions: BTreeMap<String, f64>,
    pub project_counts: BTreeMap<String, u32>,
}

impl MetricMaps {
    pub fn new(
        wholesale_prices: BTreeMap<String, f64>,
        capacity_additions: BTreeMap<String, f64>,
        peak_demand: BTreeMap<String, f64>,
        queue_completion: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            wholesale_prices,
            capacity_additions,
            peak_demand,
            queue_completion,
            ..Self::default()
        }
    }
}

/// One record per tracked ISO, in registry order.
///
/// A metric is set only when its map contains the ISO, so "measured zero"
/// and "not measured" stay distinguishable downstream.
pub fn merge(maps: &MetricMaps) -> Vec<IsoDataPoint> {
    merge_entities(registry::iso_list(), maps)
}

/// Same as [`merge`] over an explicit entity list.
pub fn merge_entities(entities: &[Iso], maps: &MetricMaps) -> Vec<IsoDataPoint> {
    entities
        .iter()
        .map(|iso| IsoDataPoint {
            id: iso.id.to_string(),
            name: iso.name.to_string(),
            region: iso.region.to_string(),
            wholesale_price_mwh: maps.wholesale_prices.get(iso.id).copied(),
            capacity_additions_mw: maps.capacity_additions.get(iso.id).copied(),
            capacity_additions_elcc_mw: maps.effective_additions.get(iso.id).copied(),
            project_count: maps.project_counts.get(iso.id).copied(),
            peak_demand_gw: maps.peak_demand.get(iso.id).copied(),
            queue_completion_pct: maps.queue_completion.get(iso.id).copied(),
        })
        .collect()
}

/// Wrap the merged records in a publishable manifest.
pub fn build_dataset(maps: &MetricMaps, metadata: DatasetMetadata) -> PublishedDataset {
    PublishedDataset {
        metadata,
        isos: merge(maps),
    }
}
