//! Published dataset: a manifest wrapping one record per tracked ISO.

use serde::{Deserialize, Serialize};

use crate::record::per_gw_peak;

/// One ISO in the published dataset. Metrics that no source produced are
/// absent, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoDataPoint {
    pub id: String,
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wholesale_price_mwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_additions_mw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_additions_elcc_mw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_demand_gw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_completion_pct: Option<f64>,
}

impl IsoDataPoint {
    pub fn mw_per_gw_peak(&self) -> Option<f64> {
        per_gw_peak(self.capacity_additions_mw, self.peak_demand_gw)
    }

    pub fn elcc_mw_per_gw_peak(&self) -> Option<f64> {
        per_gw_peak(self.capacity_additions_elcc_mw, self.peak_demand_gw)
    }

    pub fn projects_per_gw_peak(&self) -> Option<f64> {
        per_gw_peak(self.project_count.map(f64::from), self.peak_demand_gw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: String,
    pub author: String,
    /// ISO-8601 compilation date
    pub compiled: String,
    pub primary_year: i32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedDataset {
    pub metadata: DatasetMetadata,
    pub isos: Vec<IsoDataPoint>,
}
