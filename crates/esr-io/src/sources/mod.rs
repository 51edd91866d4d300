//! Source normalizers.
//!
//! Each normalizer reconciles one agency download into canonical metrics
//! keyed by entity id (ISO id, or state code for retail prices):
//!
//! | Module          | Source                          | Metric                      |
//! |-----------------|---------------------------------|-----------------------------|
//! | [`wholesale`]   | EIA wholesale hub prices        | mean $/MWh per ISO          |
//! | [`generators`]  | EIA-860M generator inventory    | nameplate and ELCC MW added |
//! | [`peak_demand`] | EIA-930 via the EIA API v2      | annual peak GW              |
//! | [`queue`]       | LBNL "Queued Up"                | queue completion %          |
//! | [`retail`]      | EIA Electric Power Monthly 5.6.B| retail cents/kWh per state  |
//!
//! Recoverable variance (unknown hubs, blank cells, unmapped regions) is
//! recorded in [`SourceOutput::diagnostics`]; only an unusable layout or a
//! missing required column fails a source.

use std::collections::BTreeMap;

use esr_core::diagnostics::Diagnostics;
use serde::Serialize;

use crate::error::SourceError;
use crate::layout::Layout;
use crate::table::Workbook;

pub mod generators;
pub mod peak_demand;
pub mod queue;
pub mod retail;
pub mod wholesale;

/// Canonical values extracted from one source
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceOutput {
    pub values: BTreeMap<String, f64>,
    /// Entity → where its value came from
    pub provenance: BTreeMap<String, String>,
    /// Headers actually read
    pub used_columns: Vec<String>,
    pub layout: Option<Layout>,
    pub diagnostics: Diagnostics,
}

impl SourceOutput {
    pub fn insert(&mut self, entity: &str, value: f64, provenance: impl Into<String>) {
        self.values.insert(entity.to_string(), value);
        self.provenance.insert(entity.to_string(), provenance.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entities(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

/// A normalizer over a spreadsheet-shaped download
pub trait TabularSource {
    type Output: Default;

    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    fn normalize(&self, workbook: &Workbook) -> Result<Self::Output, SourceError>;
}
