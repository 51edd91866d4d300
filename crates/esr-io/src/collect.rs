//! Degrading collectors.
//!
//! A build never fails because one source is unavailable: a missing file is
//! skipped, a layout or schema failure is logged, and either way the source
//! contributes an empty output plus a warning in the run diagnostics.

use std::path::Path;

use esr_core::diagnostics::Diagnostics;
use tracing::{error, info, warn};

use crate::error::SourceError;
use crate::sources::peak_demand::{DemandService, PeakDemand};
use crate::sources::{SourceOutput, TabularSource};
use crate::table::Workbook;

/// Open `path` and normalize it, degrading any failure to an empty output.
pub fn collect_tabular<S: TabularSource>(
    source: &S,
    path: Option<&Path>,
    diagnostics: &mut Diagnostics,
) -> S::Output {
    let Some(path) = path else {
        warn!(source = source.name(), "no path configured, skipping");
        diagnostics.add_warning_with_entity("source", "no path configured; skipped", source.name());
        return S::Output::default();
    };

    let result = Workbook::open(source.name(), path).and_then(|workbook| source.normalize(&workbook));
    match result {
        Ok(output) => output,
        Err(err @ SourceError::MissingSource { .. }) => {
            warn!(source = source.name(), "{err}");
            diagnostics.add_warning_with_entity("source", &format!("skipped: {err}"), source.name());
            S::Output::default()
        }
        Err(err) => {
            error!(source = source.name(), "{err}");
            diagnostics.add_warning_with_entity("source", &format!("failed: {err}"), source.name());
            S::Output::default()
        }
    }
}

/// Peak demand needs an API key; without one the source is unavailable.
pub fn collect_peak_demand(
    fetcher: &PeakDemand,
    service: Option<&dyn DemandService>,
    diagnostics: &mut Diagnostics,
) -> SourceOutput {
    let Some(service) = service else {
        warn!(source = "peak_demand", "no EIA API key, skipping");
        diagnostics.add_warning_with_entity("source", "no API key; skipped", "peak_demand");
        return SourceOutput::default();
    };
    let output = fetcher.fetch(service);
    info!(source = "peak_demand", isos = output.len(), "collected");
    output
}
