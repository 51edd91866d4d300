use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use esr_algo::merge::{build_dataset, MetricMaps};
use esr_core::diagnostics::Diagnostics;
use esr_io::collect::{collect_peak_demand, collect_tabular};
use esr_io::manifest::{default_metadata, write_dataset};
use esr_io::sources::generators::GeneratorAdditions;
use esr_io::sources::peak_demand::{DemandService, EiaDemandClient, PeakDemand};
use esr_io::sources::queue::QueueCompletion;
use esr_io::sources::wholesale::WholesalePrices;
use tracing::{debug, info, warn};

use esr_cli::EsrConfig;

pub fn handle(config: &EsrConfig, year: i32, output: &Path) -> Result<()> {
    let mut diagnostics = Diagnostics::new();

    info!("[1/4] wholesale prices");
    let prices = collect_tabular(
        &WholesalePrices,
        Some(config.sources.wholesale.as_path()),
        &mut diagnostics,
    );

    info!("[2/4] generator additions (EIA-860M)");
    let additions = collect_tabular(
        &GeneratorAdditions::new(year).with_factors(config.elcc.clone()),
        Some(config.sources.generators.as_path()),
        &mut diagnostics,
    );

    info!("[3/4] peak demand (EIA API)");
    let client = config.api_key().map(|key| {
        EiaDemandClient::new(key)
            .with_base_url(config.peak.base_url.as_str())
            .with_timeout(Duration::from_secs(config.peak.timeout_secs))
    });
    let fetcher =
        PeakDemand::new(year).with_request_delay(Duration::from_millis(config.peak.request_delay_ms));
    let peaks = collect_peak_demand(
        &fetcher,
        client.as_ref().map(|c| c as &dyn DemandService),
        &mut diagnostics,
    );

    info!("[4/4] queue completion (LBNL Queued Up)");
    let queue = collect_tabular(
        &QueueCompletion::new(config.queue.floor_year, config.queue.cutoff_year),
        Some(config.sources.queue.as_path()),
        &mut diagnostics,
    );

    for source in [&prices, &additions.nameplate, &peaks, &queue] {
        diagnostics.merge(source.diagnostics.clone());
    }

    let mut maps = MetricMaps::new(
        prices.values,
        additions.nameplate.values,
        peaks.values,
        queue.values,
    );
    maps.effective_additions = additions.effective;
    maps.project_counts = additions.project_counts;

    let mut metadata = default_metadata(year);
    metadata.title = config.build.title.clone();
    metadata.author = config.build.author.clone();
    metadata.notes = config.build.notes.clone();
    let dataset = build_dataset(&maps, metadata);
    write_dataset(output, &dataset)?;

    for point in &dataset.isos {
        debug!(
            iso = %point.id,
            mw_per_gw_peak = ?point.mw_per_gw_peak(),
            elcc_mw_per_gw_peak = ?point.elcc_mw_per_gw_peak(),
            projects_per_gw_peak = ?point.projects_per_gw_peak(),
            "supply response ratios"
        );
    }
    for issue in diagnostics.warnings() {
        warn!("{}", issue);
    }
    let populated = |metric: fn(&esr_core::IsoDataPoint) -> bool| {
        dataset.isos.iter().filter(|p| metric(p)).count()
    };
    println!("Wrote {} ISOs to {}", dataset.isos.len(), output.display());
    println!(
        "  wholesale {} | additions {} | peak {} | queue {}",
        populated(|p| p.wholesale_price_mwh.is_some()),
        populated(|p| p.capacity_additions_mw.is_some()),
        populated(|p| p.peak_demand_gw.is_some()),
        populated(|p| p.queue_completion_pct.is_some()),
    );
    println!("  {}", diagnostics.summary());
    Ok(())
}
