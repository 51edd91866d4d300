use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use esr_algo::roll_forward::{RollForward, RollForwardInputs};
use esr_algo::validation::ensure_valid;
use esr_core::diagnostics::Diagnostics;
use esr_core::record::MetricRecord;
use esr_core::registry::{self, State};
use esr_io::collect::collect_tabular;
use esr_io::ledger::{append_records, load_ledger};
use esr_io::sources::generators::GeneratorAdditions;
use esr_io::sources::retail::RetailPrices;
use esr_io::sources::TabularSource;
use esr_io::table::Workbook;
use tabwriter::TabWriter;
use tracing::{info, warn};

use esr_cli::EsrConfig;

pub struct DeriveArgs {
    pub year: i32,
    pub generators: PathBuf,
    pub retail: PathBuf,
    pub ledger: PathBuf,
    pub states: Vec<String>,
    pub capacity_source: String,
    pub dry_run: bool,
}

fn select_states(codes: &[String]) -> Result<Vec<State>> {
    if codes.is_empty() {
        return Ok(registry::state_list().to_vec());
    }
    codes
        .iter()
        .map(|code| {
            registry::lookup_state(code.trim())
                .copied()
                .ok_or_else(|| anyhow!("'{}' is not a tracked state", code))
        })
        .collect()
}

pub fn handle(config: &EsrConfig, args: DeriveArgs) -> Result<()> {
    let states = select_states(&args.states)?;
    let mut diagnostics = Diagnostics::new();
    let ledger = load_ledger(&args.ledger, &mut diagnostics)?;

    // capacity is the point of the run; without the roster there is nothing to derive
    let generators = GeneratorAdditions::new(args.year).with_factors(config.elcc.clone());
    let workbook = Workbook::open(generators.name(), &args.generators)?;
    let additions = generators.normalize(&workbook)?;

    let retail = collect_tabular(&RetailPrices, Some(args.retail.as_path()), &mut diagnostics);

    let outcome = RollForward::new(args.year)
        .with_capacity_source(args.capacity_source.as_str())
        .with_states(states)
        .derive(RollForwardInputs {
            ledger: &ledger,
            assets: &additions.assets,
            retail_prices: &retail.values,
            factors: &config.elcc,
        });
    diagnostics.merge(outcome.diagnostics);
    for issue in diagnostics.warnings() {
        warn!("{}", issue);
    }

    if args.dry_run {
        print_rows(&outcome.records)?;
        println!("Dry run: {} rows not written ({})", outcome.records.len(), diagnostics.summary());
        return Ok(());
    }

    let written = append_records(&args.ledger, &outcome.records)?;
    info!(rows = written, ledger = %args.ledger.display(), "ledger extended");

    let updated = load_ledger(&args.ledger, &mut Diagnostics::new())?;
    println!(
        "Appended {} state rows for {} to {}",
        written,
        args.year,
        args.ledger.display()
    );
    let validation = ensure_valid(&updated).context("ledger no longer validates")?;
    println!("Ledger validates: {}", validation.summary());
    Ok(())
}

fn print_rows(records: &[MetricRecord]) -> Result<()> {
    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "STATE\tNAMEPLATE MW\tELCC MW\tPROJECTS\tWHOLESALE\tRETAIL\tCOHORT")?;
    for record in records {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.id,
            cell(record.capacity_additions_mw),
            cell(record.capacity_additions_elcc_mw),
            record.project_count.unwrap_or(0),
            cell(record.wholesale_price_mwh),
            cell(record.retail_price_cents_kwh),
            record.queue_cohort
        )?;
    }
    writer.flush()?;
    Ok(())
}
