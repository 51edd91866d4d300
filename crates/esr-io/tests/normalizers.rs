use std::fs;
use std::path::Path;

use esr_algo::{build_dataset, MetricMaps};
use esr_core::Diagnostics;
use esr_io::collect::collect_tabular;
use esr_io::sources::generators::GeneratorAdditions;
use esr_io::sources::queue::QueueCompletion;
use esr_io::sources::wholesale::WholesalePrices;
use esr_io::{default_metadata, load_dataset, write_dataset, TabularSource};
use esr_io::table::Workbook;

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn header_found_below_two_title_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "wholesale.csv",
        "Wholesale Electricity and Natural Gas Market Data,,\n\
         Prices in $/MWh,,\n\
         Trade Date,PJM West Hub,Mass Hub\n\
         2024-01-02,40.10,55.0\n\
         2024-01-03,41.90,57.0\n",
    );

    let workbook = Workbook::open("wholesale", &path).unwrap();
    let output = WholesalePrices.normalize(&workbook).unwrap();

    let layout = output.layout.unwrap();
    assert_eq!(layout.header_row, 2);
    assert_eq!(layout.sheet_name, "wholesale");
    assert_eq!(output.values["PJM"], 41.0);
    assert_eq!(output.values["ISO-NE"], 56.0);
}

#[test]
fn directory_workbook_uses_named_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("queued_up");
    fs::create_dir(&book).unwrap();
    write(&book, "Notes.csv", "About this file\nSee emp.lbl.gov/queues\n");

    let mut rows = String::from("Region,q_date,Status\n");
    for year in 2001..=2012 {
        let status = if year % 4 == 0 { "Operational" } else { "Withdrawn" };
        rows.push_str(&format!("MISO,{},{}\n", year, status));
    }
    write(&book, "Data.csv", &rows);

    let workbook = Workbook::open("queue", &book).unwrap();
    let output = QueueCompletion::default().normalize(&workbook).unwrap();
    assert_eq!(output.layout.unwrap().sheet_name, "Data");
    // 2004, 2008 and 2012 of twelve entries
    assert_eq!(output.values["MISO"], 25.0);
}

#[test]
fn build_with_missing_sources_still_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let generators = write(
        dir.path(),
        "eia860m.csv",
        "Plant State,Balancing Authority Code,Nameplate Capacity (MW),Technology,Operating Year\n\
         CA,CISO,200,Batteries,2024\n\
         CA,CISO,100,Solar Photovoltaic,2024\n\
         NY,NYIS,40,Onshore Wind Turbine,2023\n",
    );

    let mut diagnostics = Diagnostics::new();
    let prices = collect_tabular(
        &WholesalePrices,
        Some(dir.path().join("wholesale.csv").as_path()),
        &mut diagnostics,
    );
    let additions = collect_tabular(&GeneratorAdditions::new(2024), Some(generators.as_path()), &mut diagnostics);
    let queue = collect_tabular(&QueueCompletion::default(), None, &mut diagnostics);
    assert_eq!(diagnostics.warning_count(), 2);

    let mut maps = MetricMaps::new(
        prices.values,
        additions.nameplate.values,
        Default::default(),
        queue.values,
    );
    maps.effective_additions = additions.effective;
    maps.project_counts = additions.project_counts;

    let dataset = build_dataset(&maps, default_metadata(2024));
    assert_eq!(dataset.isos.len(), 7);
    let caiso = dataset.isos.iter().find(|p| p.id == "CAISO").unwrap();
    assert_eq!(caiso.capacity_additions_mw, Some(300.0));
    assert_eq!(caiso.capacity_additions_elcc_mw, Some(207.5));
    assert_eq!(caiso.project_count, Some(2));
    assert!(dataset.isos.iter().all(|p| p.wholesale_price_mwh.is_none()));

    let out = dir.path().join("verified").join("iso_scatter_data.json");
    write_dataset(&out, &dataset).unwrap();
    assert_eq!(load_dataset(&out).unwrap(), dataset);
}
