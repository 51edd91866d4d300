use std::path::Path;

use anyhow::Result;
use esr_algo::validation::validate_ledger;
use esr_core::diagnostics::{Diagnostics, Severity};
use esr_io::ledger::load_ledger;
use serde::Serialize;
use tracing::info;

use esr_cli::OutputFormat;

#[derive(Serialize)]
struct ValidationReport<'a> {
    ledger: String,
    rows: usize,
    errors: usize,
    warnings: usize,
    passed: bool,
    #[serde(flatten)]
    diagnostics: &'a Diagnostics,
}

/// Returns whether the ledger passed (no errors).
pub fn handle(ledger_path: &Path, format: OutputFormat) -> Result<bool> {
    let mut diagnostics = Diagnostics::new();
    let ledger = load_ledger(ledger_path, &mut diagnostics)?;
    info!(ledger = %ledger_path.display(), rows = ledger.len(), "validating ledger");
    diagnostics.merge(validate_ledger(&ledger));
    let passed = !diagnostics.has_errors();

    match format {
        OutputFormat::Json => {
            let report = ValidationReport {
                ledger: ledger_path.display().to_string(),
                rows: ledger.len(),
                errors: diagnostics.error_count(),
                warnings: diagnostics.warning_count(),
                passed,
                diagnostics: &diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!(
                "Validating {} ({} rows)",
                ledger_path.display(),
                ledger.len()
            );
            for issue in &diagnostics.issues {
                let tag = match issue.severity {
                    Severity::Error => "ERROR",
                    Severity::Warning => "WARN ",
                };
                println!("  {} {}", tag, issue);
            }
            let verdict = if passed { "PASSED" } else { "FAILED" };
            println!("{}: {}", verdict, diagnostics.summary());
        }
    }
    Ok(passed)
}
