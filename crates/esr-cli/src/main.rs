use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use esr_cli::{load_config, Cli, Commands};

mod commands;

use commands::derive::DeriveArgs;

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Build { year, output } => {
            let year = year.unwrap_or(config.build.year);
            let output = output.clone().unwrap_or_else(|| config.build.output.clone());
            commands::build::handle(&config, year, &output)?;
        }
        Commands::Derive {
            year,
            generators,
            retail,
            ledger,
            states,
            capacity_source,
            dry_run,
        } => {
            let args = DeriveArgs {
                year: *year,
                generators: generators
                    .clone()
                    .unwrap_or_else(|| config.sources.generators.clone()),
                retail: retail.clone().unwrap_or_else(|| config.sources.retail.clone()),
                ledger: ledger.clone().unwrap_or_else(|| config.ledger.path.clone()),
                states: states.clone(),
                capacity_source: capacity_source
                    .clone()
                    .unwrap_or_else(|| config.ledger.capacity_source.clone()),
                dry_run: *dry_run,
            };
            commands::derive::handle(&config, args)?;
        }
        Commands::Validate { ledger, format } => {
            let ledger = ledger.clone().unwrap_or_else(|| config.ledger.path.clone());
            if !commands::validate::handle(&ledger, *format)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Registry { states } => commands::registry::handle(*states)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
