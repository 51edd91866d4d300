use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "esr",
    version,
    about = "Electricity supply-response data pipeline: normalize sources, roll forward and validate the ledger"
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Configuration file (default: ~/.esr/config/esr.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize the raw sources and write the published dataset
    Build {
        /// Primary data year (overrides [build].year)
        #[arg(long)]
        year: Option<i32>,
        /// Output JSON path (overrides [build].output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Roll ISO estimates forward into state rows and append them to the ledger
    Derive {
        /// Year of the rows to derive
        #[arg(long)]
        year: i32,
        /// EIA-860M export (overrides [sources].generators)
        #[arg(long)]
        generators: Option<PathBuf>,
        /// EPM table 5.6.B export (overrides [sources].retail)
        #[arg(long)]
        retail: Option<PathBuf>,
        /// Ledger CSV (overrides [ledger].path)
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// Restrict to these state codes (comma separated)
        #[arg(long = "state", value_delimiter = ',')]
        states: Vec<String>,
        /// Citation for source_capacity (overrides [ledger].capacity_source)
        #[arg(long)]
        capacity_source: Option<String>,
        /// Print the derived rows without touching the ledger
        #[arg(long)]
        dry_run: bool,
    },
    /// Check the ledger against its schema and invariants
    Validate {
        /// Ledger CSV (overrides [ledger].path)
        #[arg(long)]
        ledger: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// List tracked ISOs with their balancing authorities
    Registry {
        /// List the state → ISO assignment instead
        #[arg(long)]
        states: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}
