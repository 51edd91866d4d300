//! `esr.toml` configuration.
//!
//! Every section and key is optional; anything omitted takes the defaults
//! below. Command-line flags override the file.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use esr_algo::elcc::ElccFactors;
use esr_algo::roll_forward::DEFAULT_CAPACITY_SOURCE;
use esr_io::manifest::{DEFAULT_AUTHOR, DEFAULT_NOTES, DEFAULT_TITLE};
use esr_io::sources::peak_demand::EIA_BASE_URL;
use esr_io::sources::queue::{DEFAULT_CUTOFF_YEAR, DEFAULT_FLOOR_YEAR};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EsrConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub peak: PeakConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// ELCC factor tables; omitted means the built-in tables
    #[serde(default)]
    pub elcc: ElccFactors,
}

/// Published dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_notes")]
    pub notes: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            title: default_title(),
            author: default_author(),
            notes: default_notes(),
            output: default_output(),
        }
    }
}

fn default_year() -> i32 {
    2024
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_notes() -> String {
    DEFAULT_NOTES.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("data/verified/iso_scatter_data.json")
}

/// Raw download locations (CSV file or directory of CSV sheets)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_wholesale")]
    pub wholesale: PathBuf,
    #[serde(default = "default_generators")]
    pub generators: PathBuf,
    #[serde(default = "default_queue")]
    pub queue: PathBuf,
    #[serde(default = "default_retail")]
    pub retail: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            wholesale: default_wholesale(),
            generators: default_generators(),
            queue: default_queue(),
            retail: default_retail(),
        }
    }
}

fn default_wholesale() -> PathBuf {
    PathBuf::from("data/raw/wholesale_prices")
}

fn default_generators() -> PathBuf {
    PathBuf::from("data/raw/eia860m")
}

fn default_queue() -> PathBuf {
    PathBuf::from("data/raw/queued_up")
}

fn default_retail() -> PathBuf {
    PathBuf::from("data/raw/epm_table_5_6_b.csv")
}

/// EIA API settings for peak demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

fn default_api_key_env() -> String {
    "EIA_API_KEY".to_string()
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_base_url() -> String {
    EIA_BASE_URL.to_string()
}

/// Queue cohort window (entry years, inclusive)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_floor_year")]
    pub floor_year: i32,
    #[serde(default = "default_cutoff_year")]
    pub cutoff_year: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            floor_year: default_floor_year(),
            cutoff_year: default_cutoff_year(),
        }
    }
}

fn default_floor_year() -> i32 {
    DEFAULT_FLOOR_YEAR
}

fn default_cutoff_year() -> i32 {
    DEFAULT_CUTOFF_YEAR
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
    /// Citation written to `source_capacity` on derived rows
    #[serde(default = "default_capacity_source")]
    pub capacity_source: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            capacity_source: default_capacity_source(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/audit_all_data.csv")
}

fn default_capacity_source() -> String {
    DEFAULT_CAPACITY_SOURCE.to_string()
}

impl EsrConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue.floor_year > self.queue.cutoff_year {
            bail!(
                "[queue] floor_year {} is after cutoff_year {}",
                self.queue.floor_year,
                self.queue.cutoff_year
            );
        }
        Ok(())
    }

    /// EIA API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.peak.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Location: ~/.esr
pub fn esr_home() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".esr"))
}

/// Location: ~/.esr/config/esr.toml
pub fn esr_config_path() -> Result<PathBuf> {
    Ok(esr_home()?.join("config").join("esr.toml"))
}

pub fn parse_config(contents: &str) -> Result<EsrConfig> {
    let config: EsrConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Load an explicit config file, or the default one when it exists.
pub fn load_config(explicit: Option<&Path>) -> Result<EsrConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match esr_config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(EsrConfig::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use esr_core::technology::TechCategory;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.build.year, 2024);
        assert_eq!(config.build.author, "Bottlenecks Lab");
        assert_eq!(config.peak.timeout_secs, 30);
        assert_eq!(config.queue.cutoff_year, 2020);
        assert_eq!(config.elcc.factor(TechCategory::Solar, "MISO"), 0.50);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [build]
            year = 2025
            author = "Bottlenecks Lab"

            [sources]
            queue = "raw/queue.csv"

            [elcc.generic]
            solar = 0.3

            [elcc.overrides.SPP]
            wind = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(config.build.year, 2025);
        assert_eq!(config.build.title, DEFAULT_TITLE);
        assert_eq!(config.sources.queue, PathBuf::from("raw/queue.csv"));
        assert_eq!(config.sources.retail, default_retail());
        assert_eq!(config.elcc.factor(TechCategory::Wind, "SPP"), 0.25);
        assert_eq!(config.elcc.factor(TechCategory::Solar, "PJM"), 0.3);
        assert_eq!(config.elcc.factor(TechCategory::Gas, "PJM"), 0.95);
        assert_eq!(config.elcc.factor(TechCategory::Battery, "SPP"), 0.90);
    }

    #[test]
    fn elcc_overrides_alone_load() {
        let config = parse_config("[elcc.overrides.SPP]
wind = 0.25
").unwrap();
        assert_eq!(config.elcc.factor(TechCategory::Wind, "SPP"), 0.25);
        assert_eq!(config.elcc.factor(TechCategory::Battery, "SPP"), 0.90);
        assert_eq!(config.elcc.factor(TechCategory::Solar, "CAISO"), 0.325);
    }

    #[test]
    fn inverted_cohort_window_is_rejected() {
        let err = parse_config("[queue]\nfloor_year = 2021\ncutoff_year = 2020\n").unwrap_err();
        assert!(err.to_string().contains("floor_year"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/esr.toml"))).is_err());
    }
}
