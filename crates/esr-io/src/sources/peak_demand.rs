//! Annual peak demand per ISO from EIA-930 hourly data (EIA API v2).
//!
//! One request per ISO asks the API to sort the year's hourly demand values
//! descending and return only the first, so the year is never downloaded in
//! full. Requests are sequential with a fixed pause between them.

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use esr_core::registry::{self, Iso};
use esr_core::units::Megawatts;
use serde_json::Value;
use tracing::{info, warn};

use crate::sources::SourceOutput;

pub const SOURCE_NAME: &str = "peak_demand";
pub const EIA_BASE_URL: &str = "https://api.eia.gov/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Remote lookup of the single highest hourly demand of a respondent
pub trait DemandService {
    /// Peak hourly demand (MW) for `respondent` in `year`; `Ok(None)` when
    /// the service has no record.
    fn peak_demand_mw(&self, respondent: &str, year: i32) -> Result<Option<f64>>;
}

/// EIA API v2 client for `electricity/rto/region-data`
pub struct EiaDemandClient {
    api_key: String,
    base_url: String,
    agent: ureq::Agent,
}

impl EiaDemandClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: EIA_BASE_URL.to_string(),
            agent: ureq::AgentBuilder::new().timeout(DEFAULT_TIMEOUT).build(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/electricity/rto/region-data/data/", self.base_url)
    }

    /// Query parameters for one respondent-year.
    pub fn query_params(&self, respondent: &str, year: i32) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.api_key.clone()),
            ("frequency", "hourly".to_string()),
            ("data[0]", "value".to_string()),
            ("facets[respondent][]", respondent.to_string()),
            ("facets[type-name][]", "Demand".to_string()),
            ("start", format!("{}-01-01T00", year)),
            ("end", format!("{}-12-31T23", year)),
            ("sort[0][column]", "value".to_string()),
            ("sort[0][direction]", "desc".to_string()),
            ("length", "1".to_string()),
        ]
    }
}

impl DemandService for EiaDemandClient {
    fn peak_demand_mw(&self, respondent: &str, year: i32) -> Result<Option<f64>> {
        let mut request = self.agent.get(&self.endpoint());
        for (key, value) in self.query_params(respondent, year) {
            request = request.query(key, &value);
        }

        let response = request
            .call()
            .with_context(|| format!("calling EIA API for respondent {}", respondent))?;
        let body: Value = response
            .into_json()
            .context("parsing EIA JSON response")?;

        peak_from_response(&body)
    }
}

/// Extract `response.data[0].value` (a number or a numeric string).
pub fn peak_from_response(body: &Value) -> Result<Option<f64>> {
    let Some(record) = body["response"]["data"].as_array().and_then(|data| data.first()) else {
        return Ok(None);
    };
    match &record["value"] {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("non-numeric demand value '{}'", text)),
        other => Err(anyhow!("unexpected demand value {}", other)),
    }
}

/// Fetches peaks for every tracked ISO
#[derive(Debug, Clone)]
pub struct PeakDemand {
    pub year: i32,
    pub request_delay: Duration,
    pub isos: Vec<Iso>,
}

impl PeakDemand {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            request_delay: DEFAULT_REQUEST_DELAY,
            isos: registry::iso_list().to_vec(),
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Peak GW per ISO (1 decimal). A failed or empty lookup omits the ISO.
    pub fn fetch<S: DemandService + ?Sized>(&self, service: &S) -> SourceOutput {
        let mut output = SourceOutput::default();

        for (position, iso) in self.isos.iter().enumerate() {
            if position > 0 && !self.request_delay.is_zero() {
                thread::sleep(self.request_delay);
            }
            match service.peak_demand_mw(iso.respondent, self.year) {
                Ok(Some(mw)) => output.insert(
                    iso.id,
                    Megawatts(mw).to_gigawatts().round_to(1).value(),
                    format!(
                        "EIA-930 hourly demand, respondent {}, {} maximum",
                        iso.respondent, self.year
                    ),
                ),
                Ok(None) => {
                    warn!(iso = iso.id, respondent = iso.respondent, "no demand data");
                    output
                        .diagnostics
                        .add_warning_with_entity("request", "no demand data returned", iso.id);
                }
                Err(err) => {
                    warn!(iso = iso.id, respondent = iso.respondent, "EIA request failed: {err:#}");
                    output.diagnostics.add_warning_with_entity(
                        "request",
                        &format!("request failed: {err:#}"),
                        iso.id,
                    );
                }
            }
        }

        info!(
            source = SOURCE_NAME,
            year = self.year,
            isos = ?output.entities(),
            "fetched peak demand"
        );
        output
    }
}
