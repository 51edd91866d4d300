//! Technology buckets used for capacity weighting, and generation assets.

use serde::{Deserialize, Serialize};

use crate::units::Megawatts;

/// Reliability bucket a raw technology label is mapped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Gas,
    Battery,
    Solar,
    Wind,
    Hydro,
    OtherFirm,
}

/// EIA-860M `Technology` labels. Anything else is `OtherFirm`.
const TECHNOLOGY_LABELS: &[(&str, TechCategory)] = &[
    ("Solar Photovoltaic", TechCategory::Solar),
    ("Solar Thermal with Energy Storage", TechCategory::Solar),
    ("Solar Thermal without Energy Storage", TechCategory::Solar),
    ("Batteries", TechCategory::Battery),
    ("Onshore Wind Turbine", TechCategory::Wind),
    ("Offshore Wind Turbine", TechCategory::Wind),
    ("Natural Gas Fired Combustion Turbine", TechCategory::Gas),
    ("Natural Gas Fired Combined Cycle", TechCategory::Gas),
    ("Natural Gas Internal Combustion Engine", TechCategory::Gas),
    ("Natural Gas Steam Turbine", TechCategory::Gas),
    // firm dispatchable, weighted like gas
    ("Petroleum Liquids", TechCategory::Gas),
    ("Wood/Wood Waste Biomass", TechCategory::OtherFirm),
    ("Landfill Gas", TechCategory::OtherFirm),
    ("Conventional Hydroelectric", TechCategory::Hydro),
    ("All Other", TechCategory::OtherFirm),
];

impl TechCategory {
    pub const ALL: [TechCategory; 6] = [
        TechCategory::Gas,
        TechCategory::Battery,
        TechCategory::Solar,
        TechCategory::Wind,
        TechCategory::Hydro,
        TechCategory::OtherFirm,
    ];

    /// Map a raw technology label (trimmed, case-insensitive).
    pub fn classify(label: &str) -> Self {
        let label = label.trim();
        TECHNOLOGY_LABELS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(label))
            .map(|(_, category)| *category)
            .unwrap_or(TechCategory::OtherFirm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TechCategory::Gas => "gas",
            TechCategory::Battery => "battery",
            TechCategory::Solar => "solar",
            TechCategory::Wind => "wind",
            TechCategory::Hydro => "hydro",
            TechCategory::OtherFirm => "other_firm",
        }
    }
}

impl std::fmt::Display for TechCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generating unit read from a generator roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationAsset {
    /// Two-letter plant state
    pub state: String,
    /// Balancing-authority code, when the roster carries one
    pub balancing_authority: Option<String>,
    pub nameplate: Megawatts,
    /// Raw technology label from the source
    pub technology: String,
    pub operating_year: Option<i32>,
}

impl GenerationAsset {
    pub fn new(state: &str, nameplate_mw: f64, technology: &str, operating_year: i32) -> Self {
        Self {
            state: state.to_string(),
            balancing_authority: None,
            nameplate: Megawatts(nameplate_mw),
            technology: technology.to_string(),
            operating_year: Some(operating_year),
        }
    }

    pub fn category(&self) -> TechCategory {
        TechCategory::classify(&self.technology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(TechCategory::classify("Batteries"), TechCategory::Battery);
        assert_eq!(
            TechCategory::classify(" natural gas fired combined cycle "),
            TechCategory::Gas
        );
        assert_eq!(
            TechCategory::classify("Conventional Hydroelectric"),
            TechCategory::Hydro
        );
    }

    #[test]
    fn test_unknown_label_falls_back_to_other_firm() {
        assert_eq!(TechCategory::classify("Nuclear"), TechCategory::OtherFirm);
        assert_eq!(TechCategory::classify(""), TechCategory::OtherFirm);
    }
}
