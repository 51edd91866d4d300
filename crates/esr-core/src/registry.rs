//! Canonical entity registry: the tracked ISO/RTO markets, the balancing
//! authorities that report under them, and the state → ISO assignment used
//! when rolling ISO estimates down to states.
//!
//! Everything here is static reference data. Lookups never fail; an
//! untracked code resolves to `None`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// A tracked ISO/RTO market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iso {
    /// Canonical short code, e.g. `"ISO-NE"`
    pub id: &'static str,
    pub name: &'static str,
    pub region: &'static str,
    /// EIA-930 respondent code used by the demand service
    pub respondent: &'static str,
}

/// A state tracked at the finer granularity, with its parent ISO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub code: &'static str,
    pub name: &'static str,
    pub iso: &'static str,
}

/// Tracked ISOs in display order.
pub const ISOS: [Iso; 7] = [
    Iso {
        id: "ERCOT",
        name: "Electric Reliability Council of Texas",
        region: "Texas",
        respondent: "ERCO",
    },
    Iso {
        id: "SPP",
        name: "Southwest Power Pool",
        region: "Central US",
        respondent: "SWPP",
    },
    Iso {
        id: "MISO",
        name: "Midcontinent ISO",
        region: "Central US (15 states)",
        respondent: "MISO",
    },
    Iso {
        id: "CAISO",
        name: "California ISO",
        region: "California",
        respondent: "CISO",
    },
    Iso {
        id: "PJM",
        name: "PJM Interconnection",
        region: "Mid-Atlantic & Midwest (13 states + DC)",
        respondent: "PJM",
    },
    Iso {
        id: "NYISO",
        name: "New York ISO",
        region: "New York",
        respondent: "NYIS",
    },
    Iso {
        id: "ISO-NE",
        name: "ISO New England",
        region: "New England (6 states)",
        respondent: "ISNE",
    },
];

/// EIA balancing-authority code → ISO id. Non-market BAs (TVA, BPA, WAPA,
/// ...) are deliberately absent.
const BA_ALIASES: &[(&str, &str)] = &[
    ("ERCO", "ERCOT"),
    ("SWPP", "SPP"),
    // MISO and its member BAs
    ("MISO", "MISO"),
    ("EEI", "MISO"),
    ("LGEE", "MISO"),
    ("ALTW", "MISO"),
    ("AMIL", "MISO"),
    ("AMMO", "MISO"),
    ("CONS", "MISO"),
    ("CWEP", "MISO"),
    ("DECO", "MISO"),
    ("GRE", "MISO"),
    ("MDU", "MISO"),
    ("MEC", "MISO"),
    ("MIUP", "MISO"),
    ("MP", "MISO"),
    ("NSB", "MISO"),
    ("OTP", "MISO"),
    ("SMP", "MISO"),
    ("WEC", "MISO"),
    ("WPS", "MISO"),
    ("NIPS", "MISO"),
    ("IPL", "MISO"),
    ("SIPC", "MISO"),
    ("CWLP", "MISO"),
    ("CISO", "CAISO"),
    // PJM and its zones
    ("PJM", "PJM"),
    ("AEP", "PJM"),
    ("AP", "PJM"),
    ("ATSI", "PJM"),
    ("CE", "PJM"),
    ("DAY", "PJM"),
    ("DEOK", "PJM"),
    ("DOM", "PJM"),
    ("DPL", "PJM"),
    ("DUK", "PJM"),
    ("EKPC", "PJM"),
    ("JC", "PJM"),
    ("ME", "PJM"),
    ("OVEC", "PJM"),
    ("PE", "PJM"),
    ("PEP", "PJM"),
    ("PL", "PJM"),
    ("PN", "PJM"),
    ("PS", "PJM"),
    ("RECO", "PJM"),
    ("NYIS", "NYISO"),
    ("ISNE", "ISO-NE"),
];

/// States rolled forward from their parent ISO, sorted by code.
pub const STATES: [State; 32] = [
    State { code: "AR", name: "Arkansas", iso: "MISO" },
    State { code: "CA", name: "California", iso: "CAISO" },
    State { code: "CT", name: "Connecticut", iso: "ISO-NE" },
    State { code: "DE", name: "Delaware", iso: "PJM" },
    State { code: "IA", name: "Iowa", iso: "MISO" },
    State { code: "IL", name: "Illinois", iso: "MISO" },
    State { code: "IN", name: "Indiana", iso: "MISO" },
    State { code: "KS", name: "Kansas", iso: "SPP" },
    State { code: "KY", name: "Kentucky", iso: "MISO" },
    State { code: "LA", name: "Louisiana", iso: "MISO" },
    State { code: "MA", name: "Massachusetts", iso: "ISO-NE" },
    State { code: "MD", name: "Maryland", iso: "PJM" },
    State { code: "ME", name: "Maine", iso: "ISO-NE" },
    State { code: "MI", name: "Michigan", iso: "MISO" },
    State { code: "MN", name: "Minnesota", iso: "MISO" },
    State { code: "MO", name: "Missouri", iso: "MISO" },
    State { code: "MS", name: "Mississippi", iso: "MISO" },
    State { code: "NC", name: "North Carolina", iso: "PJM" },
    State { code: "NE", name: "Nebraska", iso: "SPP" },
    State { code: "NH", name: "New Hampshire", iso: "ISO-NE" },
    State { code: "NJ", name: "New Jersey", iso: "PJM" },
    State { code: "NM", name: "New Mexico", iso: "SPP" },
    State { code: "NY", name: "New York", iso: "NYISO" },
    State { code: "OH", name: "Ohio", iso: "PJM" },
    State { code: "OK", name: "Oklahoma", iso: "SPP" },
    State { code: "PA", name: "Pennsylvania", iso: "PJM" },
    State { code: "RI", name: "Rhode Island", iso: "ISO-NE" },
    State { code: "TX", name: "Texas", iso: "ERCOT" },
    State { code: "VA", name: "Virginia", iso: "PJM" },
    State { code: "VT", name: "Vermont", iso: "ISO-NE" },
    State { code: "WI", name: "Wisconsin", iso: "MISO" },
    State { code: "WV", name: "West Virginia", iso: "PJM" },
];

static BA_TO_ISO: Lazy<HashMap<&'static str, &'static Iso>> = Lazy::new(|| {
    BA_ALIASES
        .iter()
        .filter_map(|(ba, iso)| lookup_iso(iso).map(|entry| (*ba, entry)))
        .collect()
});

/// All tracked ISOs in display order.
pub fn iso_list() -> &'static [Iso] {
    &ISOS
}

/// Look up an ISO by its canonical id (exact match).
pub fn lookup_iso(id: &str) -> Option<&'static Iso> {
    ISOS.iter().find(|iso| iso.id == id)
}

/// Resolve a balancing-authority code to its ISO.
///
/// The code is trimmed and upper-cased first. `None` means the authority is
/// outside the tracked markets.
pub fn iso_for_ba(code: &str) -> Option<&'static Iso> {
    let normalized = code.trim().to_ascii_uppercase();
    BA_TO_ISO.get(normalized.as_str()).copied()
}

/// Balancing-authority codes that resolve to `iso_id`, in table order.
pub fn ba_codes_for(iso_id: &str) -> Vec<&'static str> {
    BA_ALIASES
        .iter()
        .filter(|(_, iso)| *iso == iso_id)
        .map(|(ba, _)| *ba)
        .collect()
}

pub fn state_list() -> &'static [State] {
    &STATES
}

pub fn lookup_state(code: &str) -> Option<&'static State> {
    let normalized = code.trim().to_ascii_uppercase();
    STATES.iter().find(|s| s.code == normalized)
}

/// Match a full state name as printed in EIA tables ("New Mexico").
pub fn state_by_name(name: &str) -> Option<&'static State> {
    let name = name.trim();
    STATES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Parent ISO of a tracked state.
pub fn parent_iso(state_code: &str) -> Option<&'static Iso> {
    lookup_state(state_code).and_then(|s| lookup_iso(s.iso))
}
