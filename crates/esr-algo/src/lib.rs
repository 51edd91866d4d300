//! # esr-algo: pure computations over the ledger and normalized sources
//!
//! - [`elcc`] - capacity weighting with generic and per-ISO factor tables
//! - [`merge`] - joins normalized metric maps into per-ISO data points
//! - [`roll_forward`] - derives state rows for a new period
//! - [`validation`] - structural, enum, numeric and cross-field ledger checks
//!
//! None of these functions touch the filesystem or network; the `esr-io`
//! crate supplies inputs and persists outputs.

pub mod elcc;
pub mod merge;
pub mod roll_forward;
pub mod validation;

pub use elcc::{effective_capacity, weighted_capacity, CapacitySummary, ElccFactors};
pub use merge::{build_dataset, merge, merge_entities, MetricMaps};
pub use roll_forward::{RollForward, RollForwardInputs, RollForwardOutcome};
pub use validation::{ensure_valid, validate_ledger};
