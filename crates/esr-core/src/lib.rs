//! # esr-core: Electricity supply-response domain model
//!
//! Shared types for the normalization-and-validation pipeline:
//!
//! - [`registry`] - tracked ISO/RTO markets, balancing-authority aliases and
//!   the state → ISO assignment
//! - [`technology`] - technology buckets and generation assets
//! - [`record`] - the versioned ledger schema, raw [`record::LedgerRow`]s and
//!   typed [`record::MetricRecord`]s
//! - [`dataset`] - the published per-ISO dataset manifest
//! - [`diagnostics`] - warning/error collection used by every stage
//! - [`units`] - MW/GW newtypes
//!
//! Nothing in this crate performs I/O.

pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod record;
pub mod registry;
pub mod technology;
pub mod units;

pub use dataset::{DatasetMetadata, IsoDataPoint, PublishedDataset};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{EsrError, EsrResult};
pub use record::{ColorGroup, Ledger, LedgerRow, MetricRecord, RowKey, View};
pub use registry::{Iso, State};
pub use technology::{GenerationAsset, TechCategory};
pub use units::{Gigawatts, Megawatts};
