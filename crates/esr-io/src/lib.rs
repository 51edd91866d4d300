//! # esr-io: raw source ingestion and ledger/manifest persistence
//!
//! Everything that touches the filesystem or the network lives here:
//!
//! - [`table`] - CSV-exported workbooks, sheets and header-resolved frames
//! - [`layout`] - ordered layout candidates checked against a [`layout::LayoutRule`]
//! - [`columns`] - alias tables for drifting column headers
//! - [`sources`] - the wholesale, generator, peak-demand, queue and retail
//!   normalizers
//! - [`collect`] - collectors that degrade failed sources to empty output
//! - [`ledger`] - ledger load/append
//! - [`manifest`] - published dataset read/write
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use esr_io::sources::{queue::QueueCompletion, TabularSource};
//! use esr_io::table::Workbook;
//!
//! fn main() -> anyhow::Result<()> {
//!     let workbook = Workbook::open("queue", Path::new("data/raw/queued_up"))?;
//!     let rates = QueueCompletion::default().normalize(&workbook)?;
//!     for (iso, pct) in &rates.values {
//!         println!("{iso}: {pct}%");
//!     }
//!     Ok(())
//! }
//! ```

pub mod collect;
pub mod columns;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod manifest;
pub mod sources;
pub mod table;

pub use error::SourceError;
pub use ledger::{append_records, load_ledger, read_ledger};
pub use manifest::{default_metadata, load_dataset, write_dataset};
pub use sources::{SourceOutput, TabularSource};
