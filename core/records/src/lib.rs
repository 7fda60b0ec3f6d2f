//! FILENAME: core/records/src/lib.rs
//! Record Store for the dashboard.
//!
//! Loads the two read-only JSON snapshots the dashboard works on:
//! - `shipping`: flat maritime traffic records with per-measure quantities
//! - `grid`: grid operators and their capacity locations
//!
//! Nothing here is mutated after load. Aggregation lives in `pivot-engine`.

mod error;
mod grid;
mod shipping;
mod validate;


pub use error::{RecordsError, Result};
pub use grid::{region_label, GridDataset, GridLocation, GridMetadata, Operator};
pub use shipping::{
    FilterOptions, ShippingDataset, ShippingMetadata, ShippingRecord, YearTotalRecord,
};
pub use validate::{ValidationReport, ValidationWarning};

/// Label used for any categorical value the source leaves blank.
pub const UNKNOWN_LABEL: &str = "Ukjent";
