//! FILENAME: core/pivot-engine/src/lib.rs
//! Aggregation subsystem for the dashboard.
//!
//! This crate turns the read-only records of the `records` crate into
//! presentation-ready tables and trees. Every function here is pure and
//! synchronous; the host owns the current selection and re-invokes the
//! engine when it changes.
//!
//! Layers:
//! - `definition`: Hashable selection and query values (what to compute)
//! - `filter`: Categorical + free-text filtering of record collections
//! - `measure`: Static measure registry and unit conversion
//! - `engine`: Pivot aggregation (HOW we calculate)
//! - `view`: Pivot output (WHAT we display)
//! - `geo`: fylke -> kommune -> station roll-up
//! - `sort`: Sorting, toggling and substring search
//! - `cache`: Memoization keyed by query

pub mod cache;
pub mod collate;
pub mod definition;
pub mod engine;
pub mod filter;
pub mod geo;
pub mod measure;
pub mod sort;
pub mod view;


pub use cache::MemoCache;
pub use definition::*;
pub use engine::{aggregate, calculate_pivot, year_totals, PivotCalculator};
pub use filter::{distinct_values, filter, Filterable};
pub use geo::{calculate_geo, rollup, GeoSums, GeoTree, ProductionBalance, RegionNode, SubregionNode};
pub use measure::{apply, resolve, try_resolve, MeasureSpec, DEFAULT_MEASURE, MEASURES};
pub use sort::{
    search, search_stations, sort, toggle_sort, PivotSortKey, SortDirection, Sortable,
    StationSortKey,
};
pub use view::{PivotRow, PivotTable, YearTotal};
