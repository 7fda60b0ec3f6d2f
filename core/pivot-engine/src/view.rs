//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - presentation-ready output of the aggregator.
//!
//! A `PivotTable` is derived and ephemeral: it is rebuilt from scratch on
//! every selection change and never mutated in place afterwards (sorting
//! produces a new table).
//!
//! Invariants:
//! - `row.total == sum(row.cells)` for every row
//! - `grand_total == sum(row totals) == sum(column_totals)`
//! - a missing cell is a display distinction only; it counts as 0
//!
//! Keyed maps are ordered so the serialized table is byte-stable; `columns`
//! carries the presentation order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::ShippingDimension;

/// One primary-key row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRow {
    pub primary_key: String,
    /// Secondary key -> converted sum. Keys with no contributing record are absent.
    pub cells: BTreeMap<String, f64>,
    pub total: f64,
}

impl PivotRow {
    /// The cell value, or `None` when no record contributed to it.
    pub fn cell(&self, secondary_key: &str) -> Option<f64> {
        self.cells.get(secondary_key).copied()
    }

    /// The cell value for arithmetic: absent cells are 0.
    pub fn value(&self, secondary_key: &str) -> f64 {
        self.cell(secondary_key).unwrap_or(0.0)
    }
}

/// Two-dimensional aggregate of one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable {
    pub primary: ShippingDimension,
    pub secondary: ShippingDimension,
    pub measure: String,
    /// Secondary keys in presentation order.
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
    pub column_totals: BTreeMap<String, f64>,
    pub grand_total: f64,
}

impl PivotTable {
    pub fn row(&self, primary_key: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.primary_key == primary_key)
    }

    pub fn column_total(&self, secondary_key: &str) -> f64 {
        self.column_totals.get(secondary_key).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Primary keys in row order.
    pub fn row_keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.primary_key.as_str()).collect()
    }

    /// Each column's share of the grand total, in column order.
    /// All shares are 0 when the grand total is 0.
    pub fn column_shares(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .map(|c| {
                let share = if self.grand_total != 0.0 {
                    self.column_total(c) / self.grand_total
                } else {
                    0.0
                };
                (c.clone(), share)
            })
            .collect()
    }
}

/// Per-year total of one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub value: f64,
}
