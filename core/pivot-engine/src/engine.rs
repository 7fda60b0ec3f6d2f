//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - The calculation core that turns records into a table.
//!
//! This module takes filtered shipping records plus a (primary, secondary,
//! measure) choice and produces a PivotTable ready for rendering.
//!
//! Algorithm:
//! 1. Single pass over records: accumulate cells[primary][secondary] and row totals
//! 2. Order rows descending by total (ties keep first-seen order)
//! 3. Order columns by the supplied contract, unknown keys appended as seen
//! 4. Sum column totals and the grand total once all rows are known

use std::cmp::Ordering;
use std::collections::BTreeMap;

use records::ShippingRecord;
use rustc_hash::FxHashMap;

use crate::definition::{PivotQuery, ShippingDimension};
use crate::filter::{filter, Filterable};
use crate::measure::{self, MeasureSpec};
use crate::view::{PivotRow, PivotTable, YearTotal};

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running sums for one primary key.
#[derive(Debug, Default)]
struct RowAccumulator {
    /// Order in which this primary key was first seen.
    first_seen: usize,
    cells: BTreeMap<String, f64>,
    total: f64,
}

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// The aggregation engine for one pivot table.
pub struct PivotCalculator<'a> {
    primary: ShippingDimension,
    secondary: ShippingDimension,
    measure: &'static MeasureSpec,
    column_order: &'a [&'a str],

    /// Accumulators indexed by primary key.
    rows: FxHashMap<String, RowAccumulator>,

    /// Secondary keys in first-seen order.
    seen_columns: Vec<String>,
}

impl<'a> PivotCalculator<'a> {
    /// Creates a calculator.
    ///
    /// # Panics
    /// Panics if `measure_id` is not a registered measure.
    pub fn new(
        primary: ShippingDimension,
        secondary: ShippingDimension,
        measure_id: &str,
        column_order: &'a [&'a str],
    ) -> Self {
        PivotCalculator {
            primary,
            secondary,
            measure: measure::resolve(measure_id),
            column_order,
            rows: FxHashMap::default(),
            seen_columns: Vec::new(),
        }
    }

    /// Executes the full calculation.
    pub fn calculate<'r>(mut self, records: impl IntoIterator<Item = &'r ShippingRecord>) -> PivotTable {
        // Step 1: Accumulate
        for record in records {
            self.accumulate(record);
        }

        // Step 2: Order rows
        let rows = self.ordered_rows();

        // Step 3: Order columns
        let columns = self.ordered_columns();

        // Step 4: Totals
        let mut column_totals: BTreeMap<String, f64> = BTreeMap::new();
        for row in &rows {
            for (key, value) in &row.cells {
                *column_totals.entry(key.clone()).or_insert(0.0) += value;
            }
        }
        let grand_total = rows.iter().map(|r| r.total).sum();

        log::debug!(
            "pivot {}x{} on {}: {} rows, {} columns",
            self.primary,
            self.secondary,
            self.measure.id,
            rows.len(),
            columns.len()
        );

        PivotTable {
            primary: self.primary,
            secondary: self.secondary,
            measure: self.measure.id.to_string(),
            columns,
            rows,
            column_totals,
            grand_total,
        }
    }

    fn accumulate(&mut self, record: &ShippingRecord) {
        let primary_key = record.dimension_value(self.primary).into_owned();
        let secondary_key = record.dimension_value(self.secondary).into_owned();
        let value = self.measure.convert(record.measures.get(self.measure.id).copied());

        if !self.seen_columns.contains(&secondary_key) {
            self.seen_columns.push(secondary_key.clone());
        }

        let next_index = self.rows.len();
        let row = self
            .rows
            .entry(primary_key)
            .or_insert_with(|| RowAccumulator { first_seen: next_index, ..Default::default() });

        *row.cells.entry(secondary_key).or_insert(0.0) += value;
        row.total += value;
    }

    /// Rows descending by total; equal totals keep first-seen order.
    fn ordered_rows(&mut self) -> Vec<PivotRow> {
        let mut accumulated: Vec<(String, RowAccumulator)> = self.rows.drain().collect();
        accumulated.sort_by_key(|(_, acc)| acc.first_seen);
        accumulated.sort_by(|(_, a), (_, b)| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

        accumulated
            .into_iter()
            .map(|(primary_key, acc)| PivotRow { primary_key, cells: acc.cells, total: acc.total })
            .collect()
    }

    /// The ordering contract first, then any key the contract does not name.
    fn ordered_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .column_order
            .iter()
            .filter(|key| self.seen_columns.iter().any(|seen| seen == *key))
            .map(|key| key.to_string())
            .collect();

        for seen in &self.seen_columns {
            if !self.column_order.contains(&seen.as_str()) {
                columns.push(seen.clone());
            }
        }
        columns
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Aggregates `records` into a pivot table of `measure_id` by
/// `primary` x `secondary`. This is the main entry point for the engine.
///
/// `column_order` is the presentation contract for secondary keys; keys found
/// in data but missing from it are appended in first-seen order. Pass an empty
/// slice to use first-seen order throughout.
///
/// # Panics
/// Panics if `measure_id` is not a registered measure.
pub fn aggregate<'r>(
    records: impl IntoIterator<Item = &'r ShippingRecord>,
    primary: ShippingDimension,
    secondary: ShippingDimension,
    measure_id: &str,
    column_order: &[&str],
) -> PivotTable {
    PivotCalculator::new(primary, secondary, measure_id, column_order).calculate(records)
}

/// Per-year totals of one measure, ascending by year.
pub fn year_totals<'r>(
    records: impl IntoIterator<Item = &'r ShippingRecord>,
    measure_id: &str,
) -> Vec<YearTotal> {
    let spec = measure::resolve(measure_id);
    let mut totals: FxHashMap<i32, f64> = FxHashMap::default();
    for record in records {
        *totals.entry(record.year).or_insert(0.0) += spec.convert(record.measures.get(spec.id).copied());
    }

    let mut totals: Vec<YearTotal> = totals
        .into_iter()
        .map(|(year, value)| YearTotal { year, value })
        .collect();
    totals.sort_by_key(|t| t.year);
    totals
}

/// Runs the full pivot pipeline for one query: filter, aggregate, then the
/// optional row re-ordering.
///
/// # Panics
/// Panics if the query names an unregistered measure.
pub fn calculate_pivot(records: &[ShippingRecord], query: &PivotQuery) -> PivotTable {
    let filtered = filter(records, &query.selection);
    let table = aggregate(
        filtered,
        query.primary,
        query.secondary,
        &query.measure,
        query.column_order(),
    );
    match &query.sort {
        Some((key, direction)) => table.sorted(key, *direction),
        None => table,
    }
}
