//! Pivot Table Commands
//!
//! This module provides the bridge between the presentation layer and the
//! pivot engine. Commands validate the request, resolve defaults from the
//! config and serve results through the memo cache.

use std::sync::Arc;

use pivot_engine::{
    calculate_pivot, distinct_values, toggle_sort, try_resolve, year_totals, MeasureSpec,
    PivotQuery, PivotSortKey, PivotTable, ShippingDimension, ShippingSelection, SortDirection,
    YearTotal, GT_GROUP_ORDER, MEASURES,
};
use records::FilterOptions;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::{lock, log_debug, log_enter, log_exit, log_warn, AppState};

// ============================================================================
// API TYPES
// ============================================================================

/// Request for one pivot table. Unset fields fall back to the config defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRequest {
    #[serde(default)]
    pub selection: ShippingSelection,
    pub primary: Option<ShippingDimension>,
    pub secondary: Option<ShippingDimension>,
    pub measure: Option<String>,
    #[serde(default)]
    pub sort: Option<(PivotSortKey, SortDirection)>,
}

/// A header click: `requested` against whatever `pivot.sort` currently is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSortRequest {
    pub pivot: PivotRequest,
    pub requested: PivotSortKey,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotResponse {
    pub table: PivotTable,
    /// "Label (unit)" for the value axis
    pub heading: String,
    pub unit: &'static str,
    pub sort: Option<(PivotSortKey, SortDirection)>,
    /// True when served from the memo cache
    pub cached: bool,
}

/// Values for every filter control. Lists the document omits are derived
/// from the records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub shipping: FilterOptions,
    pub fylker: Vec<String>,
    pub kommuner: Vec<String>,
    pub operators: Vec<String>,
}

// ============================================================================
// HELPERS
// ============================================================================

fn resolve_measure(id: &str) -> Result<&'static MeasureSpec, AppError> {
    try_resolve(id).ok_or_else(|| AppError::UnknownMeasure(id.to_string()))
}

fn build_query(state: &AppState, request: PivotRequest) -> Result<(PivotQuery, &'static MeasureSpec), AppError> {
    let measure = request
        .measure
        .unwrap_or_else(|| state.config.default_measure.clone());
    let spec = resolve_measure(&measure)?;

    let query = PivotQuery {
        selection: request.selection,
        primary: request.primary.unwrap_or(state.config.default_primary),
        secondary: request.secondary.unwrap_or(state.config.default_secondary),
        measure,
        sort: request.sort,
    };
    Ok((query, spec))
}

fn serve_pivot(state: &AppState, request: PivotRequest) -> Result<PivotResponse, AppError> {
    let (query, spec) = build_query(state, request)?;

    let mut cache = lock(&state.pivot_cache, "pivot_cache")?;
    let data = state.shipping_snapshot()?;
    let hits_before = cache.hits();
    let table: Arc<PivotTable> = cache.get_or_compute(&query, |q| calculate_pivot(&data.records, q));
    let cached = cache.hits() > hits_before;
    drop(cache);

    log_debug!(
        "PIVOT",
        "{}x{} measure={} rows={} cached={}",
        query.primary,
        query.secondary,
        query.measure,
        table.rows.len(),
        cached
    );

    Ok(PivotResponse {
        table: (*table).clone(),
        heading: spec.heading(),
        unit: spec.unit,
        sort: query.sort,
        cached,
    })
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Computes (or serves from cache) the pivot table for `request`.
pub fn get_pivot_table(state: &AppState, request: PivotRequest) -> Result<PivotResponse, String> {
    log_enter!("PIVOT", "get_pivot_table", "measure={:?}", request.measure);
    let response = serve_pivot(state, request)?;
    log_exit!("PIVOT", "get_pivot_table", "grand_total={}", response.table.grand_total);
    Ok(response)
}

/// Applies a header click and returns the re-ordered table.
/// Clicking the active key flips its direction; any other key starts descending.
pub fn toggle_pivot_sort(state: &AppState, request: ToggleSortRequest) -> Result<PivotResponse, String> {
    log_enter!("PIVOT", "toggle_pivot_sort", "requested={:?}", request.requested);

    let ToggleSortRequest { mut pivot, requested } = request;
    let direction = match &pivot.sort {
        Some((current, direction)) => toggle_sort(current, *direction, &requested),
        None => SortDirection::Descending,
    };
    pivot.sort = Some((requested, direction));

    let response = serve_pivot(state, pivot)?;
    log_exit!("PIVOT", "toggle_pivot_sort", "direction={:?}", direction);
    Ok(response)
}

/// Filter control values for both datasets. A dataset that is not loaded
/// contributes empty lists.
pub fn get_filter_options(state: &AppState) -> Result<FilterOptionsResponse, String> {
    log_enter!("PIVOT", "get_filter_options");
    let mut response = FilterOptionsResponse::default();

    if let Ok(data) = state.shipping_snapshot() {
        let mut options = data.filters.clone();
        if options.vessel_types.is_empty() {
            options.vessel_types = distinct_values(&data.records, ShippingDimension::VesselType);
        }
        if options.gt_groups.is_empty() {
            let present = distinct_values(&data.records, ShippingDimension::GtGroup);
            options.gt_groups = GT_GROUP_ORDER
                .iter()
                .filter(|band| present.iter().any(|p| p == *band))
                .map(|band| band.to_string())
                .collect();
        }
        if options.years.is_empty() {
            let mut years: Vec<i32> = data.records.iter().map(|r| r.year).collect();
            years.sort_unstable();
            years.dedup();
            options.years = years;
        }
        response.shipping = options;
    }

    if let Ok(grid) = state.grid_snapshot() {
        use pivot_engine::GridDimension;
        response.fylker = distinct_values(grid.locations(), GridDimension::Fylke);
        response.kommuner = distinct_values(grid.locations(), GridDimension::Kommune);
        response.operators = grid.operators.keys().cloned().collect();
    }

    log_exit!(
        "PIVOT",
        "get_filter_options",
        "counties={} fylker={}",
        response.shipping.counties.len(),
        response.fylker.len()
    );
    Ok(response)
}

/// Every registered measure, in registry order.
pub fn list_measures() -> Vec<MeasureSpec> {
    MEASURES.to_vec()
}

/// Per-year totals of `measure` over the records that pass `selection`.
pub fn get_year_totals(
    state: &AppState,
    selection: &ShippingSelection,
    measure: &str,
) -> Result<Vec<YearTotal>, String> {
    log_enter!("PIVOT", "get_year_totals", "measure={}", measure);
    let spec = resolve_measure(measure)?;
    let data = state.shipping_snapshot()?;
    let filtered = pivot_engine::filter(&data.records, selection);
    let computed = year_totals(filtered, measure);

    // The document's own table only describes the unfiltered records.
    let published = if selection.is_identity() {
        data.published_year_totals(measure)
    } else {
        None
    };
    let totals = match published {
        Some(published) => {
            let published: Vec<YearTotal> = published
                .into_iter()
                .map(|(year, raw)| YearTotal { year, value: spec.convert(Some(raw)) })
                .collect();
            if same_totals(&published, &computed) {
                published
            } else {
                log_warn!(
                    "PIVOT",
                    "published year totals for {} disagree with the records, using records",
                    measure
                );
                computed
            }
        }
        None => computed,
    };

    log_exit!("PIVOT", "get_year_totals", "years={}", totals.len());
    Ok(totals)
}

fn same_totals(a: &[YearTotal], b: &[YearTotal]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.year == y.year && (x.value - y.value).abs() <= 1e-9 * x.value.abs().max(1.0)
        })
}
