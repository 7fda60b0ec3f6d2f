//! FILENAME: app/src/geo_commands.rs
//! PURPOSE: Commands for the grid capacity view: roll-up tree, station search
//! and document validation.

use std::sync::Arc;

use pivot_engine::{
    calculate_geo, filter, search_stations as search_index, sort, GeoQuery, GeoTree, GridSelection,
    ProductionBalance, SortDirection, StationSortKey,
};
use records::{GridLocation, ValidationReport};
use serde::{Deserialize, Serialize};

use crate::{lock, log_debug, log_enter, log_exit, log_warn, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoResponse {
    pub tree: GeoTree,
    /// Sign breakdown of production headroom over the same stations
    pub balance: ProductionBalance,
    pub cached: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStationsRequest {
    #[serde(default)]
    pub selection: GridSelection,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub sort: Option<(StationSortKey, SortDirection)>,
    /// Maximum number of stations returned
    pub limit: Option<usize>,
}

/// Rolls the filtered grid locations up into fylke -> kommune -> station.
pub fn get_geo_tree(state: &AppState, query: GeoQuery) -> Result<GeoResponse, String> {
    log_enter!("GEO", "get_geo_tree", "constraints={}", query.selection.choices.len());

    let mut cache = lock(&state.geo_cache, "geo_cache")?;
    let grid = state.grid_snapshot()?;
    let hits_before = cache.hits();
    let tree: Arc<GeoTree> = cache.get_or_compute(&query, |q| calculate_geo(grid.locations(), q));
    let cached = cache.hits() > hits_before;
    drop(cache);

    let balance = ProductionBalance::from_locations(tree.regions.iter().flat_map(|r| r.stations()));
    log_debug!("GEO", "regions={} stations={} cached={}", tree.regions.len(), tree.sums.station_count, cached);

    let response = GeoResponse { tree: (*tree).clone(), balance, cached };
    log_exit!("GEO", "get_geo_tree", "stations={}", response.tree.sums.station_count);
    Ok(response)
}

/// Stations passing `selection` whose name, kommune or fylke contains `query`.
pub fn search_stations(state: &AppState, request: SearchStationsRequest) -> Result<Vec<GridLocation>, String> {
    log_enter!("GEO", "search_stations", "query={}", request.query);
    let grid = state.grid_snapshot()?;

    let candidates = filter(grid.locations(), &request.selection);
    let mut found = search_index(&candidates, &request.query);
    if let Some((key, direction)) = &request.sort {
        found = sort(&found, key, *direction);
    }
    if let Some(limit) = request.limit {
        found.truncate(limit);
    }

    let stations: Vec<GridLocation> = found.into_iter().cloned().collect();
    log_exit!("GEO", "search_stations", "found={}", stations.len());
    Ok(stations)
}

/// Consistency findings for the loaded grid document.
pub fn get_grid_validation(state: &AppState) -> Result<ValidationReport, String> {
    log_enter!("GEO", "get_grid_validation");
    let grid = state.grid_snapshot()?;
    let report = grid.validate();
    if !report.is_clean() {
        log_warn!("GEO", "grid document has {} warnings", report.warnings.len());
    }
    log_exit!("GEO", "get_grid_validation", "warnings={}", report.warnings.len());
    Ok(report)
}
