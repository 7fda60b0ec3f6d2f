//! FILENAME: app/src/lib.rs
// PURPOSE: Main library entry point (dashboard host).
// CONTEXT: Owns the only mutable state: the loaded data snapshot and the memo
// caches. The presentation layer calls the command functions with immutable
// selection values and renders whatever comes back.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use pivot_engine::{GeoQuery, GeoTree, MemoCache, PivotQuery, PivotTable};
use records::{GridDataset, ShippingDataset};

pub mod config;
pub mod error;
pub mod geo_commands;
pub mod logging;
pub mod pivot_commands;

pub use config::DashboardConfig;
pub use error::AppError;
pub use geo_commands::{
    get_geo_tree, get_grid_validation, search_stations, GeoResponse, SearchStationsRequest,
};
pub use logging::{init_log_file, init_logger, next_seq, write_log};
pub use pivot_commands::{
    get_filter_options, get_pivot_table, get_year_totals, list_measures, toggle_pivot_sort,
    FilterOptionsResponse, PivotRequest, PivotResponse, ToggleSortRequest,
};

/// Lock order: a cache before its dataset. Swapping a dataset holds the
/// matching cache lock, and a request holds it from reading the snapshot
/// until its result is stored, so no result outlives the data it came from.
pub struct AppState {
    pub config: DashboardConfig,
    /// Current maritime traffic snapshot; replaced wholesale on reload
    pub shipping: Mutex<Option<Arc<ShippingDataset>>>,
    /// Current grid capacity snapshot
    pub grid: Mutex<Option<Arc<GridDataset>>>,
    pub pivot_cache: Mutex<MemoCache<PivotQuery, PivotTable>>,
    pub geo_cache: Mutex<MemoCache<GeoQuery, GeoTree>>,
}

/// Locks `mutex`, naming it in the error if a previous holder panicked.
pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, name: &'static str) -> Result<MutexGuard<'a, T>, AppError> {
    mutex.lock().map_err(|_| AppError::LockPoisoned(name))
}

impl AppState {
    /// Replaces the shipping snapshot and drops every cached pivot.
    pub fn set_shipping(&self, dataset: ShippingDataset) -> Result<(), AppError> {
        log_info!("SYS", "shipping dataset: {} records", dataset.len());
        let mut cache = lock(&self.pivot_cache, "pivot_cache")?;
        *lock(&self.shipping, "shipping")? = Some(Arc::new(dataset));
        cache.invalidate();
        Ok(())
    }

    /// Replaces the grid snapshot and drops every cached roll-up.
    pub fn set_grid(&self, dataset: GridDataset) -> Result<(), AppError> {
        let report = dataset.validate();
        log_info!(
            "SYS",
            "grid dataset: {} operators, {} locations, {} warnings",
            dataset.operators.len(),
            dataset.location_count(),
            report.warnings.len()
        );
        let mut cache = lock(&self.geo_cache, "geo_cache")?;
        *lock(&self.grid, "grid")? = Some(Arc::new(dataset));
        cache.invalidate();
        Ok(())
    }

    pub fn load_shipping_from(&self, path: &Path) -> Result<(), AppError> {
        self.set_shipping(ShippingDataset::from_path(path)?)
    }

    pub fn load_grid_from(&self, path: &Path) -> Result<(), AppError> {
        self.set_grid(GridDataset::from_path(path)?)
    }

    /// Loads both documents named by the config.
    pub fn load_from_config(&self) -> Result<(), AppError> {
        self.load_shipping_from(&self.config.shipping_path)?;
        self.load_grid_from(&self.config.grid_path)
    }

    pub fn shipping_snapshot(&self) -> Result<Arc<ShippingDataset>, AppError> {
        lock(&self.shipping, "shipping")?
            .clone()
            .ok_or(AppError::NotLoaded("shipping"))
    }

    pub fn grid_snapshot(&self) -> Result<Arc<GridDataset>, AppError> {
        lock(&self.grid, "grid")?.clone().ok_or(AppError::NotLoaded("grid"))
    }
}

pub fn create_app_state(config: DashboardConfig) -> AppState {
    let capacity = config.cache_capacity;
    AppState {
        config,
        shipping: Mutex::new(None),
        grid: Mutex::new(None),
        pivot_cache: Mutex::new(MemoCache::new(capacity)),
        geo_cache: Mutex::new(MemoCache::new(capacity)),
    }
}

/// Headless start-up: config, logging, then both datasets.
pub fn run(config_path: Option<&Path>) -> Result<AppState, AppError> {
    let config = DashboardConfig::load(config_path)?;

    logging::set_console_echo(config.log_to_console);
    if let Some(path) = &config.log_file {
        match init_log_file(path) {
            Ok(path) => eprintln!("[LOG_INIT] Log file: {:?}", path),
            Err(e) => eprintln!("[LOG_INIT] FAILED: {}, continuing with console-only logging", e),
        }
    }
    init_logger(config.level_filter()?)?;

    let state = create_app_state(config);
    state.load_from_config()?;
    log_info!("SYS", "dashboard host ready");
    Ok(state)
}
