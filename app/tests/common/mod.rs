//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for dashboard host integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use app_lib::{create_app_state, AppState, DashboardConfig};
use records::{GridDataset, ShippingDataset};
use tempfile::TempDir;

/// Maritime traffic document: 5 records over 2 years, 3 vessel types.
///
/// sum_kwh in GWh: Cruise 7, Passasjer 6, Fiskefartøy 3 (grand 16).
pub struct ShippingFixture;

impl ShippingFixture {
    pub const JSON: &'static str = r#"{
        "metadata": { "source": "fixture", "aggregated_records": 5 },
        "filters": {
            "years": [2023, 2024],
            "voyage_types": ["Innenlands", "Fra utlandet", "Til utlandet"],
            "phases": ["Cruise", "Ved kai", "Fiske"],
            "counties": ["Nordland", "Oslo", "Vestland"]
        },
        "data": [
            { "year": 2024, "vessel_type": "Passasjer", "gt_group": "0-399 GT",
              "voyage_type": "Innenlands", "phase": "Cruise", "county_name": "Vestland",
              "sum_kwh": 4000000, "sum_co2_tonnes": 40 },
            { "year": 2024, "vessel_type": "Cruise", "gt_group": "10000-24999 GT",
              "voyage_type": "Fra utlandet", "phase": "Ved kai", "county_name": "Vestland",
              "sum_kwh": 6000000, "sum_co2_tonnes": 60 },
            { "year": 2024, "vessel_type": "Fiskefartøy", "gt_group": "400-999 GT",
              "voyage_type": "Innenlands", "phase": "Fiske", "county_name": "Nordland",
              "sum_kwh": 3000000, "sum_co2_tonnes": 30 },
            { "year": 2023, "vessel_type": "Passasjer", "gt_group": "0-399 GT",
              "voyage_type": "Innenlands", "phase": "Cruise", "county_name": "Oslo",
              "sum_kwh": 2000000, "sum_co2_tonnes": 20 },
            { "year": 2023, "vessel_type": "Cruise", "gt_group": "10000-24999 GT",
              "voyage_type": "Til utlandet", "phase": "Cruise", "county_name": "Oslo",
              "sum_kwh": 1000000, "sum_co2_tonnes": null }
        ]
    }"#;

    pub fn dataset() -> ShippingDataset {
        ShippingDataset::from_json_str(Self::JSON).unwrap()
    }
}

/// Grid capacity document: 2 operators, 5 locations, 3 regions incl. the unknown bucket.
pub struct GridFixture;

impl GridFixture {
    pub const JSON: &'static str = r#"{
        "metadata": { "total_files": 2, "total_features": 5 },
        "grid_operators": {
            "bkk": {
                "publisher": "BKK Nett",
                "feature_count": 2,
                "locations": [
                    { "name": "Bergen", "kommune": "Bergen", "fylke": "Vestland",
                      "available_consumption": 12, "reserved_consumption": 3,
                      "available_production": -4.5, "coordinates": [5.32, 60.39] },
                    { "name": "Voss", "kommune": "", "fylke": "Vestland",
                      "available_consumption": null, "reserved_consumption": 1,
                      "available_production": 2 }
                ]
            },
            "elvia": {
                "publisher": "Elvia",
                "feature_count": 3,
                "locations": [
                    { "name": "Oslo havn", "kommune": "Oslo", "fylke": "Oslo",
                      "available_consumption": 15, "reserved_consumption": 0,
                      "available_production": 1 },
                    { "name": "Oslo sentrum", "kommune": "Oslo", "fylke": "Oslo",
                      "available_consumption": 5, "reserved_consumption": 2,
                      "available_production": 0 },
                    { "name": "Ukjent punkt",
                      "available_consumption": 0.5, "reserved_consumption": 0,
                      "available_production": 0 }
                ]
            }
        }
    }"#;

    pub fn dataset() -> GridDataset {
        GridDataset::from_json_str(Self::JSON).unwrap()
    }
}

/// Test harness for creating and managing test state.
pub struct TestHarness {
    pub state: AppState,
}

impl TestHarness {
    /// Create a new test harness with no data loaded.
    pub fn new() -> Self {
        Self::with_config(DashboardConfig::default())
    }

    pub fn with_config(config: DashboardConfig) -> Self {
        TestHarness { state: create_app_state(config) }
    }

    /// Create a harness with both fixture datasets loaded.
    pub fn with_data() -> Self {
        let harness = Self::new();
        harness.state.set_shipping(ShippingFixture::dataset()).unwrap();
        harness.state.set_grid(GridFixture::dataset()).unwrap();
        harness
    }

    pub fn pivot_cache_len(&self) -> usize {
        self.state.pivot_cache.lock().unwrap().len()
    }

    pub fn geo_cache_len(&self) -> usize {
        self.state.geo_cache.lock().unwrap().len()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes both fixture documents into a fresh temp dir.
pub fn write_fixture_files() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let shipping = dir.path().join("shipping.json");
    let grid = dir.path().join("grid_capacity.json");
    std::fs::File::create(&shipping)
        .unwrap()
        .write_all(ShippingFixture::JSON.as_bytes())
        .unwrap();
    std::fs::File::create(&grid)
        .unwrap()
        .write_all(GridFixture::JSON.as_bytes())
        .unwrap();
    (dir, shipping, grid)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
