//! FILENAME: tests/test_pivot.rs
//! Integration tests for pivot commands.

mod common;

use app_lib::{
    create_app_state, get_filter_options, get_pivot_table, get_year_totals, list_measures,
    toggle_pivot_sort, DashboardConfig, PivotRequest, ToggleSortRequest,
};
use common::{assert_close, write_fixture_files, ShippingFixture, TestHarness};
use pivot_engine::{PivotSortKey, ShippingDimension, ShippingSelection, SortDirection};
use records::ShippingDataset;
use std::thread;
use std::time::Duration;

// ============================================================================
// GET PIVOT TABLE
// ============================================================================

#[test]
fn test_default_pivot_uses_config_defaults() {
    let harness = TestHarness::with_data();
    let response = get_pivot_table(&harness.state, PivotRequest::default()).unwrap();
    let table = &response.table;

    assert_eq!(table.primary, ShippingDimension::VesselType);
    assert_eq!(table.secondary, ShippingDimension::GtGroup);
    assert_eq!(table.measure, "sum_kwh");
    assert_eq!(response.heading, "Energibehov (GWh)");
    assert_eq!(response.unit, "GWh");
    assert_eq!(table.row_keys(), vec!["Cruise", "Passasjer", "Fiskefartøy"]);
    assert_eq!(table.columns, vec!["0-399 GT", "400-999 GT", "10000-24999 GT"]);
    assert_close(table.grand_total, 16.0);
    assert_close(table.row("Cruise").unwrap().value("10000-24999 GT"), 7.0);
}

#[test]
fn test_pivot_totals_are_conserved() {
    let harness = TestHarness::with_data();
    let request = PivotRequest {
        primary: Some(ShippingDimension::County),
        secondary: Some(ShippingDimension::Phase),
        measure: Some("sum_co2_tonnes".to_string()),
        ..Default::default()
    };
    let table = get_pivot_table(&harness.state, request).unwrap().table;

    let rows: f64 = table.rows.iter().map(|r| r.total).sum();
    let columns: f64 = table.column_totals.values().sum();
    assert_close(table.grand_total, rows);
    assert_close(table.grand_total, columns);
    assert_close(table.grand_total, 0.15);
}

#[test]
fn test_pivot_selection_narrows_rows() {
    let harness = TestHarness::with_data();
    let request = PivotRequest {
        selection: ShippingSelection::all().only(ShippingDimension::Year, "2024"),
        ..Default::default()
    };
    let table = get_pivot_table(&harness.state, request).unwrap().table;

    assert_close(table.grand_total, 13.0);
    assert_close(table.row("Passasjer").unwrap().total, 4.0);
}

#[test]
fn test_pivot_query_with_no_match_is_empty() {
    let harness = TestHarness::with_data();
    let request = PivotRequest {
        selection: ShippingSelection::all().with_query("ferje"),
        ..Default::default()
    };
    let table = get_pivot_table(&harness.state, request).unwrap().table;

    assert!(table.is_empty());
    assert_eq!(table.grand_total, 0.0);
}

#[test]
fn test_pivot_request_from_json() {
    let harness = TestHarness::with_data();
    let json = r#"{
        "selection": { "choices": { "county": { "kind": "only", "value": "Vestland" } } },
        "primary": "county",
        "secondary": "year",
        "measure": "sum_co2_tonnes"
    }"#;
    let request: PivotRequest = serde_json::from_str(json).unwrap();
    let table = get_pivot_table(&harness.state, request).unwrap().table;

    assert_eq!(table.row_keys(), vec!["Vestland"]);
    assert_close(table.row("Vestland").unwrap().value("2024"), 0.1);
    assert_eq!(table.row("Vestland").unwrap().cell("2023"), None);
}

#[test]
fn test_pivot_response_serializes_camel_case() {
    let harness = TestHarness::with_data();
    let response = get_pivot_table(&harness.state, PivotRequest::default()).unwrap();
    let value = serde_json::to_value(&response).unwrap();

    assert!(value["table"]["grandTotal"].is_number());
    assert_eq!(value["table"]["rows"][0]["primaryKey"], "Cruise");
    assert_eq!(value["cached"], false);
}

#[test]
fn test_unknown_measure_is_rejected() {
    let harness = TestHarness::with_data();
    let request = PivotRequest { measure: Some("sum_unobtainium".to_string()), ..Default::default() };

    let err = get_pivot_table(&harness.state, request).unwrap_err();
    assert!(err.contains("unknown measure"), "{}", err);
    assert_eq!(harness.pivot_cache_len(), 0);
}

#[test]
fn test_pivot_without_data_fails() {
    let harness = TestHarness::new();
    let err = get_pivot_table(&harness.state, PivotRequest::default()).unwrap_err();
    assert_eq!(err, "no shipping dataset loaded");
}

// ============================================================================
// MEMO CACHE
// ============================================================================

#[test]
fn test_repeated_request_is_served_from_cache() {
    let harness = TestHarness::with_data();

    let first = get_pivot_table(&harness.state, PivotRequest::default()).unwrap();
    let second = get_pivot_table(&harness.state, PivotRequest::default()).unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.table, second.table);
    assert_eq!(harness.pivot_cache_len(), 1);
}

#[test]
fn test_explicit_defaults_share_cache_entry() {
    let harness = TestHarness::with_data();
    get_pivot_table(&harness.state, PivotRequest::default()).unwrap();

    let explicit = PivotRequest {
        primary: Some(ShippingDimension::VesselType),
        secondary: Some(ShippingDimension::GtGroup),
        measure: Some("sum_kwh".to_string()),
        ..Default::default()
    };
    assert!(get_pivot_table(&harness.state, explicit).unwrap().cached);
}

#[test]
fn test_reload_invalidates_pivot_cache() {
    let harness = TestHarness::with_data();
    get_pivot_table(&harness.state, PivotRequest::default()).unwrap();
    assert_eq!(harness.pivot_cache_len(), 1);

    harness.state.set_shipping(ShippingFixture::dataset()).unwrap();
    assert_eq!(harness.pivot_cache_len(), 0);
    assert!(!get_pivot_table(&harness.state, PivotRequest::default()).unwrap().cached);
}

const SINGLE_RECORD_JSON: &str = r#"{
    "data": [
        { "year": 2024, "vessel_type": "Passasjer", "gt_group": "0-399 GT",
          "voyage_type": "Innenlands", "phase": "Cruise", "county_name": "Vestland",
          "sum_kwh": 4000000 }
    ]
}"#;

#[test]
fn test_reload_racing_a_request_never_leaves_old_table_cached() {
    let harness = TestHarness::with_data();
    let state = &harness.state;
    let reloaded = ShippingDataset::from_json_str(SINGLE_RECORD_JSON).unwrap();

    thread::scope(|scope| {
        // Park both the request and the reload behind the cache lock, then let them race.
        let parked = state.pivot_cache.lock().unwrap();
        let request = scope.spawn(|| get_pivot_table(state, PivotRequest::default()).unwrap());
        thread::sleep(Duration::from_millis(20));
        let reload = scope.spawn(move || state.set_shipping(reloaded).unwrap());
        thread::sleep(Duration::from_millis(20));
        drop(parked);

        let in_flight = request.join().unwrap();
        reload.join().unwrap();
        let total = in_flight.table.grand_total;
        assert!((total - 16.0).abs() < 1e-9 || (total - 4.0).abs() < 1e-9, "got {}", total);
    });

    let after = get_pivot_table(state, PivotRequest::default()).unwrap();
    assert_close(after.table.grand_total, 4.0);
    assert_eq!(after.table.row_keys(), vec!["Passasjer"]);
}

// ============================================================================
// SORT TOGGLING
// ============================================================================

#[test]
fn test_toggle_new_key_starts_descending() {
    let harness = TestHarness::with_data();
    let request = ToggleSortRequest { pivot: PivotRequest::default(), requested: PivotSortKey::Total };

    let response = toggle_pivot_sort(&harness.state, request).unwrap();
    assert_eq!(response.sort, Some((PivotSortKey::Total, SortDirection::Descending)));
    assert_eq!(response.table.row_keys(), vec!["Cruise", "Passasjer", "Fiskefartøy"]);
}

#[test]
fn test_toggle_same_key_flips_and_restores() {
    let harness = TestHarness::with_data();
    let first = toggle_pivot_sort(
        &harness.state,
        ToggleSortRequest { pivot: PivotRequest::default(), requested: PivotSortKey::Total },
    )
    .unwrap();

    let second = toggle_pivot_sort(
        &harness.state,
        ToggleSortRequest {
            pivot: PivotRequest { sort: first.sort.clone(), ..Default::default() },
            requested: PivotSortKey::Total,
        },
    )
    .unwrap();
    assert_eq!(second.sort, Some((PivotSortKey::Total, SortDirection::Ascending)));
    assert_eq!(second.table.row_keys(), vec!["Fiskefartøy", "Passasjer", "Cruise"]);

    let third = toggle_pivot_sort(
        &harness.state,
        ToggleSortRequest {
            pivot: PivotRequest { sort: second.sort.clone(), ..Default::default() },
            requested: PivotSortKey::Total,
        },
    )
    .unwrap();
    assert_eq!(third.sort, first.sort);
    assert_eq!(third.table.row_keys(), first.table.row_keys());
}

#[test]
fn test_toggle_other_key_resets_to_descending() {
    let harness = TestHarness::with_data();
    let request = ToggleSortRequest {
        pivot: PivotRequest {
            sort: Some((PivotSortKey::Total, SortDirection::Ascending)),
            ..Default::default()
        },
        requested: PivotSortKey::Label,
    };

    let response = toggle_pivot_sort(&harness.state, request).unwrap();
    assert_eq!(response.sort, Some((PivotSortKey::Label, SortDirection::Descending)));
    assert_eq!(response.table.row_keys(), vec!["Passasjer", "Fiskefartøy", "Cruise"]);
}

#[test]
fn test_sorting_keeps_totals() {
    let harness = TestHarness::with_data();
    let unsorted = get_pivot_table(&harness.state, PivotRequest::default()).unwrap().table;
    let request = ToggleSortRequest {
        pivot: PivotRequest::default(),
        requested: PivotSortKey::Column("0-399 GT".to_string()),
    };
    let sorted = toggle_pivot_sort(&harness.state, request).unwrap().table;

    assert_eq!(sorted.rows[0].primary_key, "Passasjer");
    assert_eq!(sorted.grand_total, unsorted.grand_total);
    assert_eq!(sorted.column_totals, unsorted.column_totals);
}

// ============================================================================
// FILTER OPTIONS, MEASURES, YEAR TOTALS
// ============================================================================

#[test]
fn test_filter_options_fill_missing_lists() {
    let harness = TestHarness::with_data();
    let options = get_filter_options(&harness.state).unwrap();

    assert_eq!(options.shipping.years, vec![2023, 2024]);
    assert_eq!(options.shipping.vessel_types, vec!["Cruise", "Fiskefartøy", "Passasjer"]);
    assert_eq!(options.shipping.gt_groups, vec!["0-399 GT", "400-999 GT", "10000-24999 GT"]);
    assert_eq!(options.fylker, vec!["Oslo", "Ukjent", "Vestland"]);
    assert_eq!(options.kommuner, vec!["Bergen", "Oslo", "Ukjent"]);
    assert_eq!(options.operators, vec!["bkk", "elvia"]);
}

#[test]
fn test_filter_options_without_data_are_empty() {
    let harness = TestHarness::new();
    let options = get_filter_options(&harness.state).unwrap();
    assert!(options.shipping.years.is_empty());
    assert!(options.fylker.is_empty());
}

#[test]
fn test_list_measures() {
    let measures = list_measures();
    assert_eq!(measures.len(), 11);
    assert_eq!(measures[0].id, "sum_kwh");
    assert!(measures.iter().any(|m| m.id == "sum_seconds" && m.unit == "timer"));
}

#[test]
fn test_year_totals_follow_selection() {
    let harness = TestHarness::with_data();

    let all = get_year_totals(&harness.state, &ShippingSelection::all(), "sum_kwh").unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].year, 2023);
    assert_close(all[0].value, 3.0);
    assert_close(all[1].value, 13.0);

    let nordland = ShippingSelection::all().only(ShippingDimension::County, "Nordland");
    let totals = get_year_totals(&harness.state, &nordland, "sum_kwh").unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].year, 2024);

    assert!(get_year_totals(&harness.state, &nordland, "bogus").is_err());
}

fn with_published_totals(kwh_2023: f64, kwh_2024: f64) -> ShippingDataset {
    let mut dataset = ShippingFixture::dataset();
    let json = format!(
        r#"[{{ "year": 2024, "sum_kwh": {} }}, {{ "year": 2023, "sum_kwh": {} }}]"#,
        kwh_2024, kwh_2023
    );
    dataset.year_totals = serde_json::from_str(&json).unwrap();
    dataset
}

#[test]
fn test_year_totals_use_published_table_when_it_agrees() {
    let harness = TestHarness::new();
    harness.state.set_shipping(with_published_totals(3_000_000.0, 13_000_000.0)).unwrap();

    let totals = get_year_totals(&harness.state, &ShippingSelection::all(), "sum_kwh").unwrap();
    let years: Vec<i32> = totals.iter().map(|t| t.year).collect();
    assert_eq!(years, vec![2023, 2024]);
    assert_close(totals[0].value, 3.0);
    assert_close(totals[1].value, 13.0);
}

#[test]
fn test_year_totals_prefer_records_over_stale_published_table() {
    let harness = TestHarness::new();
    harness.state.set_shipping(with_published_totals(99_000_000.0, 13_000_000.0)).unwrap();

    let totals = get_year_totals(&harness.state, &ShippingSelection::all(), "sum_kwh").unwrap();
    assert_close(totals[0].value, 3.0);
    assert_close(totals[1].value, 13.0);

    // A measure missing from the table falls back to the records.
    let co2 = get_year_totals(&harness.state, &ShippingSelection::all(), "sum_co2_tonnes").unwrap();
    assert_eq!(co2.len(), 2);
    assert_close(co2[1].value, 0.13);
}

// ============================================================================
// LOADING FROM FILES
// ============================================================================

#[test]
fn test_load_from_config_paths() {
    let (_dir, shipping, grid) = write_fixture_files();
    let config = DashboardConfig { shipping_path: shipping, grid_path: grid, ..Default::default() };
    let state = create_app_state(config);

    state.load_from_config().unwrap();
    assert_eq!(state.shipping_snapshot().unwrap().len(), 5);
    assert_eq!(state.grid_snapshot().unwrap().location_count(), 5);
}

#[test]
fn test_load_missing_file_fails() {
    let config = DashboardConfig {
        shipping_path: "does/not/exist.json".into(),
        ..Default::default()
    };
    let state = create_app_state(config);
    let err = state.load_from_config().unwrap_err();
    assert!(err.to_string().starts_with("failed to load dataset"), "{}", err);
}
