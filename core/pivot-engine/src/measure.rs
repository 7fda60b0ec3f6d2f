//! FILENAME: core/pivot-engine/src/measure.rs
//! Measure Resolver - static registry of the numeric measures.
//!
//! Every measure column of the shipping dataset has an entry here with its
//! display label, display unit and the divisor that converts the stored raw
//! quantity into that unit. The registry is fixed, not derived from data.

use serde::Serialize;

/// Display metadata and unit conversion for one measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasureSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    /// Raw value / divisor = display value. Always > 0.
    pub divisor: f64,
}

pub const DEFAULT_MEASURE: &str = "sum_kwh";

pub static MEASURES: &[MeasureSpec] = &[
    MeasureSpec { id: "sum_kwh", label: "Energibehov", unit: "GWh", divisor: 1_000_000.0 },
    MeasureSpec { id: "sum_kwh_shore_power", label: "Landstrøm", unit: "GWh", divisor: 1_000_000.0 },
    MeasureSpec { id: "sum_kwh_battery", label: "Batteri", unit: "GWh", divisor: 1_000_000.0 },
    MeasureSpec {
        id: "sum_fuel_mdo_equivalent_tonnes",
        label: "Drivstofforbruk (MDO-ekv.)",
        unit: "kt",
        divisor: 1_000.0,
    },
    MeasureSpec { id: "sum_co2_tonnes", label: "CO₂-utslipp", unit: "kt", divisor: 1_000.0 },
    MeasureSpec { id: "sum_co2e_tonnes", label: "CO₂e-utslipp", unit: "kt", divisor: 1_000.0 },
    MeasureSpec { id: "sum_nox_tonnes", label: "NOx-utslipp", unit: "tonn", divisor: 1.0 },
    MeasureSpec { id: "sum_sox_tonnes", label: "SOx-utslipp", unit: "tonn", divisor: 1.0 },
    MeasureSpec { id: "sum_pm10_tonnes", label: "PM10-utslipp", unit: "tonn", divisor: 1.0 },
    MeasureSpec { id: "sum_seconds", label: "Seilingstid", unit: "timer", divisor: 3_600.0 },
    MeasureSpec { id: "distance_kilometers", label: "Distanse", unit: "1000 km", divisor: 1_000.0 },
];

/// Looks up a measure, returning `None` for unregistered ids.
/// Use this at boundaries that receive ids from outside.
pub fn try_resolve(id: &str) -> Option<&'static MeasureSpec> {
    MEASURES.iter().find(|m| m.id == id)
}

/// Looks up a registered measure.
///
/// # Panics
/// Panics if `id` is not registered. Callers must only pass ids from
/// [`MEASURES`]; an unknown id is a programming error.
pub fn resolve(id: &str) -> &'static MeasureSpec {
    match try_resolve(id) {
        Some(spec) => spec,
        None => panic!("unknown measure id: {}", id),
    }
}

/// Converts a raw stored quantity into display units.
/// Absent or non-finite raw values count as 0.
pub fn apply(raw: Option<f64>, id: &str) -> f64 {
    resolve(id).convert(raw)
}

impl MeasureSpec {
    pub fn convert(&self, raw: Option<f64>) -> f64 {
        match raw {
            Some(v) if v.is_finite() => v / self.divisor,
            _ => 0.0,
        }
    }

    /// "Label (unit)" for column headers.
    pub fn heading(&self) -> String {
        format!("{} ({})", self.label, self.unit)
    }
}
