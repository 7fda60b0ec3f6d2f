//! FILENAME: core/records/src/shipping.rs
//! Maritime traffic dataset: flat emission/energy records.
//!
//! Each record is one aggregated observation for a
//! (year, vessel type, GT group, phase, voyage type, county) combination,
//! carrying every numeric measure column of the source table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RecordsError, Result};
use crate::UNKNOWN_LABEL;

// ============================================================================
// RECORD
// ============================================================================

/// One shipping observation. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawShippingRecord")]
pub struct ShippingRecord {
    pub year: i32,
    pub vessel_type: String,
    pub gt_group: String,
    pub voyage_type: String,
    pub phase: String,
    pub county_name: String,
    /// Measure id -> raw stored quantity. Only numeric columns are kept.
    #[serde(flatten)]
    pub measures: BTreeMap<String, f64>,
}

impl ShippingRecord {
    /// Raw quantity for a measure column; absent columns read as 0.
    pub fn measure(&self, id: &str) -> f64 {
        self.measures.get(id).copied().unwrap_or(0.0)
    }
}

/// Wire shape of a record: the categorical columns plus every other column.
#[derive(Deserialize)]
struct RawShippingRecord {
    year: Value,
    #[serde(default)]
    vessel_type: Option<String>,
    #[serde(default)]
    gt_group: Option<String>,
    #[serde(default)]
    voyage_type: Option<String>,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    county_name: Option<String>,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

impl TryFrom<RawShippingRecord> for ShippingRecord {
    type Error = RecordsError;

    fn try_from(raw: RawShippingRecord) -> Result<Self> {
        let year = parse_year(&raw.year)?;

        let measures = raw
            .rest
            .into_iter()
            .filter_map(|(key, value)| numeric(&value).map(|n| (key, n)))
            .collect();

        Ok(ShippingRecord {
            year,
            vessel_type: category(raw.vessel_type),
            gt_group: category(raw.gt_group),
            voyage_type: category(raw.voyage_type),
            phase: category(raw.phase),
            county_name: category(raw.county_name),
            measures,
        })
    }
}

/// Years arrive as integers, or as integral floats from spreadsheet exports.
fn parse_year(value: &Value) -> Result<i32> {
    let year = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    year.and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| RecordsError::InvalidRecord(format!("year is not an integer: {}", value)))
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn category(value: Option<String>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => UNKNOWN_LABEL.to_string(),
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// Filter lists published alongside the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub years: Vec<i32>,
    #[serde(default)]
    pub voyage_types: Vec<String>,
    #[serde(default)]
    pub phases: Vec<String>,
    #[serde(default)]
    pub counties: Vec<String>,
    #[serde(default)]
    pub vessel_types: Vec<String>,
    #[serde(default)]
    pub gt_groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingMetadata {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub total_raw_records: Option<u64>,
    #[serde(default)]
    pub aggregated_records: Option<u64>,
}

/// Pre-aggregated per-year row from the `year_totals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawYearTotal")]
pub struct YearTotalRecord {
    pub year: i32,
    #[serde(flatten)]
    pub measures: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct RawYearTotal {
    year: Value,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

impl TryFrom<RawYearTotal> for YearTotalRecord {
    type Error = RecordsError;

    fn try_from(raw: RawYearTotal) -> Result<Self> {
        Ok(YearTotalRecord {
            year: parse_year(&raw.year)?,
            measures: raw
                .rest
                .into_iter()
                .filter_map(|(key, value)| numeric(&value).map(|n| (key, n)))
                .collect(),
        })
    }
}

/// The loaded maritime dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingDataset {
    #[serde(default)]
    pub metadata: ShippingMetadata,
    #[serde(default)]
    pub filters: FilterOptions,
    #[serde(rename = "data")]
    pub records: Vec<ShippingRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub year_totals: Vec<YearTotalRecord>,
}

impl ShippingDataset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let dataset: ShippingDataset = serde_json::from_str(json)?;
        dataset.log_loaded();
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let dataset: ShippingDataset = serde_json::from_reader(reader)?;
        dataset.log_loaded();
        Ok(dataset)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw per-year totals of `measure` from the published `year_totals`
    /// table, ascending by year. `None` when the table is absent or any year
    /// lacks the measure.
    pub fn published_year_totals(&self, measure: &str) -> Option<Vec<(i32, f64)>> {
        if self.year_totals.is_empty() {
            return None;
        }
        let mut totals = self
            .year_totals
            .iter()
            .map(|row| row.measures.get(measure).map(|value| (row.year, *value)))
            .collect::<Option<Vec<_>>>()?;
        totals.sort_by_key(|(year, _)| *year);
        Some(totals)
    }

    fn log_loaded(&self) {
        log::debug!(
            "loaded shipping dataset: {} records, {} years",
            self.records.len(),
            self.filters.years.len()
        );
    }
}
