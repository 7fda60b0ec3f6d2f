//! FILENAME: core/records/src/grid.rs
//! Electrical grid capacity dataset: operators owning capacity locations.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::UNKNOWN_LABEL;

// ============================================================================
// LOCATION
// ============================================================================

/// One capacity point (substation or area) published by a grid operator.
///
/// Capacities are in megawatts. A negative `available_production` means the
/// location already has surplus generation; the sign is kept exactly as
/// published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLocation {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default, deserialize_with = "optional_label")]
    pub kommune: Option<String>,

    #[serde(default, deserialize_with = "optional_label")]
    pub fylke: Option<String>,

    #[serde(default, deserialize_with = "capacity")]
    pub available_consumption: f64,

    #[serde(default, deserialize_with = "capacity")]
    pub reserved_consumption: f64,

    #[serde(default, deserialize_with = "capacity")]
    pub available_production: f64,

    /// Raw GeoJSON coordinates, carried through untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub coordinates: Value,

    /// Key of the owning operator. Filled in by the dataset on load.
    #[serde(default)]
    pub operator_id: String,
}

fn default_name() -> String {
    "Unknown".to_string()
}

/// The label a region is grouped and filtered under: blank or missing
/// values read as [`UNKNOWN_LABEL`].
pub fn region_label(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN_LABEL,
    }
}

impl GridLocation {
    pub fn fylke_label(&self) -> &str {
        region_label(self.fylke.as_deref())
    }

    pub fn kommune_label(&self) -> &str {
        region_label(self.kommune.as_deref())
    }
}

/// Missing, null, or blank labels all read as `None`.
fn optional_label<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Capacities are numbers in the source, but null and the odd string occur.
fn capacity<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

// ============================================================================
// OPERATOR
// ============================================================================

/// A grid operator and the locations it publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    /// Key in the `grid_operators` map. Filled in by the dataset on load.
    #[serde(default)]
    pub operator_id: String,

    #[serde(rename = "publisher", default)]
    pub publisher_name: String,

    #[serde(rename = "feature_count", default)]
    pub location_count: usize,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub locations: Vec<GridLocation>,
}

// ============================================================================
// DOCUMENT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridMetadata {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_files: Option<u64>,
    #[serde(default)]
    pub total_features: Option<u64>,
}

/// The loaded grid dataset. Operators are keyed and ordered by operator id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridDataset {
    #[serde(default)]
    pub metadata: GridMetadata,

    #[serde(rename = "grid_operators")]
    pub operators: BTreeMap<String, Operator>,
}

impl GridDataset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let dataset: GridDataset = serde_json::from_str(json)?;
        Ok(dataset.link_operators())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let dataset: GridDataset = serde_json::from_reader(reader)?;
        Ok(dataset.link_operators())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Builds a dataset from operators already in memory.
    pub fn from_operators(operators: impl IntoIterator<Item = Operator>) -> Self {
        let operators = operators
            .into_iter()
            .map(|op| (op.operator_id.clone(), op))
            .collect();
        GridDataset { metadata: GridMetadata::default(), operators }.link_operators()
    }

    /// Stamps every operator and location with its operator key and clears
    /// blank region labels, matching what the loader does.
    fn link_operators(mut self) -> Self {
        for (id, operator) in self.operators.iter_mut() {
            operator.operator_id = id.clone();
            for location in operator.locations.iter_mut() {
                location.operator_id = id.clone();
                location.fylke = location.fylke.take().filter(|s| !s.trim().is_empty());
                location.kommune = location.kommune.take().filter(|s| !s.trim().is_empty());
            }
        }
        log::debug!(
            "loaded grid dataset: {} operators, {} locations",
            self.operators.len(),
            self.location_count()
        );
        self
    }

    pub fn operator(&self, id: &str) -> Option<&Operator> {
        self.operators.get(id)
    }

    /// Every location, in operator order.
    pub fn locations(&self) -> impl Iterator<Item = &GridLocation> {
        self.operators.values().flat_map(|op| op.locations.iter())
    }

    pub fn location_count(&self) -> usize {
        self.operators.values().map(|op| op.locations.len()).sum()
    }
}
