//! FILENAME: core/pivot-engine/src/definition.rs
//! Dashboard Definitions - The immutable selection values.
//!
//! This module contains all the types needed to DESCRIBE a computation:
//! which dimensions exist, what the user picked in each filter, and which
//! pivot or roll-up to compute. These structures are designed to be:
//! - Hashable (they are the keys of the memo cache)
//! - Serializable (sent from the presentation layer as plain JSON)
//! - Immutable snapshots of user intent

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sort::{PivotSortKey, SortDirection, StationSortKey};

/// Gross-tonnage size bands, smallest to largest.
/// This is the column order of every size-band pivot and is never inferred from data.
pub const GT_GROUP_ORDER: &[&str] = &[
    "0-399 GT",
    "400-999 GT",
    "1000-2999 GT",
    "3000-4999 GT",
    "5000-9999 GT",
    "10000-24999 GT",
    "25000-49999 GT",
    "50000-99999 GT",
    ">=100000 GT",
];

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Categorical columns of a shipping record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingDimension {
    Year,
    VesselType,
    GtGroup,
    VoyageType,
    Phase,
    County,
}

impl ShippingDimension {
    pub const ALL: [ShippingDimension; 6] = [
        ShippingDimension::Year,
        ShippingDimension::VesselType,
        ShippingDimension::GtGroup,
        ShippingDimension::VoyageType,
        ShippingDimension::Phase,
        ShippingDimension::County,
    ];

    /// Column name in the source document.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingDimension::Year => "year",
            ShippingDimension::VesselType => "vessel_type",
            ShippingDimension::GtGroup => "gt_group",
            ShippingDimension::VoyageType => "voyage_type",
            ShippingDimension::Phase => "phase",
            ShippingDimension::County => "county_name",
        }
    }

    /// The fixed column ordering for this dimension, if it has one.
    pub fn predefined_order(&self) -> Option<&'static [&'static str]> {
        match self {
            ShippingDimension::GtGroup => Some(GT_GROUP_ORDER),
            _ => None,
        }
    }
}

impl fmt::Display for ShippingDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShippingDimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s || (s == "county" && *d == ShippingDimension::County))
            .ok_or_else(|| format!("unknown shipping dimension: {}", s))
    }
}

/// Categorical columns of a grid location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDimension {
    Operator,
    Fylke,
    Kommune,
}

impl GridDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridDimension::Operator => "operator",
            GridDimension::Fylke => "fylke",
            GridDimension::Kommune => "kommune",
        }
    }
}

impl fmt::Display for GridDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FILTER SELECTION
// ============================================================================

/// What the user picked in one filter control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Choice {
    /// No constraint on this dimension.
    #[default]
    All,
    /// Exact match on one category value.
    Only(String),
}

impl Choice {
    pub fn only(value: impl Into<String>) -> Self {
        Choice::Only(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

static UNCONSTRAINED: Choice = Choice::All;

/// The complete filter state: one choice per constrained dimension plus an
/// optional free-text query. Dimensions absent from `choices` are unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection<D: Ord> {
    #[serde(default = "BTreeMap::new")]
    pub choices: BTreeMap<D, Choice>,
    #[serde(default)]
    pub query: Option<String>,
}

impl<D: Ord> Default for FilterSelection<D> {
    fn default() -> Self {
        FilterSelection { choices: BTreeMap::new(), query: None }
    }
}

impl<D: Ord + Copy> FilterSelection<D> {
    /// The identity selection: "all" everywhere, no query.
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns a copy with `dimension` set to `choice`.
    pub fn with(mut self, dimension: D, choice: Choice) -> Self {
        self.choices.insert(dimension, choice);
        self
    }

    /// Returns a copy constrained to `value` on `dimension`.
    pub fn only(self, dimension: D, value: impl Into<String>) -> Self {
        self.with(dimension, Choice::Only(value.into()))
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn choice(&self, dimension: D) -> &Choice {
        self.choices.get(&dimension).unwrap_or(&UNCONSTRAINED)
    }

    /// The query if it has any non-whitespace content.
    pub fn effective_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// True when this selection lets every record through.
    pub fn is_identity(&self) -> bool {
        self.choices.values().all(Choice::is_all) && self.effective_query().is_none()
    }

    /// Constrained dimensions and their wanted values.
    pub fn constraints(&self) -> impl Iterator<Item = (D, &str)> {
        self.choices.iter().filter_map(|(d, c)| match c {
            Choice::All => None,
            Choice::Only(v) => Some((*d, v.as_str())),
        })
    }
}

pub type ShippingSelection = FilterSelection<ShippingDimension>;
pub type GridSelection = FilterSelection<GridDimension>;

// ============================================================================
// QUERIES (memo cache keys)
// ============================================================================

/// Everything that determines one pivot table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotQuery {
    #[serde(default)]
    pub selection: ShippingSelection,
    pub primary: ShippingDimension,
    pub secondary: ShippingDimension,
    pub measure: String,
    /// Row ordering; `None` keeps the default descending-by-total order.
    #[serde(default)]
    pub sort: Option<(PivotSortKey, SortDirection)>,
}

impl PivotQuery {
    pub fn new(
        primary: ShippingDimension,
        secondary: ShippingDimension,
        measure: impl Into<String>,
    ) -> Self {
        PivotQuery {
            selection: ShippingSelection::all(),
            primary,
            secondary,
            measure: measure.into(),
            sort: None,
        }
    }

    pub fn with_selection(mut self, selection: ShippingSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn sorted_by(mut self, key: PivotSortKey, direction: SortDirection) -> Self {
        self.sort = Some((key, direction));
        self
    }

    /// Column ordering contract for the secondary dimension.
    pub fn column_order(&self) -> &'static [&'static str] {
        self.secondary.predefined_order().unwrap_or(&[])
    }
}

/// Everything that determines one geographic roll-up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoQuery {
    #[serde(default)]
    pub selection: GridSelection,
    /// Optional re-ordering of leaves; `None` keeps descending consumption.
    #[serde(default)]
    pub station_sort: Option<(StationSortKey, SortDirection)>,
}
