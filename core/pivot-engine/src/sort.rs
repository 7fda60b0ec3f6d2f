//! FILENAME: core/pivot-engine/src/sort.rs
//! Sort/Search Index - comparator-based ordering and substring search.
//!
//! Sorting is stable and returns a new ordering; nothing is sorted in place
//! behind the caller's back. Toggling follows the table-header convention:
//! the same column flips direction, a new column starts descending.

use std::cmp::Ordering;

use records::GridLocation;
use serde::{Deserialize, Serialize};

use crate::collate::{compare_text, fold_case};
use crate::view::{PivotRow, PivotTable};

// ============================================================================
// DIRECTION AND TOGGLING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Direction after the user clicks `requested` while `current` is active.
pub fn toggle_sort<K: PartialEq>(
    current_key: &K,
    current_direction: SortDirection,
    requested_key: &K,
) -> SortDirection {
    if current_key == requested_key {
        current_direction.flipped()
    } else {
        SortDirection::Descending
    }
}

// ============================================================================
// SORT VALUES
// ============================================================================

/// A comparable field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl SortValue<'_> {
    /// Numbers before text; numbers numerically, text by collation.
    pub fn compare(&self, other: &SortValue<'_>) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
            (SortValue::Text(a), SortValue::Text(b)) => compare_text(a, b),
        }
    }
}

/// Something with named sortable fields.
pub trait Sortable {
    type Key;

    fn sort_value(&self, key: &Self::Key) -> SortValue<'_>;
}

/// Stable sort of `items` by `key`.
pub fn sort<T: Sortable + Clone>(items: &[T], key: &T::Key, direction: SortDirection) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| direction.apply(a.sort_value(key).compare(&b.sort_value(key))));
    sorted
}

/// Keeps items where the case-folded `query` is a substring of at least one
/// of the fields `fields` extracts. An empty query keeps everything.
pub fn search<'i, T, F>(items: &'i [T], query: &str, fields: F) -> Vec<&'i T>
where
    F: Fn(&T) -> Vec<&str>,
{
    let query = fold_case(query.trim());
    if query.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| fields(*item).iter().any(|f| fold_case(f).contains(&query)))
        .collect()
}

// ============================================================================
// PIVOT ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "column")]
pub enum PivotSortKey {
    /// The primary key label.
    Label,
    Total,
    /// One secondary-key column; absent cells sort as 0.
    Column(String),
}

impl Sortable for PivotRow {
    type Key = PivotSortKey;

    fn sort_value(&self, key: &PivotSortKey) -> SortValue<'_> {
        match key {
            PivotSortKey::Label => SortValue::Text(&self.primary_key),
            PivotSortKey::Total => SortValue::Number(self.total),
            PivotSortKey::Column(column) => SortValue::Number(self.value(column)),
        }
    }
}

impl PivotTable {
    /// A copy of this table with rows re-ordered. Totals are unchanged.
    pub fn sorted(&self, key: &PivotSortKey, direction: SortDirection) -> PivotTable {
        PivotTable { rows: sort(&self.rows, key, direction), ..self.clone() }
    }

    /// Rows whose primary key contains `query`.
    pub fn search_rows(&self, query: &str) -> Vec<&PivotRow> {
        search(&self.rows, query, |row| vec![row.primary_key.as_str()])
    }
}

// ============================================================================
// GRID STATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationSortKey {
    Name,
    Kommune,
    Fylke,
    Consumption,
    Production,
    Reserved,
}

impl Sortable for GridLocation {
    type Key = StationSortKey;

    fn sort_value(&self, key: &StationSortKey) -> SortValue<'_> {
        match key {
            StationSortKey::Name => SortValue::Text(&self.name),
            StationSortKey::Kommune => SortValue::Text(self.kommune_label()),
            StationSortKey::Fylke => SortValue::Text(self.fylke_label()),
            StationSortKey::Consumption => SortValue::Number(self.available_consumption),
            StationSortKey::Production => SortValue::Number(self.available_production),
            StationSortKey::Reserved => SortValue::Number(self.reserved_consumption),
        }
    }
}

impl<T: Sortable + ?Sized> Sortable for &T {
    type Key = T::Key;

    fn sort_value(&self, key: &T::Key) -> SortValue<'_> {
        (**self).sort_value(key)
    }
}

/// Text fields a station search looks at.
pub fn station_search_fields(location: &GridLocation) -> Vec<&str> {
    let mut fields = vec![location.name.as_str()];
    fields.extend(location.kommune.as_deref());
    fields.extend(location.fylke.as_deref());
    fields
}

/// Stations matching `query` on name, kommune or fylke.
pub fn search_stations<'i>(stations: &'i [&'i GridLocation], query: &str) -> Vec<&'i GridLocation> {
    search(stations, query, |s| station_search_fields(s))
        .into_iter()
        .copied()
        .collect()
}
