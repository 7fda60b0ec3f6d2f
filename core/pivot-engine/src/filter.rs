//! FILENAME: core/pivot-engine/src/filter.rs
//! Filter Engine - conjunction of categorical equality predicates plus an
//! optional case-insensitive substring query.
//!
//! Filtering never mutates its input. The output borrows the surviving
//! records in their original relative order.

use std::borrow::Cow;

use records::{GridLocation, ShippingRecord};
use smallvec::SmallVec;

use crate::collate::fold_case;
use crate::definition::{FilterSelection, GridDimension, ShippingDimension};

/// Designated text fields of a record, searched by the free-text query.
pub type SearchFields<'a> = SmallVec<[&'a str; 4]>;

/// A record the filter engine can constrain.
pub trait Filterable {
    type Dimension: Ord + Copy;

    /// The category value of this record on `dimension`.
    fn dimension_value(&self, dimension: Self::Dimension) -> Cow<'_, str>;

    /// Fields the free-text query is matched against.
    fn search_fields(&self) -> SearchFields<'_>;
}

impl Filterable for ShippingRecord {
    type Dimension = ShippingDimension;

    fn dimension_value(&self, dimension: ShippingDimension) -> Cow<'_, str> {
        match dimension {
            ShippingDimension::Year => Cow::Owned(self.year.to_string()),
            ShippingDimension::VesselType => Cow::Borrowed(&self.vessel_type),
            ShippingDimension::GtGroup => Cow::Borrowed(&self.gt_group),
            ShippingDimension::VoyageType => Cow::Borrowed(&self.voyage_type),
            ShippingDimension::Phase => Cow::Borrowed(&self.phase),
            ShippingDimension::County => Cow::Borrowed(&self.county_name),
        }
    }

    fn search_fields(&self) -> SearchFields<'_> {
        SmallVec::from_buf([
            self.vessel_type.as_str(),
            self.county_name.as_str(),
            self.voyage_type.as_str(),
            self.phase.as_str(),
        ])
    }
}

impl Filterable for GridLocation {
    type Dimension = GridDimension;

    fn dimension_value(&self, dimension: GridDimension) -> Cow<'_, str> {
        match dimension {
            GridDimension::Operator => Cow::Borrowed(&self.operator_id),
            GridDimension::Fylke => Cow::Borrowed(self.fylke_label()),
            GridDimension::Kommune => Cow::Borrowed(self.kommune_label()),
        }
    }

    fn search_fields(&self) -> SearchFields<'_> {
        let mut fields = SearchFields::new();
        fields.push(self.name.as_str());
        if let Some(kommune) = self.kommune.as_deref() {
            fields.push(kommune);
        }
        if let Some(fylke) = self.fylke.as_deref() {
            fields.push(fylke);
        }
        fields
    }
}

/// True if the record satisfies every constraint and the query.
/// `folded_query` must already be case-folded.
fn passes<R: Filterable>(
    record: &R,
    selection: &FilterSelection<R::Dimension>,
    folded_query: Option<&str>,
) -> bool {
    let categorical = selection
        .constraints()
        .all(|(dimension, wanted)| record.dimension_value(dimension) == wanted);
    if !categorical {
        return false;
    }

    match folded_query {
        None => true,
        Some(q) => record.search_fields().iter().any(|field| fold_case(field).contains(q)),
    }
}

/// Applies `selection` to `records`.
pub fn filter<'a, R: Filterable>(
    records: impl IntoIterator<Item = &'a R>,
    selection: &FilterSelection<R::Dimension>,
) -> Vec<&'a R>
where
    R: 'a,
{
    let folded_query = selection.effective_query().map(fold_case);
    let folded_query = folded_query.as_deref();

    records
        .into_iter()
        .filter(|record| passes(*record, selection, folded_query))
        .collect()
}

/// Distinct values of one dimension, sorted with the dashboard collation.
/// Used to populate filter lists that the source document does not publish.
pub fn distinct_values<'a, R: Filterable + 'a>(
    records: impl IntoIterator<Item = &'a R>,
    dimension: R::Dimension,
) -> Vec<String> {
    let mut values: Vec<String> = records
        .into_iter()
        .map(|r| r.dimension_value(dimension).into_owned())
        .collect();
    values.sort_by(|a, b| crate::collate::compare_text(a, b));
    values.dedup();
    values
}
