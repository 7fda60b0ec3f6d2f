//! FILENAME: core/pivot-engine/src/geo.rs
//! Geo Roll-up - groups grid locations into fylke -> kommune -> station.
//!
//! The tree is built bottom-up from the already-filtered locations and owns
//! copies of its stations, so it can outlive the borrow of the dataset. Every
//! node's sums are reduced from the stations beneath it, never read from a
//! stored field, so a re-filtered tree can never carry stale aggregates.
//! Locations without a fylke or kommune land in the unknown bucket; the
//! number of stations in the tree always equals the number of inputs.

use std::cmp::Ordering;

use records::GridLocation;

use crate::definition::GeoQuery;
use crate::filter::filter;
use crate::sort::sort;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// SUMS
// ============================================================================

/// Capacity sums over every station beneath a node (MW).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSums {
    pub consumption: f64,
    /// Signed: negative values are existing surplus generation.
    pub production: f64,
    pub reserved: f64,
    pub station_count: usize,
}

impl GeoSums {
    fn of(location: &GridLocation) -> Self {
        GeoSums {
            consumption: location.available_consumption,
            production: location.available_production,
            reserved: location.reserved_consumption,
            station_count: 1,
        }
    }

    fn add(&mut self, other: &GeoSums) {
        self.consumption += other.consumption;
        self.production += other.production;
        self.reserved += other.reserved;
        self.station_count += other.station_count;
    }

    fn reduce<'a>(parts: impl IntoIterator<Item = &'a GeoSums>) -> Self {
        let mut sums = GeoSums::default();
        for part in parts {
            sums.add(part);
        }
        sums
    }
}

// ============================================================================
// TREE
// ============================================================================

/// A kommune and its stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubregionNode {
    pub name: String,
    /// Descending by available consumption; ties keep input order.
    pub stations: Vec<GridLocation>,
    pub sums: GeoSums,
}

/// A fylke and its kommuner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionNode {
    pub name: String,
    pub subregions: Vec<SubregionNode>,
    pub sums: GeoSums,
}

impl RegionNode {
    pub fn subregion(&self, name: &str) -> Option<&SubregionNode> {
        self.subregions.iter().find(|s| s.name == name)
    }

    /// Every station in this region, subregion by subregion.
    pub fn stations(&self) -> impl Iterator<Item = &GridLocation> {
        self.subregions.iter().flat_map(|s| s.stations.iter())
    }
}

/// The whole roll-up. Regions and subregions are ordered descending by
/// consumption sum, ties in first-seen order. No node is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoTree {
    pub regions: Vec<RegionNode>,
    pub sums: GeoSums,
}

impl GeoTree {
    pub fn region(&self, name: &str) -> Option<&RegionNode> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn station_count(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|r| r.subregions.iter())
            .map(|s| s.stations.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

// ============================================================================
// ROLL-UP
// ============================================================================

fn by_consumption_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Groups `(key, item)` pairs by key. Groups keep first-seen order.
fn group_in_order<'k, T>(items: impl IntoIterator<Item = (&'k str, T)>) -> Vec<(&'k str, Vec<T>)> {
    let mut index: FxHashMap<&'k str, usize> = FxHashMap::default();
    let mut groups: Vec<(&'k str, Vec<T>)> = Vec::new();
    for (key, item) in items {
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item);
    }
    groups
}

/// Rolls filtered locations up into a fylke -> kommune -> station tree.
pub fn rollup<'a>(locations: impl IntoIterator<Item = &'a GridLocation>) -> GeoTree {
    let by_fylke = group_in_order(
        locations
            .into_iter()
            .map(|loc| (loc.fylke_label(), loc)),
    );

    let mut regions: Vec<RegionNode> = by_fylke
        .into_iter()
        .map(|(fylke, members)| build_region(fylke, members))
        .collect();
    regions.sort_by(|a, b| by_consumption_desc(a.sums.consumption, b.sums.consumption));

    let sums = GeoSums::reduce(regions.iter().map(|r| &r.sums));
    log::debug!(
        "geo rollup: {} regions, {} stations",
        regions.len(),
        sums.station_count
    );

    GeoTree { regions, sums }
}

/// Runs the full roll-up pipeline for one query: filter, roll up, then the
/// optional re-ordering of every leaf list.
pub fn calculate_geo<'a>(locations: impl IntoIterator<Item = &'a GridLocation>, query: &GeoQuery) -> GeoTree {
    let filtered = filter(locations, &query.selection);
    let mut tree = rollup(filtered);
    if let Some((key, direction)) = &query.station_sort {
        for subregion in tree.regions.iter_mut().flat_map(|r| r.subregions.iter_mut()) {
            subregion.stations = sort(&subregion.stations, key, *direction);
        }
    }
    tree
}

fn build_region(fylke: &str, members: Vec<&GridLocation>) -> RegionNode {
    let by_kommune = group_in_order(
        members
            .into_iter()
            .map(|loc| (loc.kommune_label(), loc)),
    );

    let mut subregions: Vec<SubregionNode> = by_kommune
        .into_iter()
        .map(|(kommune, mut stations)| {
            stations.sort_by(|a, b| {
                by_consumption_desc(a.available_consumption, b.available_consumption)
            });
            let sums = stations.iter().fold(GeoSums::default(), |mut acc, s| {
                acc.add(&GeoSums::of(s));
                acc
            });
            let stations = stations.into_iter().cloned().collect();
            SubregionNode { name: kommune.to_string(), stations, sums }
        })
        .collect();
    subregions.sort_by(|a, b| by_consumption_desc(a.sums.consumption, b.sums.consumption));

    let sums = GeoSums::reduce(subregions.iter().map(|s| &s.sums));
    RegionNode { name: fylke.to_string(), subregions, sums }
}

// ============================================================================
// PRODUCTION BALANCE
// ============================================================================

/// Sign breakdown of `available_production` across a set of locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionBalance {
    /// Free capacity for new generation.
    pub positive: usize,
    /// Existing surplus generation.
    pub negative: usize,
    pub zero: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ProductionBalance {
    pub fn from_locations<'a>(locations: impl IntoIterator<Item = &'a GridLocation>) -> Self {
        let mut balance = ProductionBalance::default();
        for loc in locations {
            let p = loc.available_production;
            match p.partial_cmp(&0.0) {
                Some(Ordering::Greater) => balance.positive += 1,
                Some(Ordering::Less) => balance.negative += 1,
                _ => balance.zero += 1,
            }
            balance.min = Some(balance.min.map_or(p, |m| m.min(p)));
            balance.max = Some(balance.max.map_or(p, |m| m.max(p)));
        }
        balance
    }
}
