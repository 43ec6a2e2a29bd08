//! Nearest-candidate search over towns and stations.
//!
//! Candidates are bulk loaded into an R-tree keyed on `[latitude, longitude]`.
//! A query first collects the candidates inside a circle in degree space that
//! is guaranteed to contain every point within the search radius, then ranks
//! only those by the selected [`DistanceMetric`].

use crate::stations::distance::DistanceMetric;
use crate::stations::error::LocateError;
use crate::types::coordinates::{parse_dms, LatLon};
use crate::types::raw::{value_as_f64, RawRecord};
use log::debug;
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde_json::Value;

// Lower bound for the length of one degree, so the search circle never
// undershoots the radius.
const MIN_KM_PER_DEGREE: f64 = 110.0;
const MIN_COS_LATITUDE: f64 = 1e-6;
const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

const TOWN_LATITUDE: &str = "latitud_dec";
const TOWN_LONGITUDE: &str = "longitud_dec";
const STATION_LATITUDE: &str = "lat";
const STATION_LONGITUDE: &str = "lon";
const CLIMATE_STATION_LATITUDE: &str = "latitud";
const CLIMATE_STATION_LONGITUDE: &str = "longitud";

#[derive(Debug, Clone, PartialEq)]
struct IndexedPoint {
    index: usize,
    location: LatLon,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.0, self.location.1])
    }
}

impl PointDistance for IndexedPoint {
    /// Squared Euclidean distance in degree space, only used to prune the tree.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_lat = self.location.0 - point[0];
        let d_lon = self.location.1 - point[1];
        d_lat * d_lat + d_lon * d_lon
    }
}

/// A candidate picked by [`Catalog::nearest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Nearest<'a> {
    pub record: &'a RawRecord,
    pub location: LatLon,
    pub distance_km: f64,
}

/// A set of provider records that carry coordinates, indexed for proximity queries.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<RawRecord>,
    tree: RTree<IndexedPoint>,
}

fn decimal_field(
    record: &RawRecord,
    kind: &'static str,
    field: &'static str,
) -> Result<f64, LocateError> {
    record
        .get(field)
        .and_then(value_as_f64)
        .filter(|value| value.is_finite())
        .ok_or(LocateError::InvalidRecord { kind, field })
}

fn sexagesimal_field(
    record: &RawRecord,
    kind: &'static str,
    field: &'static str,
) -> Result<f64, LocateError> {
    let raw = record
        .get(field)
        .and_then(Value::as_str)
        .ok_or(LocateError::InvalidRecord { kind, field })?;
    parse_dms(raw)
}

/// Coordinates of a locality record (`latitud_dec` / `longitud_dec`).
pub fn town_location(record: &RawRecord) -> Result<LatLon, LocateError> {
    Ok(LatLon(
        decimal_field(record, "Town", TOWN_LATITUDE)?,
        decimal_field(record, "Town", TOWN_LONGITUDE)?,
    ))
}

/// Coordinates of an observation station record (`lat` / `lon`).
pub fn station_location(record: &RawRecord) -> Result<LatLon, LocateError> {
    Ok(LatLon(
        decimal_field(record, "Station", STATION_LATITUDE)?,
        decimal_field(record, "Station", STATION_LONGITUDE)?,
    ))
}

/// Coordinates of a climatological station record, given as `394924N` / `025309W`.
pub fn climate_station_location(record: &RawRecord) -> Result<LatLon, LocateError> {
    Ok(LatLon(
        sexagesimal_field(record, "Climate station", CLIMATE_STATION_LATITUDE)?,
        sexagesimal_field(record, "Climate station", CLIMATE_STATION_LONGITUDE)?,
    ))
}

impl Catalog {
    /// Indexes `records`, reading each one's coordinates with `location`.
    /// Records without usable coordinates stay out of the index.
    pub fn new<F>(records: Vec<RawRecord>, location: F) -> Self
    where
        F: Fn(&RawRecord) -> Result<LatLon, LocateError>,
    {
        let points = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match location(record) {
                Ok(location) => Some(IndexedPoint { index, location }),
                Err(err) => {
                    debug!("Skipping record {index}: {err}");
                    None
                }
            })
            .collect();
        Catalog {
            records,
            tree: RTree::bulk_load(points),
        }
    }

    pub fn towns(records: Vec<RawRecord>) -> Self {
        Self::new(records, town_location)
    }

    pub fn stations(records: Vec<RawRecord>) -> Self {
        Self::new(records, station_location)
    }

    pub fn climate_stations(records: Vec<RawRecord>) -> Self {
        Self::new(records, climate_station_location)
    }

    /// Number of indexed (locatable) records.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// The record closest to `target` that lies strictly within
    /// `max_distance_km`. Equal distances resolve to the earliest record.
    pub fn nearest(
        &self,
        target: LatLon,
        max_distance_km: f64,
        metric: DistanceMetric,
    ) -> Option<Nearest<'_>> {
        let (point, distance_km) = match search_radius_degrees(target, max_distance_km) {
            Some(radius) => closest(
                self.tree
                    .locate_within_distance([target.0, target.1], radius * radius),
                target,
                max_distance_km,
                metric,
            ),
            None => closest(self.tree.iter(), target, max_distance_km, metric),
        }?;

        let record = self.records.get(point.index)?;
        debug!("distance: {distance_km:.3} km, record: {record:?}");
        Some(Nearest {
            record,
            location: point.location,
            distance_km,
        })
    }
}

fn closest<'t>(
    points: impl Iterator<Item = &'t IndexedPoint>,
    target: LatLon,
    max_distance_km: f64,
    metric: DistanceMetric,
) -> Option<(&'t IndexedPoint, f64)> {
    points
        .filter_map(|point| {
            let distance_km = metric.distance_km(target, point.location);
            (distance_km < max_distance_km).then_some((point, distance_km))
        })
        .min_by_key(|(point, distance_km)| (OrderedFloat(*distance_km), point.index))
}

/// Radius, in degrees, of a circle around `center` that contains every point
/// within `radius_km`. `None` when that circle would reach a pole or wrap the
/// antimeridian; callers then scan every candidate.
fn search_radius_degrees(center: LatLon, radius_km: f64) -> Option<f64> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return None;
    }
    let d_lat = radius_km / MIN_KM_PER_DEGREE;
    let max_abs_lat = center.0.abs() + d_lat;
    if max_abs_lat >= MAX_LATITUDE {
        return None;
    }
    let cos_lat = max_abs_lat.to_radians().cos();
    if cos_lat < MIN_COS_LATITUDE {
        return None;
    }
    let d_lon = radius_km / (MIN_KM_PER_DEGREE * cos_lat);
    if center.1 - d_lon <= -MAX_LONGITUDE || center.1 + d_lon >= MAX_LONGITUDE {
        return None;
    }
    // circumscribes the d_lat x d_lon box
    Some(d_lat.hypot(d_lon))
}
