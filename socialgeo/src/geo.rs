//! Geographic points and great-circle distances.
//!
//! Points use the GeoJSON axis order: longitude first, latitude second.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ValidationIssue;

/// Mean earth radius in metres, the value SurrealDB's `geo::distance` uses.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Haversine distance to `other`, in metres.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Range check on both axes, reported against `field`.
    pub fn check(&self, field: &str) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !(-180.0..=180.0).contains(&self.longitude) {
            issues.push(ValidationIssue::new(
                format!("{field}.longitude"),
                "range",
                "longitude must be between -180 and 180",
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            issues.push(ValidationIssue::new(
                format!("{field}.latitude"),
                "range",
                "latitude must be between -90 and 90",
            ));
        }
        issues
    }
}

#[derive(Serialize)]
struct GeoJsonPointRef<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    coordinates: [f64; 2],
}

impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GeoJsonPointRef {
            kind: "Point",
            coordinates: [self.longitude, self.latitude],
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeoPointRepr {
    GeoJson {
        #[serde(rename = "type")]
        kind: String,
        coordinates: [f64; 2],
    },
    Pair([f64; 2]),
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match GeoPointRepr::deserialize(deserializer)? {
            GeoPointRepr::GeoJson { kind, coordinates } => {
                if kind != "Point" {
                    return Err(serde::de::Error::custom(format!("expected a Point geometry, found {kind}")));
                }
                Ok(GeoPoint::new(coordinates[0], coordinates[1]))
            }
            GeoPointRepr::Pair([longitude, latitude]) => Ok(GeoPoint::new(longitude, latitude)),
        }
    }
}
