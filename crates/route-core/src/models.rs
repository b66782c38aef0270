//! Core data models for route resolution.

use serde::{Deserialize, Serialize};

use crate::spatial::distance_nm;

/// Airway label used for a direct leg.
pub const DIRECT: &str = "DCT";

/// A named point on the earth.
///
/// Identifiers are not unique; two waypoints are equal only when the
/// identifier and both coordinates match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub ident: String,
    pub lat: f64,
    pub lon: f64,
}

impl Waypoint {
    pub fn new(ident: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            ident: ident.into(),
            lat,
            lon,
        }
    }

    /// Great-circle distance to another waypoint in nautical miles.
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        distance_nm(self.lat, self.lon, other.lat, other.lon)
    }
}

/// The outgoing edge of a route node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Airway identifier, procedure name, or [`DIRECT`].
    pub airway: String,
    pub distance_nm: f64,
    /// Fixes flown between the two nodes when this edge is a whole SID/STAR.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_waypoints: Vec<Waypoint>,
}

impl Neighbor {
    pub fn new(airway: impl Into<String>, distance_nm: f64) -> Self {
        Self {
            airway: airway.into(),
            distance_nm,
            inner_waypoints: Vec::new(),
        }
    }

    pub fn direct(distance_nm: f64) -> Self {
        Self::new(DIRECT, distance_nm)
    }

    /// Edge standing for a complete terminal procedure.
    pub fn procedure(name: impl Into<String>, distance_nm: f64, inner: Vec<Waypoint>) -> Self {
        Self {
            airway: name.into(),
            distance_nm,
            inner_waypoints: inner,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.airway == DIRECT
    }
}

/// A waypoint plus the edge to the next node. The last node of a route has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteNode {
    pub waypoint: Waypoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbor: Option<Neighbor>,
}

impl RouteNode {
    pub fn new(waypoint: Waypoint, neighbor: Option<Neighbor>) -> Self {
        Self { waypoint, neighbor }
    }

    pub fn terminal(waypoint: Waypoint) -> Self {
        Self {
            waypoint,
            neighbor: None,
        }
    }
}
