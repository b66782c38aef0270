//! Terminal procedures (SID/STAR) and the airport/procedure lookups the
//! resolver consumes.
//!
//! Navigation data loading lives outside this crate; callers either implement
//! [`AirportLookup`] / [`ProcedureStore`] over their own data or fill the
//! in-memory [`AirportTable`] / [`ProcedureTable`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::models::Waypoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    /// Standard instrument departure
    Sid,
    /// Standard terminal arrival
    Star,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureKind::Sid => f.write_str("SID"),
            ProcedureKind::Star => f.write_str("STAR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureLeg {
    pub waypoint: Waypoint,
    /// Distance from the previous leg's waypoint; zero for the first leg.
    pub distance_nm: f64,
}

/// A published procedure resolved for one runway.
///
/// SID legs start at the runway waypoint, STAR legs end at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub kind: ProcedureKind,
    pub legs: Vec<ProcedureLeg>,
}

impl Procedure {
    /// Build a procedure from its published fixes, attaching the runway at the
    /// correct end and using great-circle leg distances.
    pub fn from_fixes(
        name: impl Into<String>,
        kind: ProcedureKind,
        fixes: &[Waypoint],
        runway_waypoint: &Waypoint,
    ) -> Self {
        let mut points: Vec<Waypoint> = Vec::with_capacity(fixes.len() + 1);
        match kind {
            ProcedureKind::Sid => {
                points.push(runway_waypoint.clone());
                points.extend(fixes.iter().cloned());
            }
            ProcedureKind::Star => {
                points.extend(fixes.iter().cloned());
                points.push(runway_waypoint.clone());
            }
        }

        let mut legs = Vec::with_capacity(points.len());
        let mut previous: Option<&Waypoint> = None;
        for point in &points {
            let distance_nm = previous.map(|prev| prev.distance_to(point)).unwrap_or(0.0);
            legs.push(ProcedureLeg {
                waypoint: point.clone(),
                distance_nm,
            });
            previous = Some(point);
        }

        Self {
            name: name.into(),
            kind,
            legs,
        }
    }

    pub fn first_waypoint(&self) -> Option<&Waypoint> {
        self.legs.first().map(|leg| &leg.waypoint)
    }

    pub fn last_waypoint(&self) -> Option<&Waypoint> {
        self.legs.last().map(|leg| &leg.waypoint)
    }

    /// The end of the procedure that joins the en-route network: last fix of a
    /// SID, first fix of a STAR.
    pub fn enroute_end(&self) -> Option<&Waypoint> {
        match self.kind {
            ProcedureKind::Sid => self.last_waypoint(),
            ProcedureKind::Star => self.first_waypoint(),
        }
    }

    pub fn total_distance_nm(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_nm).sum()
    }

    /// Waypoints strictly between the first and last leg.
    pub fn inner_waypoints(&self) -> Vec<Waypoint> {
        if self.legs.len() <= 2 {
            return Vec::new();
        }
        self.legs[1..self.legs.len() - 1]
            .iter()
            .map(|leg| leg.waypoint.clone())
            .collect()
    }
}

/// Resolves a runway to its threshold waypoint.
pub trait AirportLookup {
    fn runway_waypoint(&self, icao: &str, runway: &str) -> Result<Waypoint>;
}

/// Published SIDs and STARs.
pub trait ProcedureStore {
    /// Resolve `name` for `runway` at `icao`.
    ///
    /// Must return [`RouteError::ProcedureNotFound`] when the procedure is not
    /// published for that runway; any other error is treated as a store failure.
    fn procedure(
        &self,
        icao: &str,
        kind: ProcedureKind,
        name: &str,
        runway: &str,
        runway_waypoint: &Waypoint,
    ) -> Result<Procedure>;

    /// Names of every procedure of `kind` published for the runway.
    fn procedure_names(&self, icao: &str, kind: ProcedureKind, runway: &str) -> Vec<String>;
}

/// Runway thresholds keyed by airport and runway.
#[derive(Debug, Clone, Default)]
pub struct AirportTable {
    runways: HashMap<(String, String), Waypoint>,
}

impl AirportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runway; its waypoint identifier is `ICAO` + `RUNWAY`.
    pub fn insert_runway(&mut self, icao: &str, runway: &str, lat: f64, lon: f64) {
        let waypoint = Waypoint::new(format!("{}{}", icao, runway), lat, lon);
        self.runways
            .insert((icao.to_string(), runway.to_string()), waypoint);
    }
}

impl AirportLookup for AirportTable {
    fn runway_waypoint(&self, icao: &str, runway: &str) -> Result<Waypoint> {
        self.runways
            .get(&(icao.to_string(), runway.to_string()))
            .cloned()
            .ok_or_else(|| RouteError::UnknownRunway {
                icao: icao.to_string(),
                runway: runway.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
struct ProcedureEntry {
    icao: String,
    kind: ProcedureKind,
    name: String,
    runways: Vec<String>,
    fixes: Vec<Waypoint>,
}

/// In-memory procedure store.
#[derive(Debug, Clone, Default)]
pub struct ProcedureTable {
    entries: Vec<ProcedureEntry>,
}

impl ProcedureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a procedure for the given runways. `fixes` are in flying order
    /// and exclude the runway itself.
    pub fn insert(
        &mut self,
        icao: &str,
        kind: ProcedureKind,
        name: &str,
        runways: &[&str],
        fixes: Vec<Waypoint>,
    ) {
        self.entries.push(ProcedureEntry {
            icao: icao.to_string(),
            kind,
            name: name.to_string(),
            runways: runways.iter().map(|rwy| rwy.to_string()).collect(),
            fixes,
        });
    }

    fn entry(&self, icao: &str, kind: ProcedureKind, name: &str, runway: &str) -> Option<&ProcedureEntry> {
        self.entries.iter().find(|entry| {
            entry.icao == icao
                && entry.kind == kind
                && entry.name == name
                && entry.runways.iter().any(|rwy| rwy == runway)
        })
    }
}

impl ProcedureStore for ProcedureTable {
    fn procedure(
        &self,
        icao: &str,
        kind: ProcedureKind,
        name: &str,
        runway: &str,
        runway_waypoint: &Waypoint,
    ) -> Result<Procedure> {
        let entry = self
            .entry(icao, kind, name, runway)
            .ok_or_else(|| RouteError::ProcedureNotFound {
                name: name.to_string(),
                runway: runway.to_string(),
            })?;
        if entry.fixes.is_empty() {
            return Err(RouteError::Store(format!("{} {} has no fixes", kind, name)));
        }
        Ok(Procedure::from_fixes(name, kind, &entry.fixes, runway_waypoint))
    }

    fn procedure_names(&self, icao: &str, kind: ProcedureKind, runway: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| {
                entry.icao == icao && entry.kind == kind && entry.runways.iter().any(|rwy| rwy == runway)
            })
            .map(|entry| entry.name.clone())
            .collect()
    }
}
