//! JSON navigation data snapshot.
//!
//! Airways reference waypoints by their position in `waypoints`. Edges are
//! two-way unless `one_way` is set; a missing `distance_nm` means the
//! great-circle distance.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use route_core::{AirportTable, ProcedureKind, ProcedureTable, Waypoint, WaypointGraph};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AirwayRecord {
    pub from: usize,
    pub to: usize,
    pub airway: String,
    #[serde(default)]
    pub distance_nm: Option<f64>,
    #[serde(default)]
    pub one_way: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunwayRecord {
    pub icao: String,
    pub runway: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureRecord {
    pub icao: String,
    pub kind: ProcedureKind,
    pub name: String,
    pub runways: Vec<String>,
    pub fixes: Vec<Waypoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Navdata {
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub airways: Vec<AirwayRecord>,
    #[serde(default)]
    pub runways: Vec<RunwayRecord>,
    #[serde(default)]
    pub procedures: Vec<ProcedureRecord>,
}

/// Everything the resolver needs, built from a snapshot.
pub struct LoadedNavdata {
    pub graph: WaypointGraph,
    pub airports: AirportTable,
    pub procedures: ProcedureTable,
}

impl Navdata {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading navdata {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing navdata {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn build(self) -> Result<LoadedNavdata> {
        let mut graph = WaypointGraph::new();
        for waypoint in self.waypoints {
            graph.add_waypoint(waypoint);
        }
        for (idx, record) in self.airways.iter().enumerate() {
            if record.from >= graph.len() || record.to >= graph.len() {
                bail!(
                    "airway entry {} ({}) references waypoint {} -> {}, only {} waypoints loaded",
                    idx,
                    record.airway,
                    record.from,
                    record.to,
                    graph.len()
                );
            }
            if record.one_way {
                graph.add_edge(record.from, record.to, &record.airway, record.distance_nm);
            } else {
                graph.add_two_way_edge(record.from, record.to, &record.airway, record.distance_nm);
            }
        }

        let mut airports = AirportTable::new();
        for runway in &self.runways {
            airports.insert_runway(&runway.icao, &runway.runway, runway.lat, runway.lon);
        }

        let mut procedures = ProcedureTable::new();
        for record in self.procedures {
            let runways: Vec<&str> = record.runways.iter().map(String::as_str).collect();
            procedures.insert(&record.icao, record.kind, &record.name, &runways, record.fixes);
        }

        tracing::info!(
            waypoints = graph.len(),
            airways = self.airways.len(),
            runways = self.runways.len(),
            "navdata loaded"
        );
        Ok(LoadedNavdata {
            graph,
            airports,
            procedures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_core::{AirportLookup, ProcedureStore};

    const SAMPLE: &str = include_str!("../data/sample_navdata.json");

    #[test]
    fn test_sample_snapshot_loads() {
        let loaded = Navdata::from_json(SAMPLE).unwrap().build().unwrap();
        assert_eq!(loaded.graph.len(), 6);
        // J1 is two-way, V2 one-way
        assert!(loaded.graph.has_airway(1, "J1"));
        assert!(loaded.graph.has_airway(1, "V2"));
        assert!(!loaded.graph.has_airway(5, "J1"));
        assert!((loaded.graph.edges_from(5)[0].distance_nm - 90.0).abs() < 1e-9);

        let rwy = loaded.airports.runway_waypoint("KAAA", "09").unwrap();
        assert_eq!(rwy.ident, "KAAA09");
        assert_eq!(
            loaded.procedures.procedure_names("KBBB", ProcedureKind::Star, "27"),
            vec!["ARRA"]
        );
    }

    #[test]
    fn test_bad_airway_index_rejected() {
        let text = r#"{
            "waypoints": [{ "ident": "A", "lat": 0.0, "lon": 0.0 }],
            "airways": [{ "from": 0, "to": 3, "airway": "J9" }]
        }"#;
        let err = Navdata::from_json(text).unwrap().build().err().unwrap();
        assert!(err.to_string().contains("J9"), "{}", err);
    }
}
