//! Waypoint/airway graph queried by the route resolver.
//!
//! The graph is read-mostly. The only mutation during a resolution request is
//! the injection of literal-coordinate waypoints, which goes through the
//! [`TemporaryWaypoints`] guard. The guard holds `&mut WaypointGraph`, so no
//! other request can observe or race with the injected waypoints, and its
//! `Drop` rolls everything back on every exit path.

use std::collections::HashMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::models::{Waypoint, DIRECT};
use crate::spatial::{closest_to, distance_nm};

/// A graph waypoint further than this from a procedure fix of the same name
/// is a different fix.
pub const SAME_FIX_TOLERANCE_NM: f64 = 5.0;

/// Directed edge between two graph waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirwayEdge {
    pub to: usize,
    pub airway: String,
    pub distance_nm: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WaypointGraph {
    waypoints: Vec<Waypoint>,
    edges: Vec<Vec<AirwayEdge>>,
    by_ident: HashMap<String, Vec<usize>>,
}

impl WaypointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a waypoint and return its index.
    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> usize {
        let idx = self.waypoints.len();
        self.by_ident
            .entry(waypoint.ident.clone())
            .or_default()
            .push(idx);
        self.waypoints.push(waypoint);
        self.edges.push(Vec::new());
        idx
    }

    /// Add a one-way edge. Distance defaults to the great-circle distance.
    ///
    /// Indices must come from [`WaypointGraph::add_waypoint`].
    pub fn add_edge(&mut self, from: usize, to: usize, airway: &str, distance_nm: Option<f64>) {
        let distance = distance_nm.unwrap_or_else(|| self.waypoints[from].distance_to(&self.waypoints[to]));
        self.edges[from].push(AirwayEdge {
            to,
            airway: airway.to_string(),
            distance_nm: distance,
        });
    }

    /// Add the edge in both directions.
    pub fn add_two_way_edge(&mut self, a: usize, b: usize, airway: &str, distance_nm: Option<f64>) {
        self.add_edge(a, b, airway, distance_nm);
        self.add_edge(b, a, airway, distance_nm);
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoint(&self, idx: usize) -> &Waypoint {
        &self.waypoints[idx]
    }

    pub fn edges_from(&self, idx: usize) -> &[AirwayEdge] {
        &self.edges[idx]
    }

    /// All indices whose waypoint carries `ident`. May be empty or ambiguous.
    pub fn find_all_by_ident(&self, ident: &str) -> &[usize] {
        self.by_ident.get(ident).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Index of this exact waypoint (identifier and coordinates).
    pub fn find_by_waypoint(&self, waypoint: &Waypoint) -> Option<usize> {
        self.find_all_by_ident(&waypoint.ident)
            .iter()
            .copied()
            .find(|&idx| self.waypoints[idx] == *waypoint)
    }

    /// Among waypoints named `ident`, the one closest to `reference`.
    pub fn closest_by_ident(&self, ident: &str, reference: &Waypoint) -> Option<usize> {
        let candidates = self.find_all_by_ident(ident);
        closest_to(candidates.iter().map(|&idx| &self.waypoints[idx]), reference)
            .map(|pos| candidates[pos])
    }

    /// The graph's copy of a fix published elsewhere (procedure data): same
    /// ident, within [`SAME_FIX_TOLERANCE_NM`].
    pub fn find_same_fix(&self, fix: &Waypoint) -> Option<usize> {
        self.closest_by_ident(&fix.ident, fix)
            .filter(|&idx| self.waypoints[idx].distance_to(fix) <= SAME_FIX_TOLERANCE_NM)
    }

    /// Up to `count` waypoint indices ordered by distance from `reference`.
    pub fn nearest(&self, reference: &Waypoint, count: usize) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }
        let mut by_distance: Vec<(usize, f64)> = self
            .waypoints
            .iter()
            .enumerate()
            .map(|(idx, wpt)| (idx, distance_nm(wpt.lat, wpt.lon, reference.lat, reference.lon)))
            .collect();
        by_distance.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        by_distance.into_iter().take(count).map(|(idx, _)| idx).collect()
    }

    /// Whether any edge leaving `idx` is labeled `airway`.
    pub fn has_airway(&self, idx: usize, airway: &str) -> bool {
        self.edges[idx].iter().any(|edge| edge.airway == airway)
    }

    /// Start a scope of temporary waypoints, removed when the guard drops.
    pub fn begin_temporary(&mut self) -> TemporaryWaypoints<'_> {
        let base_len = self.waypoints.len();
        TemporaryWaypoints {
            graph: self,
            base_len,
            touched: Vec::new(),
        }
    }
}

/// Scoped injection of literal-coordinate waypoints.
///
/// Dereferences to the graph for lookups. Dropping the guard removes every
/// waypoint added through it and every link edge added to pre-existing nodes.
pub struct TemporaryWaypoints<'g> {
    graph: &'g mut WaypointGraph,
    base_len: usize,
    /// Pre-existing nodes that gained link edges, with their original edge count.
    touched: Vec<(usize, usize)>,
}

impl TemporaryWaypoints<'_> {
    /// Inject a waypoint, linking it (DCT, both ways) to its `link_count`
    /// nearest pre-existing waypoints.
    pub fn add(&mut self, waypoint: Waypoint, link_count: usize) -> usize {
        let links: Vec<usize> = self
            .graph
            .nearest(&waypoint, link_count + self.injected_count())
            .into_iter()
            .filter(|&idx| idx < self.base_len)
            .take(link_count)
            .collect();

        let idx = self.graph.add_waypoint(waypoint);
        for target in links {
            if !self.touched.iter().any(|(node, _)| *node == target) {
                self.touched.push((target, self.graph.edges[target].len()));
            }
            self.graph.add_two_way_edge(idx, target, DIRECT, None);
        }
        tracing::debug!(
            ident = %self.graph.waypoints[idx].ident,
            index = idx,
            "injected temporary waypoint"
        );
        idx
    }

    pub fn injected_count(&self) -> usize {
        self.graph.waypoints.len() - self.base_len
    }

    fn rollback(&mut self) {
        let base_len = self.base_len;
        for (node, edge_count) in self.touched.drain(..) {
            self.graph.edges[node].truncate(edge_count);
        }
        self.graph.waypoints.truncate(base_len);
        self.graph.edges.truncate(base_len);
        self.graph.by_ident.retain(|_, indices| {
            indices.retain(|&idx| idx < base_len);
            !indices.is_empty()
        });
    }
}

impl Deref for TemporaryWaypoints<'_> {
    type Target = WaypointGraph;

    fn deref(&self) -> &WaypointGraph {
        &*self.graph
    }
}

impl Drop for TemporaryWaypoints<'_> {
    fn drop(&mut self) {
        let injected = self.injected_count();
        self.rollback();
        if injected > 0 {
            tracing::debug!(removed = injected, "rolled back temporary waypoints");
        }
    }
}
