//! Shortest-path search over the waypoint graph.
//!
//! Dijkstra with a binary heap. Endpoints are either graph nodes or a
//! [`Endpoint::Terminal`]: an off-graph waypoint (runway, procedure end) joined
//! to the graph through a list of [`TerminalLink`]s. Terminal links are
//! overlays: they are never written into the graph.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use crate::cancel::{self, CancelFlag};
use crate::config::FinderConfig;
use crate::error::{Result, RouteError};
use crate::graph::WaypointGraph;
use crate::models::{Neighbor, RouteNode, Waypoint, DIRECT};
use crate::procedures::{ProcedureKind, ProcedureStore};
use crate::route::Route;

/// How an off-graph endpoint reaches one graph node.
///
/// From a departure endpoint the link reads
/// `endpoint -(airway)-> [via -DCT->] node`; towards an arrival endpoint it reads
/// `node [-DCT-> via] -(airway)-> endpoint`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalLink {
    pub node: usize,
    /// Procedure name or `DCT`.
    pub airway: String,
    pub distance_nm: f64,
    /// Fixes flown inside the procedure edge.
    pub inner: Vec<Waypoint>,
    /// Off-graph procedure end point joined to `node` by a direct leg.
    pub via: Option<Waypoint>,
}

impl TerminalLink {
    pub fn direct(graph: &WaypointGraph, from: &Waypoint, node: usize) -> Self {
        Self {
            node,
            airway: DIRECT.to_string(),
            distance_nm: from.distance_to(graph.waypoint(node)),
            inner: Vec::new(),
            via: None,
        }
    }

    fn cost(&self, graph: &WaypointGraph) -> f64 {
        let bridge = self
            .via
            .as_ref()
            .map_or(0.0, |via| via.distance_to(graph.waypoint(self.node)));
        self.distance_nm + bridge
    }

    fn neighbor(&self) -> Neighbor {
        Neighbor::procedure(self.airway.clone(), self.distance_nm, self.inner.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Node(usize),
    Terminal {
        waypoint: Waypoint,
        links: Vec<TerminalLink>,
    },
}

impl Endpoint {
    /// The graph node for `waypoint`, or a terminal joined DCT to its
    /// `link_count` nearest graph waypoints when it is not in the graph.
    pub fn for_waypoint(graph: &WaypointGraph, waypoint: &Waypoint, link_count: usize) -> Self {
        if let Some(idx) = graph.find_by_waypoint(waypoint) {
            return Endpoint::Node(idx);
        }
        let links = graph
            .nearest(waypoint, link_count)
            .into_iter()
            .map(|node| TerminalLink::direct(graph, waypoint, node))
            .collect();
        Endpoint::Terminal {
            waypoint: waypoint.clone(),
            links,
        }
    }

    /// Departure runway reaching the network through every SID published
    /// for it, or DCT to the nearest waypoints when there are none.
    pub fn departure(
        graph: &WaypointGraph,
        store: &dyn ProcedureStore,
        icao: &str,
        runway: &str,
        runway_waypoint: &Waypoint,
        config: &FinderConfig,
    ) -> Result<Self> {
        terminal_endpoint(graph, store, ProcedureKind::Sid, icao, runway, runway_waypoint, config)
    }

    /// Arrival runway reached through every STAR published for it, or DCT
    /// from the nearest waypoints when there are none.
    pub fn arrival(
        graph: &WaypointGraph,
        store: &dyn ProcedureStore,
        icao: &str,
        runway: &str,
        runway_waypoint: &Waypoint,
        config: &FinderConfig,
    ) -> Result<Self> {
        terminal_endpoint(graph, store, ProcedureKind::Star, icao, runway, runway_waypoint, config)
    }

    fn name(&self, graph: &WaypointGraph) -> String {
        match self {
            Endpoint::Node(idx) => graph.waypoint(*idx).ident.clone(),
            Endpoint::Terminal { waypoint, .. } => waypoint.ident.clone(),
        }
    }
}

fn terminal_endpoint(
    graph: &WaypointGraph,
    store: &dyn ProcedureStore,
    kind: ProcedureKind,
    icao: &str,
    runway: &str,
    runway_waypoint: &Waypoint,
    config: &FinderConfig,
) -> Result<Endpoint> {
    let mut links = Vec::new();
    for name in store.procedure_names(icao, kind, runway) {
        let procedure = match store.procedure(icao, kind, &name, runway, runway_waypoint) {
            Ok(procedure) => procedure,
            Err(RouteError::ProcedureNotFound { .. }) => continue,
            Err(err) => return Err(err),
        };
        let Some(end) = procedure.enroute_end() else {
            continue;
        };
        let distance_nm = procedure.total_distance_nm();
        let inner = procedure.inner_waypoints();

        match graph.find_same_fix(end) {
            Some(node) => links.push(TerminalLink {
                node,
                airway: name.clone(),
                distance_nm,
                inner,
                via: None,
            }),
            None => {
                for node in graph.nearest(end, config.terminal_link_count) {
                    links.push(TerminalLink {
                        node,
                        airway: name.clone(),
                        distance_nm,
                        inner: inner.clone(),
                        via: Some(end.clone()),
                    });
                }
            }
        }
    }

    if links.is_empty() {
        links = graph
            .nearest(runway_waypoint, config.terminal_link_count)
            .into_iter()
            .map(|node| TerminalLink::direct(graph, runway_waypoint, node))
            .collect();
    }

    tracing::debug!(%kind, icao, runway, links = links.len(), "built terminal endpoint");
    Ok(Endpoint::Terminal {
        waypoint: runway_waypoint.clone(),
        links,
    })
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    cost: FloatOrd,
    node: usize,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Result of one search: the seed it started from, the target it reached and
/// the graph edges in between as `(from node, edge index)`.
struct FoundPath {
    source: usize,
    target: usize,
    start: usize,
    hops: Vec<(usize, usize)>,
}

pub struct RouteFinder<'a> {
    graph: &'a WaypointGraph,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> RouteFinder<'a> {
    pub fn new(graph: &'a WaypointGraph) -> Self {
        Self {
            graph,
            cancel: None,
        }
    }

    /// Poll `cancel` once per settled node.
    pub fn with_cancel(mut self, cancel: Option<&'a CancelFlag>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Shortest route between two graph nodes. Equal nodes give a
    /// single-node route.
    pub fn find_between(&self, from: usize, to: usize) -> Result<Route> {
        self.find(&Endpoint::Node(from), &Endpoint::Node(to))
    }

    pub fn find(&self, from: &Endpoint, to: &Endpoint) -> Result<Route> {
        let graph = self.graph;
        let sources: Vec<(usize, f64)> = match from {
            Endpoint::Node(idx) => vec![(*idx, 0.0)],
            Endpoint::Terminal { links, .. } => {
                links.iter().map(|link| (link.node, link.cost(graph))).collect()
            }
        };
        let targets: Vec<(usize, f64)> = match to {
            Endpoint::Node(idx) => vec![(*idx, 0.0)],
            Endpoint::Terminal { links, .. } => {
                links.iter().map(|link| (link.node, link.cost(graph))).collect()
            }
        };

        let Some(found) = self.search(&sources, &targets, None)? else {
            return Err(RouteError::NoPath {
                from: from.name(graph),
                to: to.name(graph),
            });
        };

        let mut nodes = Vec::new();
        match from {
            Endpoint::Node(_) => {}
            Endpoint::Terminal { waypoint, links } => {
                let link = &links[found.source];
                nodes.push(RouteNode::new(waypoint.clone(), Some(link.neighbor())));
                if let Some(via) = &link.via {
                    let bridge = via.distance_to(graph.waypoint(link.node));
                    nodes.push(RouteNode::new(via.clone(), Some(Neighbor::direct(bridge))));
                }
            }
        }
        nodes.push(RouteNode::terminal(graph.waypoint(found.start).clone()));
        self.append_hops(&mut nodes, &found.hops);

        if let Endpoint::Terminal { waypoint, links } = to {
            let link = &links[found.target];
            if let Some(via) = &link.via {
                let bridge = graph.waypoint(link.node).distance_to(via);
                link_to(&mut nodes, Neighbor::direct(bridge), via.clone());
            }
            link_to(&mut nodes, link.neighbor(), waypoint.clone());
        }

        let route = Route::from_nodes(nodes);
        tracing::debug!(
            from = %from.name(graph),
            to = %to.name(graph),
            waypoints = route.len(),
            "shortest path found"
        );
        Ok(route)
    }

    /// Shortest route from `from` to whichever of `candidates` is closest
    /// along edges labeled `airway`.
    pub fn find_along_airway(&self, from: usize, candidates: &[usize], airway: &str) -> Result<Route> {
        let targets: Vec<(usize, f64)> = candidates.iter().map(|&idx| (idx, 0.0)).collect();
        let Some(found) = self.search(&[(from, 0.0)], &targets, Some(airway))? else {
            let to = candidates
                .first()
                .map(|&idx| self.graph.waypoint(idx).ident.clone())
                .unwrap_or_default();
            return Err(RouteError::NoPath {
                from: format!("{} via {}", self.graph.waypoint(from).ident, airway),
                to,
            });
        };
        let mut nodes = vec![RouteNode::terminal(self.graph.waypoint(found.start).clone())];
        self.append_hops(&mut nodes, &found.hops);
        Ok(Route::from_nodes(nodes))
    }

    fn append_hops(&self, nodes: &mut Vec<RouteNode>, hops: &[(usize, usize)]) {
        for &(from, edge_idx) in hops {
            let edge = &self.graph.edges_from(from)[edge_idx];
            link_to(
                nodes,
                Neighbor::new(edge.airway.clone(), edge.distance_nm),
                self.graph.waypoint(edge.to).clone(),
            );
        }
    }

    /// Multi-source Dijkstra to the cheapest of `targets`, where each source
    /// and target carries an extra cost. `airway` restricts the edges used.
    fn search(
        &self,
        sources: &[(usize, f64)],
        targets: &[(usize, f64)],
        airway: Option<&str>,
    ) -> Result<Option<FoundPath>> {
        let n = self.graph.len();
        // Virtual node every target links into.
        let goal = n;
        let mut dist = vec![f64::INFINITY; n + 1];
        let mut settled = vec![false; n + 1];
        let mut came_from: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut seeded_by: Vec<Option<usize>> = vec![None; n];
        let mut reached_by: Option<usize> = None;

        let mut targets_at: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, &(node, _)) in targets.iter().enumerate() {
            targets_at.entry(node).or_default().push(idx);
        }

        let mut open: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
        for (idx, &(node, cost)) in sources.iter().enumerate() {
            if cost < dist[node] {
                dist[node] = cost;
                seeded_by[node] = Some(idx);
                open.push(Reverse(OpenNode {
                    cost: FloatOrd(cost),
                    node,
                }));
            }
        }

        while let Some(Reverse(current)) = open.pop() {
            let u = current.node;
            if settled[u] || current.cost.0 > dist[u] {
                continue;
            }
            settled[u] = true;
            cancel::check(self.cancel)?;

            if u == goal {
                let Some(target) = reached_by else {
                    return Ok(None);
                };
                let mut node = targets[target].0;
                let mut hops = Vec::new();
                while let Some((prev, edge_idx)) = came_from[node] {
                    hops.push((prev, edge_idx));
                    node = prev;
                }
                hops.reverse();
                let Some(source) = seeded_by[node] else {
                    return Ok(None);
                };
                return Ok(Some(FoundPath {
                    source,
                    target,
                    start: node,
                    hops,
                }));
            }

            if let Some(target_idxs) = targets_at.get(&u) {
                for &t in target_idxs {
                    let cost = dist[u] + targets[t].1;
                    if cost < dist[goal] {
                        dist[goal] = cost;
                        reached_by = Some(t);
                        open.push(Reverse(OpenNode {
                            cost: FloatOrd(cost),
                            node: goal,
                        }));
                    }
                }
            }

            for (edge_idx, edge) in self.graph.edges_from(u).iter().enumerate() {
                if airway.is_some_and(|label| edge.airway != label) || settled[edge.to] {
                    continue;
                }
                let cost = dist[u] + edge.distance_nm;
                if cost < dist[edge.to] {
                    dist[edge.to] = cost;
                    came_from[edge.to] = Some((u, edge_idx));
                    open.push(Reverse(OpenNode {
                        cost: FloatOrd(cost),
                        node: edge.to,
                    }));
                }
            }
        }

        Ok(None)
    }
}

fn link_to(nodes: &mut Vec<RouteNode>, neighbor: Neighbor, to: Waypoint) {
    if let Some(last) = nodes.last_mut() {
        last.neighbor = Some(neighbor);
    }
    nodes.push(RouteNode::terminal(to));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedures::ProcedureTable;

    fn triangle() -> WaypointGraph {
        let mut graph = WaypointGraph::new();
        let a = graph.add_waypoint(Waypoint::new("A", 0.0, 0.0));
        let b = graph.add_waypoint(Waypoint::new("B", 0.0, 1.0));
        let c = graph.add_waypoint(Waypoint::new("C", 0.0, 3.0));
        graph.add_two_way_edge(a, b, "J1", Some(60.0));
        graph.add_two_way_edge(b, c, "J2", Some(120.0));
        graph.add_two_way_edge(a, c, "J3", Some(200.0));
        graph
    }

    fn idents(route: &Route) -> Vec<&str> {
        route.waypoints().map(|w| w.ident.as_str()).collect()
    }

    #[test]
    fn test_prefers_shorter_two_hop_path() {
        let graph = triangle();
        let route = RouteFinder::new(&graph).find_between(0, 2).unwrap();
        assert_eq!(idents(&route), vec!["A", "B", "C"]);
        assert!((route.total_distance_nm().unwrap() - 180.0).abs() < 1e-9);
        assert_eq!(route.nodes()[0].neighbor.as_ref().unwrap().airway, "J1");
    }

    #[test]
    fn test_same_start_and_end() {
        let graph = triangle();
        let route = RouteFinder::new(&graph).find_between(1, 1).unwrap();
        assert_eq!(route.len(), 1);
        assert!(route.total_distance_nm().is_err());
    }

    #[test]
    fn test_no_path_is_explicit() {
        let mut graph = triangle();
        graph.add_waypoint(Waypoint::new("ISLAND", 40.0, 40.0));
        let err = RouteFinder::new(&graph).find_between(0, 3).unwrap_err();
        match err {
            RouteError::NoPath { from, to } => {
                assert_eq!(from, "A");
                assert_eq!(to, "ISLAND");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_equal_cost_paths_are_deterministic() {
        let mut graph = WaypointGraph::new();
        let s = graph.add_waypoint(Waypoint::new("S", 0.0, 0.0));
        let x = graph.add_waypoint(Waypoint::new("X", 1.0, 0.0));
        let y = graph.add_waypoint(Waypoint::new("Y", -1.0, 0.0));
        let t = graph.add_waypoint(Waypoint::new("T", 0.0, 1.0));
        graph.add_two_way_edge(s, x, "A", Some(10.0));
        graph.add_two_way_edge(s, y, "B", Some(10.0));
        graph.add_two_way_edge(x, t, "A", Some(10.0));
        graph.add_two_way_edge(y, t, "B", Some(10.0));

        let first = RouteFinder::new(&graph).find_between(s, t).unwrap();
        for _ in 0..5 {
            assert_eq!(RouteFinder::new(&graph).find_between(s, t).unwrap(), first);
        }
    }

    #[test]
    fn test_airway_restricted_search() {
        let graph = triangle();
        let finder = RouteFinder::new(&graph);
        let route = finder.find_along_airway(0, &[2], "J3").unwrap();
        assert_eq!(idents(&route), vec!["A", "C"]);
        assert!(finder.find_along_airway(0, &[2], "J9").is_err());
    }

    #[test]
    fn test_airway_search_picks_reachable_candidate() {
        let mut graph = triangle();
        let far_c = graph.add_waypoint(Waypoint::new("C", 30.0, 30.0));
        let finder = RouteFinder::new(&graph);
        let route = finder.find_along_airway(1, &[far_c, 2], "J2").unwrap();
        assert_eq!(route.last_waypoint().unwrap().lat, 0.0);
    }

    #[test]
    fn test_terminal_endpoints_wrap_path() {
        let graph = triangle();
        let mut store = ProcedureTable::new();
        store.insert(
            "AAAA",
            ProcedureKind::Sid,
            "DEP1",
            &["09"],
            vec![Waypoint::new("D1", 0.0, -0.5), Waypoint::new("A", 0.0, 0.0)],
        );
        let rwy_a = Waypoint::new("AAAA09", 0.0, -1.0);
        let rwy_b = Waypoint::new("BBBB27", 0.0, 3.5);
        let config = FinderConfig {
            terminal_link_count: 1,
            ..FinderConfig::default()
        };

        let from = Endpoint::departure(&graph, &store, "AAAA", "09", &rwy_a, &config).unwrap();
        let to = Endpoint::arrival(&graph, &store, "BBBB", "27", &rwy_b, &config).unwrap();
        let route = RouteFinder::new(&graph).find(&from, &to).unwrap();

        assert_eq!(route.first_waypoint(), Some(&rwy_a));
        assert_eq!(route.last_waypoint(), Some(&rwy_b));
        let sid_edge = route.nodes()[0].neighbor.as_ref().unwrap();
        assert_eq!(sid_edge.airway, "DEP1");
        assert_eq!(sid_edge.inner_waypoints[0].ident, "D1");
        // Arrival with no STAR ends with a direct leg.
        let last_edge = route.nodes()[route.len() - 2].neighbor.as_ref().unwrap();
        assert!(last_edge.is_direct());
        assert_eq!(route.nodes()[route.len() - 2].waypoint.ident, "C");
    }

    #[test]
    fn test_off_graph_procedure_end_bridged_direct() {
        let graph = triangle();
        let mut store = ProcedureTable::new();
        store.insert(
            "BBBB",
            ProcedureKind::Star,
            "ARR1",
            &["27"],
            vec![Waypoint::new("OFFNET", 0.2, 3.1), Waypoint::new("F1", 0.1, 3.3)],
        );
        let rwy_b = Waypoint::new("BBBB27", 0.0, 3.5);
        let config = FinderConfig::default();
        let to = Endpoint::arrival(&graph, &store, "BBBB", "27", &rwy_b, &config).unwrap();
        let route = RouteFinder::new(&graph).find(&Endpoint::Node(0), &to).unwrap();

        let names = idents(&route);
        assert_eq!(&names[names.len() - 2..], &["OFFNET", "BBBB27"]);
        let bridge = route.nodes()[route.len() - 3].neighbor.as_ref().unwrap();
        assert!(bridge.is_direct());
        assert_eq!(route.nodes()[route.len() - 2].neighbor.as_ref().unwrap().airway, "ARR1");
    }

    #[test]
    fn test_procedure_end_with_distant_namesake_is_bridged() {
        let mut graph = triangle();
        graph.add_waypoint(Waypoint::new("ENTRY", 60.0, 100.0));
        let mut store = ProcedureTable::new();
        store.insert(
            "BBBB",
            ProcedureKind::Star,
            "ARR2",
            &["27"],
            vec![Waypoint::new("ENTRY", 0.2, 3.1), Waypoint::new("F2", 0.1, 3.3)],
        );
        let rwy_b = Waypoint::new("BBBB27", 0.0, 3.5);
        let config = FinderConfig {
            terminal_link_count: 1,
            ..FinderConfig::default()
        };
        let to = Endpoint::arrival(&graph, &store, "BBBB", "27", &rwy_b, &config).unwrap();
        let Endpoint::Terminal { links, .. } = &to else {
            panic!("expected a terminal endpoint");
        };
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].node, 2, "bridged from C, not the far ENTRY");
        assert_eq!(links[0].via, Some(Waypoint::new("ENTRY", 0.2, 3.1)));

        let route = RouteFinder::new(&graph).find(&Endpoint::Node(0), &to).unwrap();
        assert!(route.total_distance_nm().unwrap() < 400.0);
    }

    #[test]
    fn test_cancelled_search() {
        let graph = triangle();
        let flag = CancelFlag::new();
        flag.cancel();
        let result = RouteFinder::new(&graph).with_cancel(Some(&flag)).find_between(0, 2);
        assert!(matches!(result, Err(RouteError::Cancelled)));
    }
}
