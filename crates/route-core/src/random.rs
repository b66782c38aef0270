//! Randomized connecting routes.
//!
//! A biased random walk over the graph: each step picks an unvisited
//! neighbor, weighted towards edges that close distance to the target. Walks
//! are bounded in length and retried a bounded number of times; when every
//! attempt dead-ends the shortest path is used instead.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::cancel::{self, CancelFlag};
use crate::config::FinderConfig;
use crate::error::{Result, RouteError};
use crate::finder::RouteFinder;
use crate::graph::{AirwayEdge, WaypointGraph};
use crate::models::{Neighbor, Waypoint};
use crate::route::Route;

/// Produces a plausible, non-optimal route between two waypoints.
///
/// Implementations must return a route whose first and last waypoints are
/// exactly `start` and `end`.
pub trait RandomRouteProvider {
    fn find(
        &self,
        graph: &WaypointGraph,
        start: &Waypoint,
        end: &Waypoint,
        config: &FinderConfig,
        cancel: Option<&CancelFlag>,
    ) -> Result<Route>;
}

/// Random walk provider. With a seed, every call replays the same walk.
#[derive(Debug, Clone, Default)]
pub struct RandomWalk {
    seed: Option<u64>,
}

impl RandomWalk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    fn walk(
        &self,
        graph: &WaypointGraph,
        from: usize,
        to: usize,
        config: &FinderConfig,
        rng: &mut StdRng,
        cancel: Option<&CancelFlag>,
    ) -> Result<Option<Route>> {
        let target = graph.waypoint(to);
        let mut visited = vec![false; graph.len()];
        let mut current = from;
        visited[current] = true;
        let mut route = Route::single(graph.waypoint(from).clone());

        for _ in 0..config.random_max_steps {
            cancel::check(cancel)?;
            if current == to {
                return Ok(Some(route));
            }

            let here = graph.waypoint(current).distance_to(target);
            let choices: Vec<(&AirwayEdge, f64)> = graph
                .edges_from(current)
                .iter()
                .filter(|edge| !visited[edge.to])
                .map(|edge| {
                    let ahead = graph.waypoint(edge.to).distance_to(target);
                    let progress = ((here - ahead) / edge.distance_nm.max(1e-6)).clamp(-1.0, 1.0);
                    (edge, config.random_progress_bias * progress)
                })
                .collect();
            if choices.is_empty() {
                return Ok(None);
            }
            // Weights relative to the best score, so the best edge weighs 1.
            let top = choices
                .iter()
                .map(|(_, score)| *score)
                .fold(f64::NEG_INFINITY, f64::max);
            let weighted = choices.choose_weighted(&mut *rng, |(_, score)| (score - top).exp());
            let Some(&(edge, _)) = weighted.ok().or_else(|| choices.choose(&mut *rng)) else {
                return Ok(None);
            };

            visited[edge.to] = true;
            current = edge.to;
            route.push_back_waypoint(
                graph.waypoint(current).clone(),
                &edge.airway,
                Some(edge.distance_nm),
            );
        }

        Ok((current == to).then_some(route))
    }
}

/// Graph node standing in for `waypoint`: itself when published, else the
/// nearest graph waypoint.
fn snap(graph: &WaypointGraph, waypoint: &Waypoint) -> Option<usize> {
    graph
        .find_by_waypoint(waypoint)
        .or_else(|| graph.nearest(waypoint, 1).into_iter().next())
}

impl RandomRouteProvider for RandomWalk {
    fn find(
        &self,
        graph: &WaypointGraph,
        start: &Waypoint,
        end: &Waypoint,
        config: &FinderConfig,
        cancel: Option<&CancelFlag>,
    ) -> Result<Route> {
        if start == end {
            return Ok(Route::single(start.clone()));
        }
        let no_path = || RouteError::NoPath {
            from: start.ident.clone(),
            to: end.ident.clone(),
        };
        let from = snap(graph, start).ok_or_else(no_path)?;
        let to = snap(graph, end).ok_or_else(no_path)?;

        let mut rng = self.rng();
        let mut walked = None;
        for attempt in 0..config.random_max_attempts {
            if let Some(route) = self.walk(graph, from, to, config, &mut rng, cancel)? {
                tracing::debug!(attempt, waypoints = route.len(), "random walk reached target");
                walked = Some(route);
                break;
            }
        }
        let mut route = match walked {
            Some(route) => route,
            None => {
                tracing::debug!(
                    from = %start.ident,
                    to = %end.ident,
                    "random walk failed, using shortest path"
                );
                RouteFinder::new(graph).with_cancel(cancel).find_between(from, to)?
            }
        };

        if route.len() < 2 {
            return Ok(Route::leg(
                start.clone(),
                Neighbor::direct(start.distance_to(end)),
                end.clone(),
            ));
        }

        // Put the requested endpoints in place of the snapped nodes, keeping
        // the first and last edges as walked.
        if let Some(first) = route.first_node_mut() {
            first.waypoint = start.clone();
        }
        if let Some(last) = route.last_node_mut() {
            last.waypoint = end.clone();
        }
        Ok(route)
    }
}
