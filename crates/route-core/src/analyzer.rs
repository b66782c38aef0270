//! Top-level route resolution.
//!
//! One request runs through these steps in order:
//!
//! 1. Resolve both runway waypoints. An empty route string yields the direct
//!    runway-to-runway route.
//! 2. Reject consecutive commands and strip the leading/trailing ICAO codes.
//! 3. Inject every literal coordinate as a temporary graph waypoint.
//! 4. Group tokens into segments and resolve each literal segment, running
//!    SID extraction on the first and STAR extraction on the last.
//! 5. Fill `AUTO` with the shortest path and `RAND` with a random route
//!    between the neighboring fragments (or the runways at either end).
//! 6. Connect everything left to right.
//!
//! Injected coordinates are removed when the request returns, whatever the
//! outcome.

use std::iter;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::config::FinderConfig;
use crate::error::Result;
use crate::extractor::{SidExtractor, StarExtractor, Terminal};
use crate::finder::{Endpoint, RouteFinder};
use crate::grammar::{group, RouteString, Segment, Token};
use crate::graph::WaypointGraph;
use crate::literal::LiteralAnalyzer;
use crate::models::{Neighbor, Waypoint};
use crate::procedures::{AirportLookup, ProcedureStore};
use crate::random::RandomRouteProvider;
use crate::route::Route;

/// What the caller wants resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub orig_icao: String,
    pub orig_runway: String,
    pub dest_icao: String,
    pub dest_runway: String,
    /// Route description, e.g. `"SID1 P J1 Q AUTO R STAR1"`.
    pub route: String,
}

/// A grouped segment after literal resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum SubRoute {
    Concrete(Route),
    Auto,
    Rand,
}

impl SubRoute {
    fn route(&self) -> Option<&Route> {
        match self {
            SubRoute::Concrete(route) => Some(route),
            SubRoute::Auto | SubRoute::Rand => None,
        }
    }
}

/// Runway waypoints and identifiers for one request.
struct Runways<'r> {
    request: &'r RouteRequest,
    orig: Waypoint,
    dest: Waypoint,
}

pub struct RouteAnalyzer<'a> {
    airports: &'a dyn AirportLookup,
    procedures: &'a dyn ProcedureStore,
    random: &'a dyn RandomRouteProvider,
    config: FinderConfig,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> RouteAnalyzer<'a> {
    pub fn new(
        airports: &'a dyn AirportLookup,
        procedures: &'a dyn ProcedureStore,
        random: &'a dyn RandomRouteProvider,
    ) -> Self {
        Self {
            airports,
            procedures,
            random,
            config: FinderConfig::default(),
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: FinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Abort `AUTO`/`RAND` searches once `cancel` is set.
    pub fn with_cancel(mut self, cancel: &'a CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Resolve `request` into one connected runway-to-runway route.
    ///
    /// Takes the graph mutably for the duration of the call: literal
    /// coordinates are injected into it and removed before returning.
    pub fn analyze(&self, graph: &mut WaypointGraph, request: &RouteRequest) -> Result<Route> {
        tracing::info!(
            orig = %request.orig_icao,
            orig_runway = %request.orig_runway,
            dest = %request.dest_icao,
            dest_runway = %request.dest_runway,
            route = %request.route,
            "resolving route"
        );
        let runways = Runways {
            request,
            orig: self
                .airports
                .runway_waypoint(&request.orig_icao, &request.orig_runway)?,
            dest: self
                .airports
                .runway_waypoint(&request.dest_icao, &request.dest_runway)?,
        };

        let route = RouteString::parse(&request.route)?;
        if route.is_empty() {
            return Ok(direct_route(&runways));
        }
        route.ensure_no_consecutive_commands()?;
        let route = route.strip_icaos(&request.orig_icao, &request.dest_icao);
        if route.is_empty() {
            return Ok(direct_route(&runways));
        }

        let mut temp = graph.begin_temporary();
        for (text, position) in route.coordinates() {
            let waypoint = Waypoint::new(text, position.lat, position.lon);
            if temp.find_by_waypoint(&waypoint).is_none() {
                temp.add(waypoint, self.config.coordinate_link_count);
            }
        }

        let result = self.resolve(&temp, route.tokens(), &runways);
        drop(temp);

        match &result {
            Ok(resolved) => tracing::info!(
                waypoints = resolved.len(),
                distance_nm = resolved.total_distance_nm().unwrap_or(0.0),
                "route resolved"
            ),
            Err(err) => tracing::warn!(error = %err, "route resolution failed"),
        }
        result
    }

    fn resolve(&self, graph: &WaypointGraph, tokens: &[Token], runways: &Runways<'_>) -> Result<Route> {
        let segments = group(tokens)?;
        let count = segments.len();
        tracing::debug!(segments = count, "grouped route");

        let mut subroutes = Vec::with_capacity(count);
        for (idx, segment) in segments.into_iter().enumerate() {
            let subroute = match segment {
                Segment::Auto => SubRoute::Auto,
                Segment::Rand => SubRoute::Rand,
                Segment::Literal(tokens) => SubRoute::Concrete(self.literal_segment(
                    graph,
                    tokens,
                    idx == 0,
                    idx + 1 == count,
                    runways,
                )?),
            };
            subroutes.push(subroute);
        }

        let mut fragments = Vec::with_capacity(count);
        for (idx, subroute) in subroutes.iter().enumerate() {
            let fragment = match subroute {
                SubRoute::Concrete(route) => route.clone(),
                SubRoute::Auto => self.auto_fill(graph, &subroutes, idx, runways)?,
                SubRoute::Rand => self.rand_fill(graph, &subroutes, idx, runways)?,
            };
            fragments.push(fragment);
        }

        Route::connect_all(fragments)
    }

    fn literal_segment(
        &self,
        graph: &WaypointGraph,
        mut tokens: Vec<Token>,
        is_first: bool,
        is_last: bool,
        runways: &Runways<'_>,
    ) -> Result<Route> {
        let request = runways.request;
        let mut head = None;
        let mut tail = None;

        if is_first {
            let terminal = Terminal {
                icao: &request.orig_icao,
                runway: &request.orig_runway,
                runway_waypoint: &runways.orig,
                graph,
                store: self.procedures,
            };
            let extracted = SidExtractor::new(tokens, terminal).extract()?;
            tokens = extracted.remaining;
            head = Some(extracted.route);
        }
        if is_last {
            let terminal = Terminal {
                icao: &request.dest_icao,
                runway: &request.dest_runway,
                runway_waypoint: &runways.dest,
                graph,
                store: self.procedures,
            };
            let extracted = StarExtractor::new(tokens, terminal).extract()?;
            tokens = extracted.remaining;
            tail = Some(extracted.route);
        }

        let reference = if is_last && !is_first {
            &runways.dest
        } else {
            &runways.orig
        };
        let body = LiteralAnalyzer::new(graph, &tokens, reference)
            .pin_first(head.as_ref().and_then(Route::last_waypoint))
            .pin_last(tail.as_ref().and_then(Route::first_waypoint))
            .with_cancel(self.cancel)
            .analyze()?;
        tracing::debug!(
            tokens = tokens.len(),
            waypoints = body.len(),
            sid = head.is_some(),
            star = tail.is_some(),
            "resolved literal segment"
        );

        Route::connect_all(head.into_iter().chain(iter::once(body)).chain(tail))
    }

    fn auto_fill(
        &self,
        graph: &WaypointGraph,
        subroutes: &[SubRoute],
        idx: usize,
        runways: &Runways<'_>,
    ) -> Result<Route> {
        let request = runways.request;
        let links = self.config.terminal_link_count;

        let from = match previous_end(subroutes, idx) {
            Some(waypoint) => Endpoint::for_waypoint(graph, waypoint, links),
            None => Endpoint::departure(
                graph,
                self.procedures,
                &request.orig_icao,
                &request.orig_runway,
                &runways.orig,
                &self.config,
            )?,
        };
        let to = match next_start(subroutes, idx) {
            Some(waypoint) => Endpoint::for_waypoint(graph, waypoint, links),
            None => Endpoint::arrival(
                graph,
                self.procedures,
                &request.dest_icao,
                &request.dest_runway,
                &runways.dest,
                &self.config,
            )?,
        };

        tracing::debug!(index = idx, "filling AUTO with shortest path");
        RouteFinder::new(graph).with_cancel(self.cancel).find(&from, &to)
    }

    fn rand_fill(
        &self,
        graph: &WaypointGraph,
        subroutes: &[SubRoute],
        idx: usize,
        runways: &Runways<'_>,
    ) -> Result<Route> {
        let start = previous_end(subroutes, idx).unwrap_or(&runways.orig);
        let end = next_start(subroutes, idx).unwrap_or(&runways.dest);
        tracing::debug!(index = idx, from = %start.ident, to = %end.ident, "filling RAND");
        self.random
            .find(graph, start, end, &self.config, self.cancel)
    }
}

fn previous_end(subroutes: &[SubRoute], idx: usize) -> Option<&Waypoint> {
    let previous = idx.checked_sub(1)?;
    subroutes[previous].route()?.last_waypoint()
}

fn next_start(subroutes: &[SubRoute], idx: usize) -> Option<&Waypoint> {
    subroutes.get(idx + 1)?.route()?.first_waypoint()
}

fn direct_route(runways: &Runways<'_>) -> Route {
    let distance = runways.orig.distance_to(&runways.dest);
    tracing::info!(distance_nm = distance, "direct route");
    Route::leg(
        runways.orig.clone(),
        Neighbor::direct(distance),
        runways.dest.clone(),
    )
}
