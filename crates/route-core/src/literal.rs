//! Resolution of a literal run of tokens: `WPT ((AWY | DCT) WPT | WPT)*`.
//!
//! Two adjacent waypoints, or two waypoints around `DCT`, form a direct leg.
//! `WPT AWY WPT` follows the airway: the leg is the shortest path that only
//! uses edges labeled with that airway, so every fix along the way shows up
//! in the route.

use crate::cancel::CancelFlag;
use crate::error::{Result, RouteError};
use crate::finder::RouteFinder;
use crate::grammar::Token;
use crate::graph::WaypointGraph;
use crate::models::{Waypoint, DIRECT};
use crate::route::Route;

pub struct LiteralAnalyzer<'a> {
    graph: &'a WaypointGraph,
    tokens: &'a [Token],
    /// Disambiguates the first waypoint when it is not pinned.
    reference: &'a Waypoint,
    first: Option<&'a Waypoint>,
    last: Option<&'a Waypoint>,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> LiteralAnalyzer<'a> {
    pub fn new(graph: &'a WaypointGraph, tokens: &'a [Token], reference: &'a Waypoint) -> Self {
        Self {
            graph,
            tokens,
            reference,
            first: None,
            last: None,
            cancel: None,
        }
    }

    /// Resolve the first token to this waypoint when the identifiers match.
    pub fn pin_first(mut self, waypoint: Option<&'a Waypoint>) -> Self {
        self.first = waypoint;
        self
    }

    /// Resolve the last token to this waypoint when the identifiers match.
    pub fn pin_last(mut self, waypoint: Option<&'a Waypoint>) -> Self {
        self.last = waypoint;
        self
    }

    pub fn with_cancel(mut self, cancel: Option<&'a CancelFlag>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn analyze(&self) -> Result<Route> {
        let tokens = self.tokens;
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return Err(RouteError::grammar("empty route segment"));
        };
        if *first == Token::Direct || *last == Token::Direct {
            return Err(RouteError::grammar("DCT must sit between two waypoints"));
        }

        let last_idx = tokens.len() - 1;
        let first_pin = self.first.or(if last_idx == 0 { self.last } else { None });
        let mut current = self.resolve(first, self.reference, first_pin)?;
        let mut route = Route::single(self.graph.waypoint(current).clone());
        let finder = RouteFinder::new(self.graph).with_cancel(self.cancel);

        let mut i = 1;
        while i <= last_idx {
            let token = &tokens[i];
            match token {
                Token::Direct => {
                    let next = &tokens[i + 1];
                    if *next == Token::Direct {
                        return Err(RouteError::grammar("DCT cannot be followed by DCT"));
                    }
                    current = self.direct_leg(&mut route, current, next, i + 1 == last_idx)?;
                    i += 2;
                }
                Token::Ident(airway) if i < last_idx && self.graph.has_airway(current, airway) => {
                    let target = &tokens[i + 1];
                    if !is_waypoint(target) {
                        return Err(RouteError::grammar(format!(
                            "airway {} must be followed by a waypoint, found {}",
                            airway, target
                        )));
                    }
                    let pin = self.pin_for(i + 1 == last_idx, target);
                    let candidates = match (pin, target.coordinate_waypoint()) {
                        (Some(pin), _) => vec![self.index_of(pin)?],
                        (None, Some(exact)) => vec![self.index_of(&exact)?],
                        (None, None) => self.graph.find_all_by_ident(target.as_str()).to_vec(),
                    };
                    if candidates.is_empty() {
                        return Err(RouteError::unresolved(target.as_str()));
                    }
                    let leg = finder.find_along_airway(current, &candidates, airway)?;
                    let reached = leg
                        .last_waypoint()
                        .and_then(|wpt| self.graph.find_by_waypoint(wpt))
                        .ok_or_else(|| RouteError::unresolved(target.as_str()))?;
                    route.connect(leg)?;
                    current = reached;
                    i += 2;
                }
                _ => {
                    current = self.direct_leg(&mut route, current, token, i == last_idx)?;
                    i += 1;
                }
            }
        }

        Ok(route)
    }

    fn direct_leg(&self, route: &mut Route, from: usize, token: &Token, is_last: bool) -> Result<usize> {
        let pin = self.pin_for(is_last, token);
        let next = self.resolve(token, self.graph.waypoint(from), pin)?;
        route.push_back_waypoint(self.graph.waypoint(next).clone(), DIRECT, None);
        Ok(next)
    }

    fn pin_for(&self, is_last: bool, token: &Token) -> Option<&'a Waypoint> {
        self.last
            .filter(|pin| is_last && pin.ident == token.as_str())
    }

    fn index_of(&self, waypoint: &Waypoint) -> Result<usize> {
        self.graph
            .find_by_waypoint(waypoint)
            .ok_or_else(|| RouteError::unresolved(waypoint.ident.clone()))
    }

    /// Pinned waypoint when given and matching, a coordinate literal at its
    /// own position, otherwise the candidate closest to `near`.
    fn resolve(&self, token: &Token, near: &Waypoint, pin: Option<&Waypoint>) -> Result<usize> {
        if !is_waypoint(token) {
            return Err(RouteError::grammar(format!("expected a waypoint, found {}", token)));
        }
        if let Some(pin) = pin.filter(|pin| pin.ident == token.as_str()) {
            return self.index_of(pin);
        }
        if let Some(exact) = token.coordinate_waypoint() {
            return self.index_of(&exact);
        }
        self.graph
            .closest_by_ident(token.as_str(), near)
            .ok_or_else(|| RouteError::unresolved(token.as_str()))
    }
}

fn is_waypoint(token: &Token) -> bool {
    matches!(token, Token::Ident(_) | Token::Coordinate { .. })
}
