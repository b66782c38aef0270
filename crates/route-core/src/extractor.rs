//! SID/STAR extraction at the ends of a route string.
//!
//! A [`StarExtractor`] looks at the tail of the last segment and returns the
//! route from the en-route network to the destination runway plus the tokens
//! still to be resolved. There are three cases:
//!
//! 1. The last token is not a STAR for the runway. The route is the last
//!    waypoint, then direct to the runway. Tokens are returned unchanged.
//! 2. It is a STAR whose first fix exists in the graph. The route is that fix,
//!    then the STAR to the runway. The STAR name is removed from the tokens.
//! 3. It is a STAR whose first fix exists only in the procedure. The route is
//!    the last en-route waypoint, direct to the STAR's first fix, then the STAR.
//!    Both the STAR name and its first fix are removed from the tokens.
//!
//! In every case the last remaining token names the first waypoint of the
//! returned route. [`SidExtractor`] is the mirror image at the front.

use crate::error::{Result, RouteError};
use crate::grammar::Token;
use crate::graph::WaypointGraph;
use crate::models::{Neighbor, RouteNode, Waypoint};
use crate::procedures::{Procedure, ProcedureKind, ProcedureStore};
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct ExtractResult {
    /// Tokens left for en-route resolution. Never empty.
    pub remaining: Vec<Token>,
    /// SID side: starts at the runway. STAR side: ends at the runway.
    pub route: Route,
}

/// Everything an extractor needs to know about one end of the route.
#[derive(Clone, Copy)]
pub struct Terminal<'a> {
    pub icao: &'a str,
    pub runway: &'a str,
    pub runway_waypoint: &'a Waypoint,
    pub graph: &'a WaypointGraph,
    pub store: &'a dyn ProcedureStore,
}

impl Terminal<'_> {
    /// `Ok(None)` when the name is not a procedure published for the runway.
    fn try_procedure(&self, kind: ProcedureKind, name: &str) -> Result<Option<Procedure>> {
        match self
            .store
            .procedure(self.icao, kind, name, self.runway, self.runway_waypoint)
        {
            Ok(procedure) => Ok(Some(procedure)),
            Err(RouteError::ProcedureNotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolve a waypoint token, taking the candidate closest to the runway.
    /// A coordinate literal resolves to its own position.
    fn find_waypoint(&self, token: &Token) -> Result<Waypoint> {
        match token {
            Token::Coordinate { .. } => token
                .coordinate_waypoint()
                .filter(|exact| self.graph.find_by_waypoint(exact).is_some())
                .ok_or_else(|| RouteError::unresolved(token.as_str())),
            Token::Ident(_) => self
                .graph
                .closest_by_ident(token.as_str(), self.runway_waypoint)
                .map(|idx| self.graph.waypoint(idx).clone())
                .ok_or_else(|| RouteError::unresolved(token.as_str())),
            _ => Err(RouteError::grammar(format!(
                "expected a waypoint, found {}",
                token
            ))),
        }
    }

    /// The graph's copy of a procedure end point, if the graph publishes it.
    /// A namesake away from the fix does not count.
    fn graph_copy(&self, waypoint: &Waypoint) -> Option<Waypoint> {
        self.graph
            .find_same_fix(waypoint)
            .map(|idx| self.graph.waypoint(idx).clone())
    }
}

fn procedure_neighbor(procedure: &Procedure) -> Neighbor {
    Neighbor::procedure(
        procedure.name.clone(),
        procedure.total_distance_nm(),
        procedure.inner_waypoints(),
    )
}

fn procedure_name(token: &Token) -> Option<&str> {
    match token {
        Token::Ident(name) => Some(name),
        _ => None,
    }
}

pub struct StarExtractor<'a> {
    tokens: Vec<Token>,
    terminal: Terminal<'a>,
}

impl<'a> StarExtractor<'a> {
    /// `tokens` must not contain the destination ICAO.
    pub fn new(tokens: Vec<Token>, terminal: Terminal<'a>) -> Self {
        Self { tokens, terminal }
    }

    pub fn extract(mut self) -> Result<ExtractResult> {
        let t = self.terminal;
        let Some(last) = self.tokens.last().cloned() else {
            return Err(RouteError::grammar("empty route segment before destination"));
        };

        let star = match procedure_name(&last) {
            Some(name) => t.try_procedure(ProcedureKind::Star, name)?,
            None => None,
        };

        let Some(star) = star else {
            // Case 1
            let wpt = t.find_waypoint(&last)?;
            let distance = wpt.distance_to(t.runway_waypoint);
            let route = Route::leg(wpt, Neighbor::direct(distance), t.runway_waypoint.clone());
            return Ok(ExtractResult {
                remaining: self.tokens,
                route,
            });
        };

        self.tokens.pop();
        let star_first = star
            .first_waypoint()
            .cloned()
            .ok_or_else(|| RouteError::Store(format!("STAR {} has no waypoints", star.name)))?;

        let Some(entry) = self.tokens.last() else {
            return Err(RouteError::grammar(format!(
                "STAR {} must be preceded by its first waypoint {}",
                star.name, star_first.ident
            )));
        };
        if entry.as_str() != star_first.ident {
            return Err(RouteError::grammar(format!(
                "{} is not the first waypoint of the STAR {}",
                entry, star.name
            )));
        }

        let neighbor = procedure_neighbor(&star);
        let route = match t.graph_copy(&star_first) {
            // Case 2
            Some(entry_wpt) => Route::leg(entry_wpt, neighbor, t.runway_waypoint.clone()),
            // Case 3
            None => {
                self.tokens.pop();
                if self.tokens.last() == Some(&Token::Direct) {
                    self.tokens.pop();
                }
                let Some(enroute) = self.tokens.last() else {
                    return Err(RouteError::grammar(format!(
                        "{} is not a published waypoint; STAR {} needs an en-route waypoint before it",
                        star_first.ident, star.name
                    )));
                };
                let last_enroute = t.find_waypoint(enroute)?;
                let to_entry = last_enroute.distance_to(&star_first);
                Route::from_nodes(vec![
                    RouteNode::new(last_enroute, Some(Neighbor::direct(to_entry))),
                    RouteNode::new(star_first, Some(neighbor)),
                    RouteNode::terminal(t.runway_waypoint.clone()),
                ])
            }
        };

        tracing::debug!(star = %star.name, runway = t.runway, "extracted STAR");
        Ok(ExtractResult {
            remaining: self.tokens,
            route,
        })
    }
}

pub struct SidExtractor<'a> {
    tokens: Vec<Token>,
    terminal: Terminal<'a>,
}

impl<'a> SidExtractor<'a> {
    /// `tokens` must not contain the origin ICAO.
    pub fn new(tokens: Vec<Token>, terminal: Terminal<'a>) -> Self {
        Self { tokens, terminal }
    }

    pub fn extract(mut self) -> Result<ExtractResult> {
        let t = self.terminal;
        let Some(first) = self.tokens.first().cloned() else {
            return Err(RouteError::grammar("empty route segment after origin"));
        };

        let sid = match procedure_name(&first) {
            Some(name) => t.try_procedure(ProcedureKind::Sid, name)?,
            None => None,
        };

        let Some(sid) = sid else {
            // Case 1
            let wpt = t.find_waypoint(&first)?;
            let distance = t.runway_waypoint.distance_to(&wpt);
            let route = Route::leg(t.runway_waypoint.clone(), Neighbor::direct(distance), wpt);
            return Ok(ExtractResult {
                remaining: self.tokens,
                route,
            });
        };

        self.tokens.remove(0);
        let sid_last = sid
            .last_waypoint()
            .cloned()
            .ok_or_else(|| RouteError::Store(format!("SID {} has no waypoints", sid.name)))?;

        let Some(exit) = self.tokens.first() else {
            return Err(RouteError::grammar(format!(
                "SID {} must be followed by its last waypoint {}",
                sid.name, sid_last.ident
            )));
        };
        if exit.as_str() != sid_last.ident {
            return Err(RouteError::grammar(format!(
                "{} is not the last waypoint of the SID {}",
                exit, sid.name
            )));
        }

        let neighbor = procedure_neighbor(&sid);
        let route = match t.graph_copy(&sid_last) {
            // Case 2
            Some(exit_wpt) => Route::leg(t.runway_waypoint.clone(), neighbor, exit_wpt),
            // Case 3
            None => {
                self.tokens.remove(0);
                if self.tokens.first() == Some(&Token::Direct) {
                    self.tokens.remove(0);
                }
                let Some(enroute) = self.tokens.first() else {
                    return Err(RouteError::grammar(format!(
                        "{} is not a published waypoint; SID {} needs an en-route waypoint after it",
                        sid_last.ident, sid.name
                    )));
                };
                let first_enroute = t.find_waypoint(enroute)?;
                let from_exit = sid_last.distance_to(&first_enroute);
                Route::from_nodes(vec![
                    RouteNode::new(t.runway_waypoint.clone(), Some(neighbor)),
                    RouteNode::new(sid_last, Some(Neighbor::direct(from_exit))),
                    RouteNode::terminal(first_enroute),
                ])
            }
        };

        tracing::debug!(sid = %sid.name, runway = t.runway, "extracted SID");
        Ok(ExtractResult {
            remaining: self.tokens,
            route,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RouteString;
    use crate::procedures::ProcedureTable;

    struct Fixture {
        graph: WaypointGraph,
        store: ProcedureTable,
        orig_rwy: Waypoint,
        dest_rwy: Waypoint,
    }

    fn fixture() -> Fixture {
        let mut graph = WaypointGraph::new();
        let p = graph.add_waypoint(Waypoint::new("P", 10.0, 10.0));
        let q = graph.add_waypoint(Waypoint::new("Q", 11.0, 11.0));
        // Same ident far away, to check closest-to-runway resolution.
        graph.add_waypoint(Waypoint::new("Q", 50.0, 50.0));
        graph.add_two_way_edge(p, q, "A1", None);
        // Namesake of a procedure fix, nowhere near it.
        graph.add_waypoint(Waypoint::new("FARFIX", 60.0, 100.0));

        let orig_rwy = Waypoint::new("AAAA01", 9.0, 9.0);
        let dest_rwy = Waypoint::new("BBBB19", 12.0, 12.0);

        let mut store = ProcedureTable::new();
        // STAR entering at Q, which the graph publishes.
        store.insert(
            "BBBB",
            ProcedureKind::Star,
            "STAR1",
            &["19"],
            vec![Waypoint::new("Q", 11.0, 11.0), Waypoint::new("S1", 11.5, 11.5)],
        );
        // STAR entering at an off-graph fix.
        store.insert(
            "BBBB",
            ProcedureKind::Star,
            "STAR2",
            &["19"],
            vec![Waypoint::new("OFFNET", 11.2, 11.4), Waypoint::new("S2", 11.6, 11.7)],
        );
        store.insert(
            "BBBB",
            ProcedureKind::Star,
            "STAR3",
            &["19"],
            vec![Waypoint::new("FARFIX", 11.5, 11.5), Waypoint::new("S3", 11.8, 11.8)],
        );
        store.insert(
            "AAAA",
            ProcedureKind::Sid,
            "SID3",
            &["01"],
            vec![Waypoint::new("D3", 9.3, 9.3), Waypoint::new("FARFIX", 9.7, 9.8)],
        );
        store.insert(
            "AAAA",
            ProcedureKind::Sid,
            "SID1",
            &["01"],
            vec![Waypoint::new("D1", 9.5, 9.5), Waypoint::new("P", 10.0, 10.0)],
        );
        store.insert(
            "AAAA",
            ProcedureKind::Sid,
            "SID2",
            &["01"],
            vec![Waypoint::new("D2", 9.4, 9.6), Waypoint::new("VECTOR", 9.8, 9.9)],
        );

        Fixture {
            graph,
            store,
            orig_rwy,
            dest_rwy,
        }
    }

    /// Store whose backend is unreachable.
    struct OfflineStore;

    impl ProcedureStore for OfflineStore {
        fn procedure(
            &self,
            _icao: &str,
            _kind: ProcedureKind,
            _name: &str,
            _runway: &str,
            _runway_waypoint: &Waypoint,
        ) -> Result<Procedure> {
            Err(RouteError::Store("procedure database offline".to_string()))
        }

        fn procedure_names(&self, _icao: &str, _kind: ProcedureKind, _runway: &str) -> Vec<String> {
            Vec::new()
        }
    }

    fn star_with(f: &Fixture, store: &dyn ProcedureStore, route: &str) -> Result<ExtractResult> {
        let tokens = RouteString::parse(route).unwrap().into_tokens();
        let terminal = Terminal {
            icao: "BBBB",
            runway: "19",
            runway_waypoint: &f.dest_rwy,
            graph: &f.graph,
            store,
        };
        StarExtractor::new(tokens, terminal).extract()
    }

    fn sid_with(f: &Fixture, store: &dyn ProcedureStore, route: &str) -> Result<ExtractResult> {
        let tokens = RouteString::parse(route).unwrap().into_tokens();
        let terminal = Terminal {
            icao: "AAAA",
            runway: "01",
            runway_waypoint: &f.orig_rwy,
            graph: &f.graph,
            store,
        };
        SidExtractor::new(tokens, terminal).extract()
    }

    fn star(f: &Fixture, route: &str) -> Result<ExtractResult> {
        star_with(f, &f.store, route)
    }

    fn sid(f: &Fixture, route: &str) -> Result<ExtractResult> {
        sid_with(f, &f.store, route)
    }

    fn idents(route: &Route) -> Vec<&str> {
        route.waypoints().map(|w| w.ident.as_str()).collect()
    }

    fn assert_star_seam(result: &ExtractResult) {
        let last = result.remaining.last().unwrap();
        assert_eq!(last.as_str(), result.route.first_waypoint().unwrap().ident);
    }

    #[test]
    fn test_star_case1_no_star() {
        let f = fixture();
        let result = star(&f, "P A1 Q").unwrap();
        assert_eq!(result.remaining.len(), 3);
        assert_eq!(idents(&result.route), vec!["Q", "BBBB19"]);
        // The Q near the runway, not the one at 50,50
        assert_eq!(result.route.first_waypoint().unwrap().lat, 11.0);
        assert!(result.route.nodes()[0].neighbor.as_ref().unwrap().is_direct());
        assert_star_seam(&result);
    }

    #[test]
    fn test_star_case2_entry_in_graph() {
        let f = fixture();
        let result = star(&f, "P A1 Q STAR1").unwrap();
        let remaining: Vec<&str> = result.remaining.iter().map(Token::as_str).collect();
        assert_eq!(remaining, vec!["P", "A1", "Q"]);
        assert_eq!(idents(&result.route), vec!["Q", "BBBB19"]);
        let edge = result.route.nodes()[0].neighbor.as_ref().unwrap();
        assert_eq!(edge.airway, "STAR1");
        assert_eq!(edge.inner_waypoints.len(), 1);
        assert_eq!(edge.inner_waypoints[0].ident, "S1");
        assert_star_seam(&result);
    }

    #[test]
    fn test_star_case3_entry_off_graph() {
        let f = fixture();
        let result = star(&f, "P A1 Q OFFNET STAR2").unwrap();
        let remaining: Vec<&str> = result.remaining.iter().map(Token::as_str).collect();
        assert_eq!(remaining, vec!["P", "A1", "Q"]);
        assert_eq!(idents(&result.route), vec!["Q", "OFFNET", "BBBB19"]);
        assert!(result.route.nodes()[0].neighbor.as_ref().unwrap().is_direct());
        assert_eq!(result.route.nodes()[1].neighbor.as_ref().unwrap().airway, "STAR2");
        assert_star_seam(&result);
    }

    #[test]
    fn test_star_case3_skips_dct() {
        let f = fixture();
        let result = star(&f, "Q DCT OFFNET STAR2").unwrap();
        let remaining: Vec<&str> = result.remaining.iter().map(Token::as_str).collect();
        assert_eq!(remaining, vec!["Q"]);
        assert_star_seam(&result);
    }

    #[test]
    fn test_star_entry_with_distant_namesake_is_off_graph() {
        let f = fixture();
        let result = star(&f, "P A1 Q FARFIX STAR3").unwrap();
        let remaining: Vec<&str> = result.remaining.iter().map(Token::as_str).collect();
        assert_eq!(remaining, vec!["P", "A1", "Q"]);
        assert_eq!(idents(&result.route), vec!["Q", "FARFIX", "BBBB19"]);
        // The STAR's own fix, not the graph's FARFIX at 60,100
        assert_eq!(result.route.nodes()[1].waypoint, Waypoint::new("FARFIX", 11.5, 11.5));
        let total = result.route.total_distance_nm().unwrap();
        assert!(total < 200.0, "{}", total);
        assert_star_seam(&result);
    }

    #[test]
    fn test_store_failure_is_not_case1() {
        let f = fixture();
        assert!(matches!(
            star_with(&f, &OfflineStore, "P A1 Q"),
            Err(RouteError::Store(_))
        ));
        assert!(matches!(
            sid_with(&f, &OfflineStore, "P A1 Q"),
            Err(RouteError::Store(_))
        ));
    }

    #[test]
    fn test_star_entry_mismatch_names_procedure() {
        let f = fixture();
        let err = star(&f, "P STAR1").unwrap_err();
        match err {
            RouteError::Grammar(msg) => assert!(msg.contains("STAR1"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_star_unknown_waypoint_is_unresolved() {
        let f = fixture();
        let err = star(&f, "P NOWHERE").unwrap_err();
        assert!(matches!(err, RouteError::UnresolvedReference { ident } if ident == "NOWHERE"));
    }

    #[test]
    fn test_star_alone_is_grammar_error() {
        let f = fixture();
        assert!(matches!(star(&f, "STAR1"), Err(RouteError::Grammar(_))));
    }

    #[test]
    fn test_sid_case1() {
        let f = fixture();
        let result = sid(&f, "P A1 Q").unwrap();
        assert_eq!(result.remaining.len(), 3);
        assert_eq!(idents(&result.route), vec!["AAAA01", "P"]);
    }

    #[test]
    fn test_sid_case2() {
        let f = fixture();
        let result = sid(&f, "SID1 P A1 Q").unwrap();
        assert_eq!(result.remaining[0].as_str(), "P");
        assert_eq!(idents(&result.route), vec!["AAAA01", "P"]);
        let edge = result.route.nodes()[0].neighbor.as_ref().unwrap();
        assert_eq!(edge.airway, "SID1");
        assert_eq!(edge.inner_waypoints[0].ident, "D1");
        assert_eq!(result.remaining[0].as_str(), result.route.last_waypoint().unwrap().ident);
    }

    #[test]
    fn test_sid_case3() {
        let f = fixture();
        let result = sid(&f, "SID2 VECTOR P A1 Q").unwrap();
        assert_eq!(result.remaining[0].as_str(), "P");
        assert_eq!(idents(&result.route), vec!["AAAA01", "VECTOR", "P"]);
        assert_eq!(result.route.nodes()[0].neighbor.as_ref().unwrap().airway, "SID2");
        assert!(result.route.nodes()[1].neighbor.as_ref().unwrap().is_direct());
    }

    #[test]
    fn test_sid_exit_with_distant_namesake_is_off_graph() {
        let f = fixture();
        let result = sid(&f, "SID3 FARFIX P A1 Q").unwrap();
        assert_eq!(result.remaining[0].as_str(), "P");
        assert_eq!(idents(&result.route), vec!["AAAA01", "FARFIX", "P"]);
        assert_eq!(result.route.nodes()[1].waypoint, Waypoint::new("FARFIX", 9.7, 9.8));
        assert!(result.route.nodes()[1].neighbor.as_ref().unwrap().is_direct());
    }

    #[test]
    fn test_sid_exit_mismatch() {
        let f = fixture();
        assert!(matches!(sid(&f, "SID1 Q"), Err(RouteError::Grammar(_))));
    }
}
