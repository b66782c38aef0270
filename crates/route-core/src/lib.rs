//! Route string resolution over a waypoint/airway graph.
//!
//! Turns a flight-planning route description (waypoints, airways, `DCT`,
//! SID/STAR names, literal coordinates, `AUTO` and `RAND` fills) into one
//! continuous, distance-annotated route from the departure runway to the
//! arrival runway.

pub mod analyzer;
pub mod cancel;
pub mod config;
pub mod coords;
pub mod error;
pub mod extractor;
pub mod finder;
pub mod grammar;
pub mod graph;
pub mod literal;
pub mod models;
pub mod procedures;
pub mod random;
pub mod route;
pub mod spatial;

pub use analyzer::{RouteAnalyzer, RouteRequest, SubRoute};
pub use cancel::CancelFlag;
pub use config::FinderConfig;
pub use coords::{parse_coordinate, LatLon};
pub use error::{Result, RouteError};
pub use extractor::{ExtractResult, SidExtractor, StarExtractor, Terminal};
pub use finder::{Endpoint, RouteFinder, TerminalLink};
pub use grammar::{flatten, group, RouteString, Segment, Token};
pub use graph::{AirwayEdge, TemporaryWaypoints, WaypointGraph};
pub use literal::LiteralAnalyzer;
pub use models::{Neighbor, RouteNode, Waypoint, DIRECT};
pub use procedures::{
    AirportLookup, AirportTable, Procedure, ProcedureKind, ProcedureLeg, ProcedureStore,
    ProcedureTable,
};
pub use random::{RandomRouteProvider, RandomWalk};
pub use route::Route;
pub use spatial::distance_nm;
