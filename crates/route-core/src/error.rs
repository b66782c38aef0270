//! Error types for route resolution.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

/// Every way a route resolution request can fail.
///
/// All variants abort the request; no partial route is returned.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Malformed route string: consecutive commands, bad coordinate literal,
    /// procedure/seam mismatch, misplaced DCT, ...
    #[error("invalid route: {0}")]
    Grammar(String),

    /// A waypoint identifier that had to resolve is not in the graph.
    #[error("waypoint {ident} not found")]
    UnresolvedReference { ident: String },

    /// The graph has no connection between the two endpoints.
    #[error("no path from {from} to {to}")]
    NoPath { from: String, to: String },

    /// Two route fragments do not share their seam waypoint.
    #[error("cannot connect route ending at {left} to route starting at {right}")]
    ConnectionMismatch { left: String, right: String },

    /// Total distance requested for a route with fewer than two waypoints.
    #[error("route needs at least two waypoints to have a distance")]
    RouteTooShort,

    #[error("runway {runway} not found at {icao}")]
    UnknownRunway { icao: String, runway: String },

    /// The procedure is not published for this runway.
    #[error("procedure {name} not available for runway {runway}")]
    ProcedureNotFound { name: String, runway: String },

    /// Procedure store failed for a reason other than a missing procedure.
    #[error("procedure store failure: {0}")]
    Store(String),

    #[error("route search cancelled")]
    Cancelled,
}

impl RouteError {
    pub(crate) fn grammar(message: impl Into<String>) -> Self {
        RouteError::Grammar(message.into())
    }

    pub(crate) fn unresolved(ident: impl Into<String>) -> Self {
        RouteError::UnresolvedReference {
            ident: ident.into(),
        }
    }
}
