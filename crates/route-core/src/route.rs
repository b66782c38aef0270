//! Ordered, distance-annotated waypoint sequence.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::models::{Neighbor, RouteNode, Waypoint};

/// A path of waypoints joined by labeled edges.
///
/// Every node except the last carries the [`Neighbor`] leading to the next
/// node. The mutating operations below keep that invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    nodes: Vec<RouteNode>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route from nodes that already satisfy the edge invariant.
    pub(crate) fn from_nodes(nodes: Vec<RouteNode>) -> Self {
        debug_assert!(nodes
            .iter()
            .enumerate()
            .all(|(idx, node)| node.neighbor.is_some() == (idx + 1 < nodes.len())));
        Self { nodes }
    }

    /// Two-node route `from -airway-> to`.
    pub fn leg(from: Waypoint, neighbor: Neighbor, to: Waypoint) -> Self {
        Self {
            nodes: vec![RouteNode::new(from, Some(neighbor)), RouteNode::terminal(to)],
        }
    }

    pub fn single(waypoint: Waypoint) -> Self {
        Self {
            nodes: vec![RouteNode::terminal(waypoint)],
        }
    }

    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first_waypoint(&self) -> Option<&Waypoint> {
        self.nodes.first().map(|node| &node.waypoint)
    }

    pub fn last_waypoint(&self) -> Option<&Waypoint> {
        self.nodes.last().map(|node| &node.waypoint)
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.nodes.iter().map(|node| &node.waypoint)
    }

    /// Sum of all edge distances. Fewer than two nodes is an error, not zero.
    pub fn total_distance_nm(&self) -> Result<f64> {
        if self.nodes.len() < 2 {
            return Err(RouteError::RouteTooShort);
        }
        Ok(self
            .nodes
            .iter()
            .filter_map(|node| node.neighbor.as_ref())
            .map(|neighbor| neighbor.distance_nm)
            .sum())
    }

    /// Append a waypoint, joined to the current last node by `airway`.
    ///
    /// `distance_nm` defaults to the great-circle distance. On an empty route
    /// the waypoint becomes the only node and the edge data is ignored.
    pub fn push_back_waypoint(&mut self, waypoint: Waypoint, airway: &str, distance_nm: Option<f64>) {
        if let Some(last) = self.nodes.last_mut() {
            let distance = distance_nm.unwrap_or_else(|| last.waypoint.distance_to(&waypoint));
            last.neighbor = Some(Neighbor::new(airway, distance));
        }
        self.nodes.push(RouteNode::terminal(waypoint));
    }

    /// Prepend a waypoint, joined to the current first node by `airway`.
    ///
    /// On an empty route the node still keeps the edge; it is completed by the
    /// next `push_back_waypoint`.
    pub fn push_front_waypoint(&mut self, waypoint: Waypoint, airway: &str, distance_nm: Option<f64>) {
        let distance = match (distance_nm, self.nodes.first()) {
            (Some(distance), _) => distance,
            (None, Some(first)) => waypoint.distance_to(&first.waypoint),
            (None, None) => 0.0,
        };
        self.nodes
            .insert(0, RouteNode::new(waypoint, Some(Neighbor::new(airway, distance))));
    }

    /// Append a whole route, adding a new `airway` edge between the current
    /// last node and the other route's first node.
    pub fn append_route(&mut self, other: Route, airway: &str, distance_nm: Option<f64>) {
        let mut nodes = other.nodes.into_iter();
        let Some(first) = nodes.next() else {
            return;
        };
        if let Some(last) = self.nodes.last_mut() {
            let distance = distance_nm.unwrap_or_else(|| last.waypoint.distance_to(&first.waypoint));
            last.neighbor = Some(Neighbor::new(airway, distance));
        }
        self.nodes.push(first);
        self.nodes.extend(nodes);
    }

    /// Join `other` onto this route at their shared seam waypoint.
    ///
    /// The seam appears once in the result. An empty `self` simply becomes
    /// `other`; an empty `other` leaves `self` unchanged.
    pub fn connect(&mut self, other: Route) -> Result<()> {
        let Some(seam) = self.nodes.last() else {
            self.nodes = other.nodes;
            return Ok(());
        };
        let Some(other_first) = other.nodes.first() else {
            return Ok(());
        };
        if seam.waypoint != other_first.waypoint {
            return Err(RouteError::ConnectionMismatch {
                left: seam.waypoint.ident.clone(),
                right: other_first.waypoint.ident.clone(),
            });
        }
        self.nodes.pop();
        self.nodes.extend(other.nodes);
        Ok(())
    }

    /// Connect a sequence of fragments left to right.
    pub fn connect_all<I>(routes: I) -> Result<Route>
    where
        I: IntoIterator<Item = Route>,
    {
        let mut result = Route::new();
        for route in routes {
            result.connect(route)?;
        }
        Ok(result)
    }

    pub(crate) fn first_node_mut(&mut self) -> Option<&mut RouteNode> {
        self.nodes.first_mut()
    }

    pub(crate) fn last_node_mut(&mut self) -> Option<&mut RouteNode> {
        self.nodes.last_mut()
    }
}
