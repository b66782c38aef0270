//! Route output formatting.

use route_core::Route;
use serde::Serialize;

/// One line per leg, `FROM -AWY(dist)-> TO`, then the total.
pub fn render_text(route: &Route) -> String {
    let mut out = String::new();
    for pair in route.nodes().windows(2) {
        let Some(neighbor) = &pair[0].neighbor else {
            continue;
        };
        out.push_str(&format!(
            "{} -{}({:.1})-> {}",
            pair[0].waypoint.ident, neighbor.airway, neighbor.distance_nm, pair[1].waypoint.ident
        ));
        if !neighbor.inner_waypoints.is_empty() {
            let inner: Vec<&str> = neighbor
                .inner_waypoints
                .iter()
                .map(|w| w.ident.as_str())
                .collect();
            out.push_str(&format!(" [{}]", inner.join(" ")));
        }
        out.push('\n');
    }
    let total = match route.total_distance_nm() {
        Ok(total) => format!("Total: {:.1} nm", total),
        Err(err) => format!("Total: n/a ({})", err),
    };
    out.push_str(&total);
    out.push('\n');
    out
}

#[derive(Debug, Serialize)]
struct RouteOutput<'a> {
    route: &'a Route,
    distance_nm: Option<f64>,
}

pub fn render_json(route: &Route) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RouteOutput {
        route,
        distance_nm: route.total_distance_nm().ok(),
    })
}
