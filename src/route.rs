//! Route planning across the located destinations.

use crate::model::{EnrichedDestination, GeoCoordinate, Route};
use crate::providers::RoutingService;
use crate::report::Degradation;
use std::time::Instant;

/// A route plus the degradation recorded when it had to fall back.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub route: Route,
    pub degradation: Option<Degradation>,
}

impl RoutePlan {
    fn degenerate(cause: impl Into<String>) -> Self {
        Self {
            route: Route::degenerate(),
            degradation: Some(Degradation::routing(cause)),
        }
    }
}

/// Route through every destination with a coordinate, in input order.
///
/// Never fails: fewer than two waypoints, a provider error, or an empty
/// result all yield [`Route::degenerate`].
pub fn plan_route(router: &dyn RoutingService, destinations: &[EnrichedDestination]) -> RoutePlan {
    let waypoints: Vec<GeoCoordinate> = destinations
        .iter()
        .filter_map(|destination| destination.coordinate)
        .collect();
    if waypoints.len() < 2 {
        return RoutePlan::degenerate(format!(
            "{} located destination(s); at least 2 are needed to route",
            waypoints.len()
        ));
    }

    let start = Instant::now();
    let routes = match router.route(&waypoints) {
        Ok(routes) => routes,
        Err(err) => return RoutePlan::degenerate(format!("{err:#}")),
    };
    let Some(route) = routes.into_iter().next() else {
        return RoutePlan::degenerate("routing service returned no routes");
    };

    let expected_legs = waypoints.len() - 1;
    if route.legs.len() != expected_legs {
        tracing::warn!(
            legs = route.legs.len(),
            expected_legs,
            "leg count does not match waypoints"
        );
    }
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        waypoints = waypoints.len(),
        legs = route.legs.len(),
        distance_m = route.total_distance_meters,
        "route planned"
    );
    RoutePlan {
        route,
        degradation: None,
    }
}
