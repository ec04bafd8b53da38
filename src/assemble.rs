//! Itinerary assembly. Pure: no I/O, no failure path.

use crate::model::{
    EnrichedDestination, Itinerary, Route, RouteLeg, TimelineEntry, DWELL_TIME, RETURN_LABEL,
    UNKNOWN, ZERO_DISTANCE,
};

/// Merge destinations and route legs into the final itinerary.
///
/// Leg `i` is paired with `destinations[i + 1]`; a leg past the last
/// destination is labelled [`RETURN_LABEL`]. Destinations without a leg do
/// not appear in the timeline.
pub fn assemble(
    city: &str,
    destinations: Vec<EnrichedDestination>,
    route: &Route,
    end_time: &str,
) -> Itinerary {
    let timeline = route
        .legs
        .iter()
        .enumerate()
        .map(|(index, leg)| timeline_entry(destinations.get(index + 1), Some(leg)))
        .collect();
    Itinerary::new(
        city.to_string(),
        destinations,
        timeline,
        format_distance_km(route),
        end_time.to_string(),
    )
}

fn timeline_entry(next: Option<&EnrichedDestination>, leg: Option<&RouteLeg>) -> TimelineEntry {
    TimelineEntry {
        destination: next.map_or_else(|| RETURN_LABEL.to_string(), |d| d.name.clone()),
        transit_time: leg.map_or_else(
            || UNKNOWN.to_string(),
            |leg| format!("{} minutes", leg.minutes()),
        ),
        dwell_time: DWELL_TIME.to_string(),
        weather: next.map_or_else(|| UNKNOWN.to_string(), |d| d.weather.to_string()),
    }
}

/// Route distance in kilometres with two decimals, or "0" when degenerate.
pub fn format_distance_km(route: &Route) -> String {
    if route.is_degenerate() {
        return ZERO_DISTANCE.to_string();
    }
    format!("{:.2}", route.total_distance_meters / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoCoordinate, WeatherObservation};

    fn destination(name: &str, weather: WeatherObservation) -> EnrichedDestination {
        EnrichedDestination {
            name: name.to_string(),
            address: "Somewhere".to_string(),
            coordinate: Some(GeoCoordinate::new(38.7, -9.1)),
            weather,
        }
    }

    fn route(durations: &[f64], distance: f64) -> Route {
        Route {
            legs: durations
                .iter()
                .map(|&duration_seconds| RouteLeg { duration_seconds })
                .collect(),
            total_distance_meters: distance,
        }
    }

    #[test]
    fn lisbon_two_legs_end_with_return() {
        let destinations = vec![
            destination("Castle", WeatherObservation::from_code(1)),
            destination("Aquarium", WeatherObservation::from_code(3)),
        ];
        let itinerary = assemble("Lisbon", destinations, &route(&[600.0, 900.0], 5000.0), "18:00");

        assert_eq!(
            itinerary.timeline(),
            &[
                TimelineEntry {
                    destination: "Aquarium".to_string(),
                    transit_time: "10 minutes".to_string(),
                    dwell_time: "1 hour".to_string(),
                    weather: "3".to_string(),
                },
                TimelineEntry {
                    destination: "Return".to_string(),
                    transit_time: "15 minutes".to_string(),
                    dwell_time: "1 hour".to_string(),
                    weather: "Unknown".to_string(),
                },
            ]
        );
        assert_eq!(itinerary.total_distance_km(), "5.00");
        assert_eq!(itinerary.city(), "Lisbon");
        assert_eq!(itinerary.end_time(), "18:00");
    }

    #[test]
    fn degenerate_route_has_empty_timeline_and_zero_distance() {
        let destinations = vec![EnrichedDestination::fallback("Castle")];
        let itinerary = assemble("Lisbon", destinations, &Route::degenerate(), "18:00");
        assert!(itinerary.timeline().is_empty());
        assert_eq!(itinerary.total_distance_km(), "0");
        assert_eq!(itinerary.destinations().len(), 1);
    }

    #[test]
    fn short_route_drops_trailing_destinations() {
        let destinations = vec![
            destination("A", WeatherObservation::Unknown),
            destination("B", WeatherObservation::from_code(61)),
            destination("C", WeatherObservation::from_code(0)),
        ];
        let itinerary = assemble("Porto", destinations, &route(&[125.0], 1234.0), "20:00");
        assert_eq!(itinerary.timeline().len(), 1);
        assert_eq!(itinerary.timeline()[0].destination, "B");
        assert_eq!(itinerary.timeline()[0].transit_time, "2 minutes");
        assert_eq!(itinerary.timeline()[0].weather, "61");
        assert_eq!(itinerary.total_distance_km(), "1.23");
        assert_eq!(itinerary.destinations().len(), 3);
    }

    #[test]
    fn unknown_weather_passes_through() {
        let destinations = vec![
            destination("A", WeatherObservation::from_code(2)),
            destination("B", WeatherObservation::Unknown),
        ];
        let itinerary = assemble("Rome", destinations, &route(&[60.0], 900.0), "17:00");
        assert_eq!(itinerary.timeline()[0].weather, "Unknown");
        assert_eq!(itinerary.timeline()[0].transit_time, "1 minutes");
        assert_eq!(itinerary.total_distance_km(), "0.90");
    }
}
