//! Deterministic ordering of flights.
//!
//! Flights are ordered by `first_seen`, then `last_seen`, then by their
//! [`Route`](crate::flights::Route). Every compared flight must carry a route;
//! a flight without one is an invalid state and is reported as an error
//! instead of being placed arbitrarily.

use std::cmp::Ordering;

use crate::flights::{Flight, FlightKey};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlightOrderError {
    #[error("flight {0} has no route and cannot be ordered")]
    MissingRoute(FlightKey),
}

/// Compares two flights by first_seen, last_seen and route
pub fn compare_flights(a: &Flight, b: &Flight) -> Result<Ordering, FlightOrderError> {
    let route_a = a
        .route
        .as_ref()
        .ok_or_else(|| FlightOrderError::MissingRoute(a.key()))?;
    let route_b = b
        .route
        .as_ref()
        .ok_or_else(|| FlightOrderError::MissingRoute(b.key()))?;

    Ok(a.first_seen()
        .cmp(&b.first_seen())
        .then_with(|| a.last_seen().cmp(&b.last_seen()))
        .then_with(|| route_a.cmp(route_b)))
}

/// Sorts flights in place. The slice is left untouched when any flight lacks a route.
pub fn sort_flights(flights: &mut [Flight]) -> Result<(), FlightOrderError> {
    if let Some(flight) = flights.iter().find(|f| f.route.is_none()) {
        return Err(FlightOrderError::MissingRoute(flight.key()));
    }

    // Every route is present, so comparing the options matches comparing the routes.
    flights.sort_by(|a, b| {
        a.first_seen()
            .cmp(&b.first_seen())
            .then_with(|| a.last_seen().cmp(&b.last_seen()))
            .then_with(|| a.route.cmp(&b.route))
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::Icao24;
    use crate::flights::Route;
    use proptest::prelude::*;

    fn flight(first: i64, last: i64, dep: &str) -> Flight {
        Flight::new(Icao24::parse("ABC123").unwrap(), first, last)
            .unwrap()
            .with_route(Route::from_airports(Some(dep), Some("EPWA")))
    }

    #[test]
    fn test_orders_by_first_seen_then_last_seen_then_route() {
        let a = flight(100, 200, "EPGD");
        let b = flight(100, 300, "EPGD");
        let c = flight(100, 300, "EPKK");
        let d = flight(50, 900, "ZZZZ");

        assert_eq!(compare_flights(&a, &b), Ok(Ordering::Less));
        assert_eq!(compare_flights(&b, &c), Ok(Ordering::Less));
        assert_eq!(compare_flights(&d, &a), Ok(Ordering::Less));
        assert_eq!(compare_flights(&c, &c.clone()), Ok(Ordering::Equal));
    }

    #[test]
    fn test_missing_route_is_an_error() {
        let routed = flight(100, 200, "EPGD");
        let bare = Flight::new(Icao24::parse("DEF456").unwrap(), 1, 2).unwrap();

        let err = compare_flights(&routed, &bare).unwrap_err();
        assert_eq!(err, FlightOrderError::MissingRoute(bare.key()));
    }

    #[test]
    fn test_sort_leaves_slice_untouched_on_missing_route() {
        let bare = Flight::new(Icao24::parse("DEF456").unwrap(), 1, 2).unwrap();
        let mut flights = vec![flight(300, 400, "EPGD"), bare, flight(100, 200, "EPGD")];

        assert!(sort_flights(&mut flights).is_err());
        assert_eq!(flights[0].first_seen(), 300);
    }

    #[test]
    fn test_sort_flights() {
        let mut flights = vec![
            flight(300, 400, "EPGD"),
            flight(100, 200, "EPKK"),
            flight(100, 200, "EPGD"),
        ];
        sort_flights(&mut flights).unwrap();

        let order: Vec<_> = flights
            .iter()
            .map(|f| {
                (
                    f.first_seen(),
                    f.route.as_ref().unwrap().departure_airport.clone().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![
                (100, "EPGD".to_string()),
                (100, "EPKK".to_string()),
                (300, "EPGD".to_string())
            ]
        );
    }

    fn arb_flight() -> impl Strategy<Value = Flight> {
        (0i64..5, 0i64..5, prop::sample::select(vec!["EPGD", "EPKK", "EPWA"])).prop_map(
            |(first, extra, dep)| flight(first, first + extra, dep),
        )
    }

    proptest! {
        #[test]
        fn prop_equal_triples_compare_equal(f in arb_flight()) {
            let twin = Flight::new(Icao24::parse("FFFFFF").unwrap(), f.first_seen(), f.last_seen())
                .unwrap()
                .with_route(f.route.clone());
            prop_assert_eq!(compare_flights(&f, &twin).unwrap(), Ordering::Equal);
        }

        #[test]
        fn prop_antisymmetric(a in arb_flight(), b in arb_flight()) {
            let ab = compare_flights(&a, &b).unwrap();
            let ba = compare_flights(&b, &a).unwrap();
            prop_assert_eq!(ab, ba.reverse());
        }

        #[test]
        fn prop_transitive(a in arb_flight(), b in arb_flight(), c in arb_flight()) {
            let ab = compare_flights(&a, &b).unwrap();
            let bc = compare_flights(&b, &c).unwrap();
            if ab != Ordering::Greater && bc != Ordering::Greater {
                prop_assert_ne!(compare_flights(&a, &c).unwrap(), Ordering::Greater);
            }
        }
    }
}
