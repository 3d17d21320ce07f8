#![cfg(feature = "postgres")]

mod common;

use common::TestDatabase;
use flightops::aircraft::{Aircraft, AircraftRecord, Icao24};
use flightops::aircraft_models::AircraftModel;
use flightops::flight_ingest::ingest_flights;
use flightops::flights::{Flight, FlightRecord};
use flightops::operators::Operator;
use flightops::reconcile::reconcile;
use flightops::store::{AircraftStore, FlightStore, ModelStore, OperatorStore};

fn icao(s: &str) -> Icao24 {
    Icao24::parse(s).unwrap()
}

fn flight_record(icao24: &str, first_seen: i64) -> FlightRecord {
    FlightRecord {
        icao24: icao24.to_string(),
        first_seen,
        last_seen: first_seen + 3600,
        departure_airport: Some("EDDM".into()),
        arrival_airport: Some("LEMD".into()),
    }
}

#[test]
fn test_reconcile_links_orphans_in_postgres() {
    let Some(test_db) = TestDatabase::try_new() else {
        return;
    };
    let store = test_db.store();

    ingest_flights(&store, &[flight_record("3c4b26", 1_000)]).unwrap();
    let report = reconcile(
        &store,
        &[AircraftRecord::new("3c4b26", "A321", "Condor", "Condor")],
    )
    .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.relinked_flights.len(), 1);
    assert_eq!(store.flights_for_aircraft(&icao("3C4B26")).unwrap().len(), 1);
    assert!(store.find_operator("Condor").unwrap().is_some());
}

#[test]
fn test_constraint_violations_are_integrity_errors() {
    let Some(test_db) = TestDatabase::try_new() else {
        return;
    };
    let store = test_db.store();

    let dangling = Aircraft::new(icao("3C4B27"), "A321", "Nobody", "Nobody");
    let err = store.insert_aircraft(&[dangling]).unwrap_err();
    assert!(err.is_integrity(), "{}", err);

    store.insert_operators(&[Operator::new("Condor")]).unwrap();
    let err = store
        .insert_operators(&[Operator::new("Condor")])
        .unwrap_err();
    assert!(err.is_integrity(), "{}", err);

    let mut flight = Flight::new(icao("3C4B27"), 0, 10).unwrap();
    flight.aircraft = Some(icao("3C4B27"));
    assert!(store.insert_flights(&[flight]).unwrap_err().is_integrity());
}

#[test]
fn test_delete_cascades_to_flights() {
    let Some(test_db) = TestDatabase::try_new() else {
        return;
    };
    let store = test_db.store();

    store.insert_operators(&[Operator::new("Condor")]).unwrap();
    store.insert_models(&[AircraftModel::new("A321")]).unwrap();
    store
        .insert_aircraft(&[Aircraft::new(icao("3C4B28"), "A321", "Condor", "Condor")])
        .unwrap();
    ingest_flights(&store, &[flight_record("3c4b28", 0), flight_record("3c4b28", 9000)])
        .unwrap();

    assert!(store.delete_aircraft(&icao("3C4B28")).unwrap());
    assert!(store.all_flights().unwrap().is_empty());
    assert!(store.find_model("A321").unwrap().is_some());
    assert!(!store.delete_aircraft(&icao("3C4B28")).unwrap());
}

#[test]
fn test_existing_flight_keys_matches_exact_pairs() {
    let Some(test_db) = TestDatabase::try_new() else {
        return;
    };
    let store = test_db.store();

    ingest_flights(&store, &[flight_record("aaaaaa", 1), flight_record("bbbbbb", 2)])
        .unwrap();

    let probe = vec![
        Flight::new(icao("AAAAAA"), 1, 1).unwrap().key(),
        Flight::new(icao("AAAAAA"), 2, 2).unwrap().key(),
        Flight::new(icao("BBBBBB"), 1, 1).unwrap().key(),
    ];
    let existing = store.existing_flight_keys(&probe).unwrap();

    assert_eq!(existing.len(), 1);
    assert!(existing.contains(&probe[0]));
}
