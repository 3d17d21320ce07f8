use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::aircraft::{Icao24, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlightError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("flight {icao24} ends at {last_seen} before it starts at {first_seen}")]
    EndsBeforeStart {
        icao24: String,
        first_seen: i64,
        last_seen: i64,
    },
}

/// Departure/arrival pair a flight was estimated to fly.
/// Ordered by departure airport first, then arrival airport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Route {
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
}

impl Route {
    /// Builds a route from optional airport codes; blank codes count as unknown.
    /// Returns `None` when neither end is known.
    pub fn from_airports(departure: Option<&str>, arrival: Option<&str>) -> Option<Self> {
        let clean = |code: Option<&str>| {
            code.map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_ascii_uppercase)
        };
        let departure_airport = clean(departure);
        let arrival_airport = clean(arrival);
        if departure_airport.is_none() && arrival_airport.is_none() {
            return None;
        }
        Some(Self {
            departure_airport,
            arrival_airport,
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.departure_airport.as_deref().unwrap_or("????"),
            self.arrival_airport.as_deref().unwrap_or("????")
        )
    }
}

/// Identity of a flight
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub icao24: Icao24,
    pub first_seen: i64,
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.icao24, self.first_seen)
    }
}

/// A tracked flight of an aircraft.
///
/// `icao24` is always set, `aircraft` only once an aircraft with that address
/// exists in the store. A flight with `aircraft == None` is an orphan.
#[derive(Debug, Clone, Serialize)]
pub struct Flight {
    pub icao24: Icao24,
    first_seen: i64,
    last_seen: i64,
    pub route: Option<Route>,
    pub aircraft: Option<Icao24>,
}

impl Flight {
    /// Creates an orphan flight; fails if `last_seen` precedes `first_seen`
    pub fn new(icao24: Icao24, first_seen: i64, last_seen: i64) -> Result<Self, FlightError> {
        if last_seen < first_seen {
            return Err(FlightError::EndsBeforeStart {
                icao24: icao24.to_string(),
                first_seen,
                last_seen,
            });
        }
        Ok(Self {
            icao24,
            first_seen,
            last_seen,
            route: None,
            aircraft: None,
        })
    }

    pub fn with_route(mut self, route: Option<Route>) -> Self {
        self.route = route;
        self
    }

    pub fn first_seen(&self) -> i64 {
        self.first_seen
    }

    pub fn last_seen(&self) -> i64 {
        self.last_seen
    }

    pub fn key(&self) -> FlightKey {
        FlightKey {
            icao24: self.icao24.clone(),
            first_seen: self.first_seen,
        }
    }

    /// Seconds between first and last sighting, capped at `i64::MAX`
    pub fn duration_seconds(&self) -> i64 {
        self.last_seen.saturating_sub(self.first_seen)
    }

    /// A flight is long when its duration strictly exceeds the threshold
    pub fn is_long(&self, threshold_seconds: i64) -> bool {
        self.duration_seconds() > threshold_seconds
    }

    pub fn is_orphan(&self) -> bool {
        self.aircraft.is_none()
    }
}

impl PartialEq for Flight {
    fn eq(&self, other: &Self) -> bool {
        self.first_seen == other.first_seen && self.icao24 == other.icao24
    }
}

impl Eq for Flight {}

impl Hash for Flight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.icao24.hash(state);
        self.first_seen.hash(state);
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Flight {} first_seen={} last_seen={}",
            self.icao24, self.first_seen, self.last_seen
        )?;
        if let Some(route) = &self.route {
            write!(f, " route={}", route)?;
        }
        Ok(())
    }
}

/// Incoming flight row, OpenSky column names accepted as aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub icao24: String,
    #[serde(alias = "firstSeen")]
    pub first_seen: i64,
    #[serde(alias = "lastSeen")]
    pub last_seen: i64,
    #[serde(default, alias = "estDepartureAirport")]
    pub departure_airport: Option<String>,
    #[serde(default, alias = "estArrivalAirport")]
    pub arrival_airport: Option<String>,
}

impl FlightRecord {
    pub fn to_flight(&self) -> Result<Flight, FlightError> {
        let icao24 = Icao24::parse(&self.icao24)?;
        let route = Route::from_airports(
            self.departure_airport.as_deref(),
            self.arrival_airport.as_deref(),
        );
        Ok(Flight::new(icao24, self.first_seen, self.last_seen)?.with_route(route))
    }
}
