use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Literal some upstream feeds write in place of a missing value.
pub const NULL_SENTINEL: &str = "NULL";

/// Reasons an incoming aircraft field is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid icao24 address {0:?}: expected 6 hexadecimal digits")]
    Icao24(String),
    #[error("{0} is missing")]
    Missing(&'static str),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("{0} holds the NULL sentinel")]
    NullSentinel(&'static str),
}

/// 24-bit ICAO transponder address, stored as 6 upper-case hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Icao24(String);

impl Icao24 {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::Icao24(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Icao24 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Icao24 {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Icao24> for String {
    fn from(value: Icao24) -> Self {
        value.0
    }
}

impl fmt::Display for Icao24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks an operator, model or owner value.
/// Missing, empty and the literal "NULL" are all treated as absent.
pub fn check_reference_field<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ValidationError> {
    match value {
        None => Err(ValidationError::Missing(field)),
        Some("") => Err(ValidationError::Empty(field)),
        Some(NULL_SENTINEL) => Err(ValidationError::NullSentinel(field)),
        Some(v) => Ok(v),
    }
}

/// An aircraft as held by the store.
///
/// Operator and model are referenced by name; the aircraft's flights are
/// whatever flights in the store link to its `icao24`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    pub icao24: Icao24,
    pub owner: String,
    pub model: String,
    pub operator: String,
}

impl Aircraft {
    pub fn new(
        icao24: Icao24,
        model: impl Into<String>,
        operator: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            icao24,
            owner: owner.into(),
            model: model.into(),
            operator: operator.into(),
        }
    }

    pub fn to_record(&self) -> AircraftRecord {
        AircraftRecord {
            icao24: self.icao24.to_string(),
            model: Some(self.model.clone()),
            operator: Some(self.operator.clone()),
            owner: Some(self.owner.clone()),
        }
    }
}

impl PartialEq for Aircraft {
    fn eq(&self, other: &Self) -> bool {
        self.icao24 == other.icao24
    }
}

impl Eq for Aircraft {}

impl Hash for Aircraft {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.icao24.hash(state);
    }
}

/// External shape of an aircraft, used both for incoming batches and responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftRecord {
    pub icao24: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl AircraftRecord {
    pub fn new(icao24: &str, model: &str, operator: &str, owner: &str) -> Self {
        Self {
            icao24: icao24.to_string(),
            model: Some(model.to_string()),
            operator: Some(operator.to_string()),
            owner: Some(owner.to_string()),
        }
    }

    /// Validates every field and returns the aircraft this record describes
    pub fn validate(&self) -> Result<Aircraft, ValidationError> {
        let icao24 = Icao24::parse(&self.icao24)?;
        let operator = check_reference_field("operator", self.operator.as_deref())?;
        let model = check_reference_field("model", self.model.as_deref())?;
        let owner = check_reference_field("owner", self.owner.as_deref())?;
        Ok(Aircraft::new(icao24, model, operator, owner))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftPatch {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_icao24_is_normalized_to_upper_case() {
        let icao = Icao24::parse(" abc12f ").unwrap();
        assert_eq!(icao.as_str(), "ABC12F");
    }

    #[test]
    fn test_icao24_rejects_bad_input() {
        assert!(Icao24::parse("").is_err());
        assert!(Icao24::parse("ABC12").is_err());
        assert!(Icao24::parse("ABC1234").is_err());
        assert!(Icao24::parse("ABC12G").is_err());
    }

    #[test]
    fn test_icao24_deserializes_through_parse() {
        let icao: Icao24 = serde_json::from_str("\"4ca2b1\"").unwrap();
        assert_eq!(icao.as_str(), "4CA2B1");
        assert!(serde_json::from_str::<Icao24>("\"nope\"").is_err());
    }

    #[test]
    fn test_reference_field_validity() {
        assert_eq!(check_reference_field("operator", Some("Delta")), Ok("Delta"));
        assert_eq!(check_reference_field("operator", Some("null")), Ok("null"));
        assert_eq!(
            check_reference_field("operator", Some("")),
            Err(ValidationError::Empty("operator"))
        );
        assert_eq!(
            check_reference_field("operator", Some("NULL")),
            Err(ValidationError::NullSentinel("operator"))
        );
        assert_eq!(
            check_reference_field("operator", None),
            Err(ValidationError::Missing("operator"))
        );
    }

    #[test]
    fn test_record_validation_reports_the_failing_field() {
        let mut record = AircraftRecord::new("abc123", "A320", "", "Owner");
        assert_eq!(
            record.validate().unwrap_err(),
            ValidationError::Empty("operator")
        );

        record.operator = Some("NULL".into());
        assert_eq!(
            record.validate().unwrap_err(),
            ValidationError::NullSentinel("operator")
        );

        record.operator = Some("Delta".into());
        record.owner = None;
        assert_eq!(
            record.validate().unwrap_err(),
            ValidationError::Missing("owner")
        );
    }

    #[test]
    fn test_aircraft_equality_uses_icao24_only() {
        let icao = Icao24::parse("ABC123").unwrap();
        let a = Aircraft::new(icao.clone(), "A320", "Delta", "Bank");
        let b = Aircraft::new(icao, "B738", "United", "Other bank");
        assert_eq!(a, b);

        let set: HashSet<Aircraft> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
