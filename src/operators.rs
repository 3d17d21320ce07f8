use serde::{Deserialize, Serialize};

/// Airline or other organisation operating aircraft.
/// Its fleet is the set of aircraft whose `operator` equals `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
}

impl Operator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
