use serde::{Deserialize, Serialize};

/// Aircraft type designation such as "A320-214".
/// The aircraft of a model are those whose `model` equals `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AircraftModel {
    pub name: String,
}

impl AircraftModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
