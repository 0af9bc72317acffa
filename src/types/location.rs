// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `[longitude, latitude]` pair, stored as a two element array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location(pub f64, pub f64);

impl Location {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    /// Planar squared distance, matching a flat 2d index.
    pub fn distance_sq(&self, other: &Location) -> f64 {
        (self.0 - other.0).powi(2) + (self.1 - other.1).powi(2)
    }

    /// Reads a stored `[lon, lat]` array back.
    pub fn from_value(value: &Value) -> Option<Self> {
        let pair = value.as_array()?;
        match pair.as_slice() {
            [lon, lat] => Some(Self(lon.as_f64()?, lat.as_f64()?)),
            _ => None,
        }
    }
}

impl From<Location> for Value {
    fn from(loc: Location) -> Self {
        Value::from(vec![loc.0, loc.1])
    }
}
