//! Orbital element sets and derived state vectors

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cartesian 3-vector
///
/// Used for position (km) and velocity (km/s) in the TEME frame SGP4
/// produces. Always owned by exactly one [`SpaceObject`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Catalog a record originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Celestrak,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celestrak => "CELESTRAK",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CELESTRAK" => Ok(Self::Celestrak),
            other => Err(format!("unknown source tag {other:?}")),
        }
    }
}

/// Mean-element set (OMM) for one catalog object at one epoch
///
/// Identity is `(norad_cat_id, epoch)`. Angles are degrees, mean motion is
/// revolutions per day, exactly as the catalog delivers them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    pub object_name: String,
    /// International designator, e.g. `1998-067A`
    pub object_id: String,
    pub epoch: DateTime<Utc>,

    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ra_of_asc_node: f64,
    pub arg_of_pericenter: f64,
    pub mean_anomaly: f64,

    pub ephemeris_type: i32,
    pub classification_type: String,
    pub norad_cat_id: u32,
    pub element_set_no: u32,
    pub rev_at_epoch: u32,

    /// B* drag term (1/earth radii)
    pub bstar: f64,
    /// First derivative of mean motion divided by two (rev/day²)
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six (rev/day³)
    pub mean_motion_ddot: f64,
}

/// Position and velocity of a tracked object derived from one element set
///
/// Identity is `(id, epoch)` where `epoch` is the element set's epoch, so a
/// re-ingested element set maps onto the same row. `propagated_at` is the
/// instant the vectors are valid for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceObject {
    /// NORAD catalog number
    pub id: u32,
    pub name: String,
    pub epoch: DateTime<Utc>,
    /// Kilometers from the Earth's center, TEME
    pub position: Vector3D,
    /// Kilometers per second, TEME
    pub velocity: Vector3D,
    pub source: Source,
    pub propagated_at: DateTime<Utc>,
}
