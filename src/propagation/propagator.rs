//! SGP4 propagation of mean-element sets using satkit

use chrono::{DateTime, Datelike, Timelike, Utc};
use satkit::sgp4::{self, sgp4_full, GravConst, OpsMode, SGP4Error};
use thiserror::Error;

use crate::data::{Satellite, Vector3D};
use crate::error::PropagationError;

/// WGS-72 equatorial radius used by SGP4 (km)
pub const SGP4_EARTH_RADIUS_KM: f64 = 6378.135;

/// Failure codes of the SGP4 model
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sgp4Failure {
    #[error("mean eccentricity out of range [0, 1)")]
    MeanEccentricity,
    #[error("mean motion is not positive")]
    MeanMotion,
    #[error("perturbed eccentricity out of range")]
    PerturbedEccentricity,
    #[error("semi-latus rectum is negative")]
    SemiLatusRectum,
    #[error("epoch elements are sub-orbital")]
    SubOrbital,
    #[error("satellite has decayed")]
    Decayed,
    #[error("target instant cannot be represented")]
    InvalidInstant,
    #[error("model produced non-finite state")]
    NonFinite,
    #[error("element set not supported by the model")]
    UnsupportedElements,
    #[error("unrecognized SGP4 status {0}")]
    Other(i32),
}

impl Sgp4Failure {
    /// Map a raw SGP4 status code (1..=6) onto a failure
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::MeanEccentricity,
            2 => Self::MeanMotion,
            3 => Self::PerturbedEccentricity,
            4 => Self::SemiLatusRectum,
            5 => Self::SubOrbital,
            6 => Self::Decayed,
            other => Self::Other(other),
        }
    }

    /// Numeric status code; negative values are raised before the model runs
    pub fn code(&self) -> i32 {
        match self {
            Self::MeanEccentricity => 1,
            Self::MeanMotion => 2,
            Self::PerturbedEccentricity => 3,
            Self::SemiLatusRectum => 4,
            Self::SubOrbital => 5,
            Self::Decayed => 6,
            Self::InvalidInstant => -1,
            Self::NonFinite => -2,
            Self::UnsupportedElements => -3,
            Self::Other(code) => *code,
        }
    }
}

/// Position and velocity at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgp4State {
    /// TEME, kilometers
    pub position: Vector3D,
    /// TEME, kilometers per second
    pub velocity: Vector3D,
}

/// Instant a batch of element sets is propagated to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropagationTarget {
    /// One shared instant for the whole batch
    Instant(DateTime<Utc>),
    /// Each element set's own epoch
    Epoch,
}

impl PropagationTarget {
    pub fn resolve(&self, elements: &Satellite) -> DateTime<Utc> {
        match self {
            Self::Instant(at) => *at,
            Self::Epoch => elements.epoch,
        }
    }
}

/// Propagate one element set to `at`
///
/// Pure and deterministic. Any model failure is returned with the identity
/// of the element set; it is never turned into a zero vector.
pub fn propagate(elements: &Satellite, at: DateTime<Utc>) -> Result<Sgp4State, PropagationError> {
    let fail = |code: Sgp4Failure| PropagationError {
        code,
        norad_cat_id: elements.norad_cat_id,
        epoch: elements.epoch,
    };

    check_mean_elements(elements).map_err(fail)?;

    let mut tle = to_tle(elements).map_err(fail)?;
    let time = to_instant(&at).map_err(fail)?;

    // WGS-72 constants, the set catalog element sets are fitted with
    let result = sgp4_full(&mut tle, &[time], GravConst::WGS72, OpsMode::IMPROVED)
        .map_err(|err| match err {
            sgp4::Error::SatRecInit(code) => fail(Sgp4Failure::from_code(code as i32)),
            other => {
                log::debug!("SGP4 rejected NORAD {}: {}", elements.norad_cat_id, other);
                fail(Sgp4Failure::UnsupportedElements)
            }
        })?;

    // Failures at the requested instant come back per column, not as Err
    match result.errcode.first() {
        Some(SGP4Error::SGP4Success) => {}
        Some(&code) => return Err(fail(Sgp4Failure::from_code(code as i32))),
        None => return Err(fail(Sgp4Failure::NonFinite)),
    }

    // satkit reports meters and m/s
    let position = Vector3D::new(
        result.pos[(0, 0)] / 1000.0,
        result.pos[(1, 0)] / 1000.0,
        result.pos[(2, 0)] / 1000.0,
    );
    let velocity = Vector3D::new(
        result.vel[(0, 0)] / 1000.0,
        result.vel[(1, 0)] / 1000.0,
        result.vel[(2, 0)] / 1000.0,
    );

    let finite = [position.x, position.y, position.z, velocity.x, velocity.y, velocity.z]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(fail(Sgp4Failure::NonFinite));
    }

    Ok(Sgp4State { position, velocity })
}

/// Reject element sets SGP4 would fail on at initialization
fn check_mean_elements(elements: &Satellite) -> Result<(), Sgp4Failure> {
    if !(0.0..1.0).contains(&elements.eccentricity) {
        return Err(Sgp4Failure::MeanEccentricity);
    }
    if !(elements.mean_motion > 0.0) {
        return Err(Sgp4Failure::MeanMotion);
    }
    Ok(())
}

fn to_tle(elements: &Satellite) -> Result<satkit::TLE, Sgp4Failure> {
    let mut tle = satkit::TLE::new();
    tle.name = elements.object_name.clone();
    tle.sat_num = elements.norad_cat_id as i32;
    tle.epoch = to_instant(&elements.epoch)?;
    tle.mean_motion_dot = elements.mean_motion_dot;
    tle.mean_motion_dot_dot = elements.mean_motion_ddot;
    tle.bstar = elements.bstar;
    tle.inclination = elements.inclination;
    tle.raan = elements.ra_of_asc_node;
    tle.eccen = elements.eccentricity;
    tle.arg_of_perigee = elements.arg_of_pericenter;
    tle.mean_anomaly = elements.mean_anomaly;
    tle.mean_motion = elements.mean_motion;
    tle.ephem_type =
        u8::try_from(elements.ephemeris_type).map_err(|_| Sgp4Failure::UnsupportedElements)?;
    Ok(tle)
}

fn to_instant(at: &DateTime<Utc>) -> Result<satkit::Instant, Sgp4Failure> {
    let seconds = at.second() as f64 + at.nanosecond() as f64 / 1e9;
    satkit::Instant::from_datetime(
        at.year(),
        at.month() as i32,
        at.day() as i32,
        at.hour() as i32,
        at.minute() as i32,
        seconds,
    )
    .map_err(|_| Sgp4Failure::InvalidInstant)
}
