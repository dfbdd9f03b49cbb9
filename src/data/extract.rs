//! Mapping of raw catalog field maps onto typed records
//!
//! Both extractors are fail-fast: the first record that cannot be parsed or
//! propagated aborts the call, so a run never persists a silently incomplete
//! catalog. Output order follows input order and nothing is deduplicated here.

use crate::error::{ExtractError, ParseError};
use crate::propagation::{propagate, PropagationTarget};

use super::raw::*;
use super::{Satellite, Source, SpaceObject};

/// Parse every raw record into an element set
pub fn extract_satellites(raw: &[RawFields]) -> Result<Vec<Satellite>, ParseError> {
    raw.iter()
        .enumerate()
        .map(|(index, fields)| parse_satellite(index, fields))
        .collect()
}

/// Parse and propagate every raw record into a state vector record
///
/// `target` decides the instant the vectors are computed for; the record's
/// identity epoch is always the element set's own epoch.
pub fn extract_space_objects(
    raw: &[RawFields],
    target: PropagationTarget,
) -> Result<Vec<SpaceObject>, ExtractError> {
    let mut objects = Vec::with_capacity(raw.len());
    for (index, fields) in raw.iter().enumerate() {
        let elements = parse_satellite(index, fields)?;
        objects.push(space_object_from(&elements, target)?);
    }
    Ok(objects)
}

/// Derive the state vector record of one element set
pub fn space_object_from(
    elements: &Satellite,
    target: PropagationTarget,
) -> Result<SpaceObject, ExtractError> {
    let at = target.resolve(elements);
    let state = propagate(elements, at)?;
    Ok(SpaceObject {
        id: elements.norad_cat_id,
        name: elements.object_name.clone(),
        epoch: elements.epoch,
        position: state.position,
        velocity: state.velocity,
        source: Source::Celestrak,
        propagated_at: at,
    })
}

fn parse_satellite(index: usize, fields: &RawFields) -> Result<Satellite, ParseError> {
    let r = FieldReader::new(index, fields);
    Ok(Satellite {
        object_name: r.string(OBJECT_NAME)?,
        object_id: r.string(OBJECT_ID)?,
        epoch: r.epoch(EPOCH)?,
        mean_motion: r.float(MEAN_MOTION)?,
        eccentricity: r.float(ECCENTRICITY)?,
        inclination: r.float(INCLINATION)?,
        ra_of_asc_node: r.float(RA_OF_ASC_NODE)?,
        arg_of_pericenter: r.float(ARG_OF_PERICENTER)?,
        mean_anomaly: r.float(MEAN_ANOMALY)?,
        ephemeris_type: r.integer_as(EPHEMERIS_TYPE)?,
        classification_type: r.string(CLASSIFICATION_TYPE)?,
        norad_cat_id: r.integer_as(NORAD_CAT_ID)?,
        element_set_no: r.integer_as(ELEMENT_SET_NO)?,
        rev_at_epoch: r.integer_as(REV_AT_EPOCH)?,
        bstar: r.float(BSTAR)?,
        mean_motion_dot: r.float(MEAN_MOTION_DOT)?,
        mean_motion_ddot: r.float(MEAN_MOTION_DDOT)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::Sgp4Failure;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn iss_fields() -> RawFields {
        let value = json!({
            "OBJECT_ID": "25544",
            "OBJECT_NAME": "ISS (ZARYA)",
            "EPOCH": "2024-01-01T00:00:00.000",
            "NORAD_CAT_ID": 25544,
            "INCLINATION": 51.6432,
            "ECCENTRICITY": 0.0006703,
            "ARG_OF_PERICENTER": 130.5360,
            "RA_OF_ASC_NODE": 325.0288,
            "ELEMENT_SET_NO": 999,
            "EPHEMERIS_TYPE": 0,
            "MEAN_MOTION": 15.48912345,
            "MEAN_ANOMALY": 325.0288,
            "MEAN_MOTION_DOT": 0.00012345,
            "MEAN_MOTION_DDOT": 0.0,
            "REV_AT_EPOCH": 12345,
            "BSTAR": 0.0001234,
            "CLASSIFICATION_TYPE": "U"
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_extract_satellite_preserves_fields() {
        let raw = vec![iss_fields()];
        let satellites = extract_satellites(&raw).unwrap();
        assert_eq!(satellites.len(), 1);

        let sat = &satellites[0];
        assert_eq!(sat.object_id, "25544");
        assert_eq!(sat.object_name, "ISS (ZARYA)");
        assert_eq!(sat.epoch, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(sat.norad_cat_id, 25544);
        assert_eq!(sat.inclination, 51.6432);
        assert_eq!(sat.eccentricity, 0.0006703);
        assert_eq!(sat.arg_of_pericenter, 130.5360);
        assert_eq!(sat.ra_of_asc_node, 325.0288);
        assert_eq!(sat.element_set_no, 999);
        assert_eq!(sat.ephemeris_type, 0);
        assert_eq!(sat.mean_motion, 15.48912345);
        assert_eq!(sat.mean_anomaly, 325.0288);
        assert_eq!(sat.mean_motion_dot, 0.00012345);
        assert_eq!(sat.mean_motion_ddot, 0.0);
        assert_eq!(sat.rev_at_epoch, 12345);
        assert_eq!(sat.bstar, 0.0001234);
        assert_eq!(sat.classification_type, "U");
    }

    #[test]
    fn test_extract_space_object_at_epoch() {
        let raw = vec![iss_fields()];
        let objects = extract_space_objects(&raw, PropagationTarget::Epoch).unwrap();
        let obj = &objects[0];

        assert_eq!(obj.id, 25544);
        assert_eq!(obj.name, "ISS (ZARYA)");
        assert_eq!(obj.epoch, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(obj.propagated_at, obj.epoch);
        assert_eq!(obj.source, Source::Celestrak);
        assert!((obj.position.x - 1868.0032467769893).abs() < 1e-3);
        assert!((obj.position.y - 3811.677524434829).abs() < 1e-3);
        assert!((obj.position.z - 5296.074735418253).abs() < 1e-3);
        assert!((obj.velocity.x - -6.51613678696814).abs() < 1e-6);
        assert!((obj.velocity.y - 3.9971693526230117).abs() < 1e-6);
        assert!((obj.velocity.z - -0.5809016400286962).abs() < 1e-6);
    }

    #[test]
    fn test_shared_instant_keeps_element_epoch_as_identity() {
        let raw = vec![iss_fields()];
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let objects = extract_space_objects(&raw, PropagationTarget::Instant(now)).unwrap();
        assert_eq!(objects[0].epoch, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(objects[0].propagated_at, now);
        assert!((objects[0].position.x - 1868.003).abs() > 1.0);
    }

    #[test]
    fn test_missing_field_fails_whole_call() {
        let mut broken = iss_fields();
        broken.remove("MEAN_MOTION");
        let raw = vec![iss_fields(), broken, iss_fields()];

        let err = extract_satellites(&raw).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.field, "MEAN_MOTION");

        let err = extract_space_objects(&raw, PropagationTarget::Epoch).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(ParseError { index: 1, .. })));
    }

    #[test]
    fn test_propagation_failure_fails_whole_call() {
        let mut hyperbolic = iss_fields();
        hyperbolic.insert("ECCENTRICITY".into(), json!(1.5));
        hyperbolic.insert("NORAD_CAT_ID".into(), json!(99999));
        let raw = vec![iss_fields(), hyperbolic];

        match extract_space_objects(&raw, PropagationTarget::Epoch) {
            Err(ExtractError::Propagation(err)) => {
                assert_eq!(err.code, Sgp4Failure::MeanEccentricity);
                assert_eq!(err.norad_cat_id, 99999);
            }
            other => panic!("expected propagation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_order_follows_input_and_duplicates_pass_through() {
        let mut other = iss_fields();
        other.insert("NORAD_CAT_ID".into(), json!(43013));
        let raw = vec![other, iss_fields(), iss_fields()];
        let satellites = extract_satellites(&raw).unwrap();
        let ids: Vec<u32> = satellites.iter().map(|s| s.norad_cat_id).collect();
        assert_eq!(ids, vec![43013, 25544, 25544]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_satellites(&[]).unwrap().is_empty());
        assert!(extract_space_objects(&[], PropagationTarget::Epoch)
            .unwrap()
            .is_empty());
    }
}
