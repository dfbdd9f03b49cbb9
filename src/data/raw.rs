//! Typed access to raw catalog field maps
//!
//! Catalog services deliver one flat JSON object per tracked object, keyed by
//! upper-case OMM field names. Keys are matched case-sensitively.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// One record as delivered by the catalog
pub type RawFields = Map<String, Value>;

pub const OBJECT_ID: &str = "OBJECT_ID";
pub const OBJECT_NAME: &str = "OBJECT_NAME";
pub const EPOCH: &str = "EPOCH";
pub const NORAD_CAT_ID: &str = "NORAD_CAT_ID";
pub const INCLINATION: &str = "INCLINATION";
pub const ECCENTRICITY: &str = "ECCENTRICITY";
pub const ARG_OF_PERICENTER: &str = "ARG_OF_PERICENTER";
pub const RA_OF_ASC_NODE: &str = "RA_OF_ASC_NODE";
pub const ELEMENT_SET_NO: &str = "ELEMENT_SET_NO";
pub const EPHEMERIS_TYPE: &str = "EPHEMERIS_TYPE";
pub const MEAN_MOTION: &str = "MEAN_MOTION";
pub const MEAN_ANOMALY: &str = "MEAN_ANOMALY";
pub const MEAN_MOTION_DOT: &str = "MEAN_MOTION_DOT";
pub const MEAN_MOTION_DDOT: &str = "MEAN_MOTION_DDOT";
pub const REV_AT_EPOCH: &str = "REV_AT_EPOCH";
pub const BSTAR: &str = "BSTAR";
pub const CLASSIFICATION_TYPE: &str = "CLASSIFICATION_TYPE";

/// Every field an element set needs
pub const REQUIRED_FIELDS: [&str; 17] = [
    OBJECT_ID,
    OBJECT_NAME,
    EPOCH,
    NORAD_CAT_ID,
    INCLINATION,
    ECCENTRICITY,
    ARG_OF_PERICENTER,
    RA_OF_ASC_NODE,
    ELEMENT_SET_NO,
    EPHEMERIS_TYPE,
    MEAN_MOTION,
    MEAN_ANOMALY,
    MEAN_MOTION_DOT,
    MEAN_MOTION_DDOT,
    REV_AT_EPOCH,
    BSTAR,
    CLASSIFICATION_TYPE,
];

/// Borrowed view over one raw record that reports errors with its batch index
pub struct FieldReader<'a> {
    index: usize,
    fields: &'a RawFields,
}

impl<'a> FieldReader<'a> {
    pub fn new(index: usize, fields: &'a RawFields) -> Self {
        Self { index, fields }
    }

    fn error(&self, field: &'static str, reason: impl Into<String>) -> ParseError {
        ParseError {
            index: self.index,
            field,
            reason: reason.into(),
        }
    }

    fn value(&self, field: &'static str) -> Result<&'a Value, ParseError> {
        match self.fields.get(field) {
            Some(Value::Null) | None => Err(self.error(field, "missing")),
            Some(value) => Ok(value),
        }
    }

    pub fn string(&self, field: &'static str) -> Result<String, ParseError> {
        match self.value(field)? {
            Value::String(s) => Ok(s.clone()),
            // Some catalogs send designators as bare numbers
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.error(field, format!("expected a string, got {other}"))),
        }
    }

    pub fn float(&self, field: &'static str) -> Result<f64, ParseError> {
        let parsed = match self.value(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(self.error(field, "expected a finite number")),
        }
    }

    pub fn integer(&self, field: &'static str) -> Result<i64, ParseError> {
        let parsed = match self.value(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.error(field, "expected an integer"))
    }

    pub fn integer_as<T: TryFrom<i64>>(&self, field: &'static str) -> Result<T, ParseError> {
        let value = self.integer(field)?;
        T::try_from(value).map_err(|_| self.error(field, format!("{value} is out of range")))
    }

    pub fn epoch(&self, field: &'static str) -> Result<DateTime<Utc>, ParseError> {
        let text = self.string(field)?;
        parse_epoch(&text).ok_or_else(|| self.error(field, format!("unparsable instant {text:?}")))
    }
}

/// Parse a catalog epoch
///
/// Catalogs send naive ISO-8601 strings that are implicitly UTC
/// (`2024-01-01T00:00:00.000`); explicit RFC 3339 offsets are honoured too.
pub fn parse_epoch(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
