//! Error taxonomy for the ingestion pipeline
//!
//! Each stage has its own error type. `TrackerError` folds them together for
//! callers that drive a whole run.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::propagation::Sgp4Failure;

/// Retrieving the raw catalog failed. Fatal to the run.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("catalog request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The catalog answered with a non-success status
    #[error("catalog at {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was not a JSON array of field maps
    #[error("catalog body could not be decoded: {0}")]
    Decode(String),

    /// A local snapshot could not be read
    #[error("catalog file {path} could not be read: {message}")]
    Io { path: String, message: String },
}

/// A raw record is missing a field or carries an unusable value
#[derive(Error, Debug, Clone, PartialEq)]
#[error("record {index}: field {field}: {reason}")]
pub struct ParseError {
    /// Position of the record in the fetched batch
    pub index: usize,
    pub field: &'static str,
    pub reason: String,
}

/// The orbit model reported a non-zero status for one element set
#[derive(Error, Debug, Clone, PartialEq)]
#[error("SGP4 failed for NORAD {norad_cat_id} at epoch {epoch}: {code}")]
pub struct PropagationError {
    pub code: Sgp4Failure,
    pub norad_cat_id: u32,
    pub epoch: DateTime<Utc>,
}

/// Failure while turning raw field maps into typed records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

/// Storage connection, transaction or decoding failure
#[derive(Error, Debug)]
pub enum StorageError {
    /// Connection or statement failure; the enclosing transaction is rolled back
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
}

/// Any failure of an ingestion run
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type StorageResult<T> = Result<T, StorageError>;
