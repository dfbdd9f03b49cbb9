//! Paged reads for the serving API
//!
//! Rows come back in insertion order (`rowid`). Owned vectors are joined in
//! so a returned record needs no further queries.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{parse_stored_epoch, Storage};
use crate::data::{Satellite, Source, Vector3D};
use crate::error::StorageResult;

/// A vector as stored, with its surrogate id
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredVector {
    pub id: i64,
    #[serde(flatten)]
    pub vector: Vector3D,
}

/// A persisted state vector with its owned vectors resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSpaceObject {
    pub epoch: DateTime<Utc>,
    pub id: u32,
    pub name: String,
    pub position_id: i64,
    pub position: StoredVector,
    pub velocity_id: i64,
    pub velocity: StoredVector,
    pub source: Source,
    pub propagated_at: DateTime<Utc>,
}

/// Zero-based page of element sets
pub fn load_satellites(storage: &Storage, page: u32, limit: u32) -> StorageResult<Vec<Satellite>> {
    let mut stmt = storage.connection().prepare_cached(
        "SELECT object_name, object_id, epoch, mean_motion, eccentricity, inclination,
                ra_of_asc_node, arg_of_pericenter, mean_anomaly, ephemeris_type,
                classification_type, norad_cat_id, element_set_no, rev_at_epoch,
                bstar, mean_motion_dot, mean_motion_ddot
         FROM satellite
         ORDER BY rowid
         LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map([i64::from(limit), offset(page, limit)], |row| {
        Ok(Satellite {
            object_name: row.get(0)?,
            object_id: row.get(1)?,
            epoch: epoch_column(row, 2)?,
            mean_motion: row.get(3)?,
            eccentricity: row.get(4)?,
            inclination: row.get(5)?,
            ra_of_asc_node: row.get(6)?,
            arg_of_pericenter: row.get(7)?,
            mean_anomaly: row.get(8)?,
            ephemeris_type: row.get(9)?,
            classification_type: row.get(10)?,
            norad_cat_id: row.get(11)?,
            element_set_no: row.get(12)?,
            rev_at_epoch: row.get(13)?,
            bstar: row.get(14)?,
            mean_motion_dot: row.get(15)?,
            mean_motion_ddot: row.get(16)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

/// Zero-based page of state vectors
pub fn load_space_objects(
    storage: &Storage,
    page: u32,
    limit: u32,
) -> StorageResult<Vec<StoredSpaceObject>> {
    let mut stmt = storage.connection().prepare_cached(
        "SELECT s.epoch, s.id, s.name, s.source, s.propagated_at,
                p.id, p.x, p.y, p.z,
                v.id, v.x, v.y, v.z
         FROM space_object s
         JOIN vector3d p ON p.id = s.position_id
         JOIN vector3d v ON v.id = s.velocity_id
         ORDER BY s.rowid
         LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map([i64::from(limit), offset(page, limit)], |row| {
        let position = vector_columns(row, 5)?;
        let velocity = vector_columns(row, 9)?;
        Ok(StoredSpaceObject {
            epoch: epoch_column(row, 0)?,
            id: row.get(1)?,
            name: row.get(2)?,
            source: source_column(row, 3)?,
            propagated_at: epoch_column(row, 4)?,
            position_id: position.id,
            position,
            velocity_id: velocity.id,
            velocity,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

fn offset(page: u32, limit: u32) -> i64 {
    i64::from(page).saturating_mul(i64::from(limit))
}

fn vector_columns(row: &Row<'_>, first: usize) -> rusqlite::Result<StoredVector> {
    Ok(StoredVector {
        id: row.get(first)?,
        vector: Vector3D::new(row.get(first + 1)?, row.get(first + 2)?, row.get(first + 3)?),
    })
}

fn epoch_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_stored_epoch(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unreadable epoch {text:?}").into(),
        )
    })
}

fn source_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Source> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
