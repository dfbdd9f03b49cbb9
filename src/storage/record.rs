//! Static table descriptors for persistable records
//!
//! Every persisted type declares its table, its columns and the subset of
//! columns forming its identity. The schema's `PRIMARY KEY` clause and the
//! writer's existence check are both generated from `KEY_COLUMNS`.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection};
use serde::Serialize;

use super::format_epoch;
use crate::data::{Satellite, SpaceObject, Vector3D};

/// One component of a composite identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Integer(i64),
    Text(String),
}

impl FromSql for KeyPart {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(i) => Ok(Self::Integer(i)),
            ValueRef::Text(_) => value.as_str().map(|s| Self::Text(s.to_owned())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Identity tuple, ordered like `Record::KEY_COLUMNS`
pub type RecordKey = Vec<KeyPart>;

/// A type stored as one row (plus owned rows) of its own table
pub trait Record {
    const TABLE: &'static str;
    /// `(name, declaration)` pairs
    const COLUMNS: &'static [(&'static str, &'static str)];
    /// Columns forming the composite identity
    const KEY_COLUMNS: &'static [&'static str];

    fn key(&self) -> RecordKey;

    /// Insert this record and anything it owns
    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;
}

/// `CREATE TABLE` statement derived from a record descriptor
pub fn create_table_sql<T: Record>() -> String {
    let mut lines: Vec<String> = T::COLUMNS
        .iter()
        .map(|(name, decl)| format!("    {name} {decl}"))
        .collect();
    lines.push(format!("    PRIMARY KEY ({})", T::KEY_COLUMNS.join(", ")));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        T::TABLE,
        lines.join(",\n")
    )
}

impl Record for Satellite {
    const TABLE: &'static str = "satellite";
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("object_name", "TEXT NOT NULL"),
        ("object_id", "TEXT NOT NULL"),
        ("epoch", "TEXT NOT NULL"),
        ("mean_motion", "REAL NOT NULL"),
        ("eccentricity", "REAL NOT NULL"),
        ("inclination", "REAL NOT NULL"),
        ("ra_of_asc_node", "REAL NOT NULL"),
        ("arg_of_pericenter", "REAL NOT NULL"),
        ("mean_anomaly", "REAL NOT NULL"),
        ("ephemeris_type", "INTEGER NOT NULL"),
        ("classification_type", "TEXT NOT NULL"),
        ("norad_cat_id", "INTEGER NOT NULL"),
        ("element_set_no", "INTEGER NOT NULL"),
        ("rev_at_epoch", "INTEGER NOT NULL"),
        ("bstar", "REAL NOT NULL"),
        ("mean_motion_dot", "REAL NOT NULL"),
        ("mean_motion_ddot", "REAL NOT NULL"),
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["norad_cat_id", "epoch"];

    fn key(&self) -> RecordKey {
        vec![
            KeyPart::Integer(i64::from(self.norad_cat_id)),
            KeyPart::Text(format_epoch(&self.epoch)),
        ]
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO satellite (
                object_name, object_id, epoch, mean_motion, eccentricity, inclination,
                ra_of_asc_node, arg_of_pericenter, mean_anomaly, ephemeris_type,
                classification_type, norad_cat_id, element_set_no, rev_at_epoch,
                bstar, mean_motion_dot, mean_motion_ddot
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )?;
        stmt.execute(params![
            self.object_name,
            self.object_id,
            format_epoch(&self.epoch),
            self.mean_motion,
            self.eccentricity,
            self.inclination,
            self.ra_of_asc_node,
            self.arg_of_pericenter,
            self.mean_anomaly,
            self.ephemeris_type,
            self.classification_type,
            self.norad_cat_id,
            self.element_set_no,
            self.rev_at_epoch,
            self.bstar,
            self.mean_motion_dot,
            self.mean_motion_ddot,
        ])?;
        Ok(())
    }
}

impl Record for SpaceObject {
    const TABLE: &'static str = "space_object";
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("id", "INTEGER NOT NULL"),
        ("epoch", "TEXT NOT NULL"),
        ("name", "TEXT NOT NULL"),
        ("position_id", "INTEGER NOT NULL REFERENCES vector3d(id)"),
        ("velocity_id", "INTEGER NOT NULL REFERENCES vector3d(id)"),
        ("source", "TEXT NOT NULL"),
        ("propagated_at", "TEXT NOT NULL"),
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["id", "epoch"];

    fn key(&self) -> RecordKey {
        vec![
            KeyPart::Integer(i64::from(self.id)),
            KeyPart::Text(format_epoch(&self.epoch)),
        ]
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let position_id = insert_vector(conn, &self.position)?;
        let velocity_id = insert_vector(conn, &self.velocity)?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO space_object (id, epoch, name, position_id, velocity_id, source, propagated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        stmt.execute(params![
            self.id,
            format_epoch(&self.epoch),
            self.name,
            position_id,
            velocity_id,
            self.source.as_str(),
            format_epoch(&self.propagated_at),
        ])?;
        Ok(())
    }
}

/// Insert one vector row and return its surrogate id
fn insert_vector(conn: &Connection, vector: &Vector3D) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached("INSERT INTO vector3d (x, y, z) VALUES (?1, ?2, ?3)")?;
    stmt.execute(params![vector.x, vector.y, vector.z])?;
    Ok(conn.last_insert_rowid())
}
