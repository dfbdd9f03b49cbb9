//! Insert-or-skip bulk writer
//!
//! `save_or_skip` keeps an append-only, composite-keyed table free of
//! duplicates. Rows are never updated: a record whose identity is already
//! stored is skipped regardless of its other fields.

use std::collections::HashSet;

use rusqlite::{ffi, Connection, Transaction, TransactionBehavior};

use super::{Record, RecordKey, Storage};
use crate::error::StorageResult;

/// Outcome of one `save_or_skip` call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// Rows newly written
    pub inserted: usize,
    /// Records whose identity was already stored, or repeated within the batch
    pub skipped: usize,
    /// Records another writer stored between our check and our insert
    pub conflicts: usize,
}

impl WriteReport {
    /// Add another report's counts to this one
    pub fn absorb(&mut self, other: WriteReport) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.conflicts += other.conflicts;
    }
}

/// Persist the records whose identity is not stored yet
///
/// One transaction spans the existence check and the inserts, so either
/// every new record is written or none is. Calling this twice with the same
/// batch inserts nothing the second time.
pub fn save_or_skip<T: Record>(records: &[T], storage: &mut Storage) -> StorageResult<WriteReport> {
    if records.is_empty() {
        return Ok(WriteReport::default());
    }

    // IMMEDIATE takes the write lock up front so the check and the inserts
    // see the same snapshot.
    let mut tx = storage
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing = existing_keys(&tx, records)?;

    let mut report = WriteReport::default();
    let mut seen: HashSet<RecordKey> = HashSet::with_capacity(records.len());
    let mut fresh: Vec<&T> = Vec::with_capacity(records.len());
    for record in records {
        let key = record.key();
        if existing.contains(&key) || !seen.insert(key) {
            report.skipped += 1;
        } else {
            fresh.push(record);
        }
    }

    let (inserted, conflicts) = insert_fresh(&mut tx, &fresh)?;
    tx.commit()?;

    report.inserted = inserted;
    report.conflicts = conflicts;
    log::debug!(
        "{}: {} inserted, {} skipped, {} conflicts",
        T::TABLE,
        report.inserted,
        report.skipped,
        report.conflicts
    );
    Ok(report)
}

/// Stored identities among those of `records`, in a single query
///
/// All candidate keys travel as one JSON array parameter, so the statement
/// count does not depend on the batch size.
pub(crate) fn existing_keys<T: Record>(
    conn: &Connection,
    records: &[T],
) -> rusqlite::Result<HashSet<RecordKey>> {
    let keys: Vec<RecordKey> = records.iter().map(Record::key).collect();
    let candidates = serde_json::to_string(&keys)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let mut stmt = conn.prepare(&existence_query::<T>())?;
    let rows = stmt.query_map([candidates], |row| {
        (0..T::KEY_COLUMNS.len())
            .map(|i| row.get(i))
            .collect::<rusqlite::Result<RecordKey>>()
    })?;
    rows.collect()
}

fn existence_query<T: Record>() -> String {
    let columns = T::KEY_COLUMNS.join(", ");
    let extracted = (0..T::KEY_COLUMNS.len())
        .map(|i| format!("json_extract(value, '$[{i}]')"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {columns} FROM {table} WHERE ({columns}) IN (SELECT {extracted} FROM json_each(?1))",
        table = T::TABLE
    )
}

/// Insert records one savepoint each; identity collisions are benign
///
/// `save_or_skip` holds an IMMEDIATE write lock from the existence check to
/// the commit, so writers sharing one SQLite file are serialized and a
/// collision cannot happen there. The conflict branch only fires for rows
/// that skipped that check, such as a caller inserting straight through here.
/// Only that record's savepoint is rolled back, including any rows it owns.
/// Every other failure aborts the enclosing transaction.
pub(crate) fn insert_fresh<T: Record>(
    tx: &mut Transaction<'_>,
    fresh: &[&T],
) -> rusqlite::Result<(usize, usize)> {
    let mut inserted = 0;
    let mut conflicts = 0;

    for record in fresh {
        let sp = tx.savepoint()?;
        match record.insert(&sp) {
            Ok(()) => {
                sp.commit()?;
                inserted += 1;
            }
            Err(err) if is_identity_conflict(&err) => {
                log::debug!(
                    "{} {:?} already written by another writer",
                    T::TABLE,
                    record.key()
                );
                drop(sp);
                conflicts += 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok((inserted, conflicts))
}

fn is_identity_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
