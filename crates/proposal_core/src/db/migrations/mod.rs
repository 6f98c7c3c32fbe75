//! Schema versioning for the key/value store.
//!
//! # Responsibility
//! - Bring a freshly opened database up to the `kv_entries` layout this
//!   build reads and writes.
//! - Refuse databases stamped by a newer build.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied step.
//! - Pending steps run in one transaction; a failed step leaves the stamp
//!   untouched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

/// `(version, sql)` pairs in ascending version order.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_kv_entries.sql"))];

/// Schema version written by this build.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS
        .iter()
        .map(|(version, _)| *version)
        .max()
        .unwrap_or(0)
}

/// Version stamped on `conn`; `0` for a database never touched by this crate.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Applies pending steps and returns the resulting version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let found = schema_version(conn)?;
    let target = latest_version();
    match found.cmp(&target) {
        Ordering::Greater => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: found,
                latest_supported: target,
            })
        }
        Ordering::Equal => return Ok(found),
        Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    for (version, sql) in SCHEMA_STEPS.iter().filter(|(version, _)| *version > found) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", *version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={target}");
    Ok(target)
}
