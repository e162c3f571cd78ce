//! Durable CRUD over [`PhotoRecord`]s.
//!
//! The repository enforces nothing beyond id uniqueness: capacity and
//! duplicate policy belong to [`crate::lifecycle`].

use crate::error::PhotoStoreError;
use crate::fingerprint::Fingerprint;
use crate::models::{PhotoBlob, PhotoRecord, PhotoStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, filename, mime_type, data, fingerprint, status, created_at";

fn record_from_row(row: &Row) -> rusqlite::Result<PhotoRecord> {
    let id_str: String = row.get(0)?;
    let fingerprint_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let created_at: DateTime<Utc> = row.get(6)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    let fingerprint = Fingerprint::from_hex(&fingerprint_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("invalid fingerprint {}", fingerprint_str).into(),
        )
    })?;
    let status = PhotoStatus::from_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("invalid status {}", status_str).into(),
        )
    })?;

    Ok(PhotoRecord {
        id,
        filename: row.get(1)?,
        blob: PhotoBlob {
            mime_type: row.get(2)?,
            data: row.get(3)?,
        },
        fingerprint,
        status,
        created_at,
    })
}

/// Inserts a record or overwrites the one with the same id.
/// An overwrite keeps the row's original position.
pub fn put(conn: &Connection, record: &PhotoRecord) -> Result<(), PhotoStoreError> {
    log::debug!(
        "put {} ({}, {})",
        record.id,
        record.filename,
        record.status.as_str()
    );

    conn.execute(
        "INSERT INTO wallet_photos (id, filename, mime_type, data, fingerprint, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            filename = excluded.filename,
            mime_type = excluded.mime_type,
            data = excluded.data,
            fingerprint = excluded.fingerprint,
            status = excluded.status,
            created_at = excluded.created_at",
        params![
            record.id.to_string(),
            &record.filename,
            &record.blob.mime_type,
            &record.blob.data,
            record.fingerprint.as_str(),
            record.status.as_str(),
            record.created_at,
        ],
    )?;

    Ok(())
}

/// Loads a record; absence is `Ok(None)`
pub fn get(conn: &Connection, id: &Uuid) -> Result<Option<PhotoRecord>, PhotoStoreError> {
    let record = conn
        .query_row(
            &format!("SELECT {} FROM wallet_photos WHERE id = ?1", RECORD_COLUMNS),
            params![id.to_string()],
            record_from_row,
        )
        .optional()?;

    Ok(record)
}

/// All records with the given status. Callers must not rely on the order.
pub fn list_by_status(
    conn: &Connection,
    status: PhotoStatus,
) -> Result<Vec<PhotoRecord>, PhotoStoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM wallet_photos WHERE status = ?1 ORDER BY rowid",
        RECORD_COLUMNS
    ))?;

    let records = stmt
        .query_map(params![status.as_str()], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

fn id_from_row(row: &Row) -> rusqlite::Result<Uuid> {
    let id_str: String = row.get(0)?;
    Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Ids of every record regardless of status
pub fn list_ids(conn: &Connection) -> Result<Vec<Uuid>, PhotoStoreError> {
    let mut stmt = conn.prepare("SELECT id FROM wallet_photos ORDER BY rowid")?;

    let ids = stmt
        .query_map([], id_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids)
}

/// Ids of the records with the given status, without loading their blobs
pub fn list_ids_by_status(
    conn: &Connection,
    status: PhotoStatus,
) -> Result<Vec<Uuid>, PhotoStoreError> {
    let mut stmt = conn.prepare("SELECT id FROM wallet_photos WHERE status = ?1 ORDER BY rowid")?;

    let ids = stmt
        .query_map(params![status.as_str()], id_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids)
}

pub fn count_by_status(conn: &Connection, status: PhotoStatus) -> Result<usize, PhotoStoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM wallet_photos WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;

    Ok(count as usize)
}

/// Id of some record with this status and fingerprint, if any
pub fn find_by_fingerprint(
    conn: &Connection,
    status: PhotoStatus,
    fingerprint: &Fingerprint,
) -> Result<Option<Uuid>, PhotoStoreError> {
    let id = conn
        .query_row(
            "SELECT id FROM wallet_photos WHERE status = ?1 AND fingerprint = ?2
             ORDER BY rowid LIMIT 1",
            params![status.as_str(), fingerprint.as_str()],
            id_from_row,
        )
        .optional()?;

    Ok(id)
}

/// Changes a record's status in a single statement
pub fn set_status(
    conn: &Connection,
    id: &Uuid,
    status: PhotoStatus,
) -> Result<(), PhotoStoreError> {
    let rows = conn.execute(
        "UPDATE wallet_photos SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;

    if rows == 0 {
        return Err(PhotoStoreError::NotFound(*id));
    }

    log::debug!("{} is now {}", id, status.as_str());
    Ok(())
}

/// Removes a record permanently. Returns whether a row was removed;
/// removing an absent id is not an error.
pub fn delete(conn: &Connection, id: &Uuid) -> Result<bool, PhotoStoreError> {
    let rows = conn.execute(
        "DELETE FROM wallet_photos WHERE id = ?1",
        params![id.to_string()],
    )?;

    Ok(rows > 0)
}

/// Removes every record of every status
pub fn clear(conn: &Connection) -> Result<usize, PhotoStoreError> {
    let rows = conn.execute("DELETE FROM wallet_photos", [])?;
    log::info!("Cleared {} photo records", rows);
    Ok(rows)
}
