use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension};

const WELCOME_SEEN_KEY: &str = "welcome_seen";

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, AppError> {
    let value = conn
        .query_row(
            "SELECT value FROM app_settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        params![key, value],
    )?;

    Ok(())
}

/// Removes every setting; part of the nuclear reset
pub fn clear_settings(conn: &Connection) -> Result<usize, AppError> {
    let rows = conn.execute("DELETE FROM app_settings", [])?;
    Ok(rows)
}

pub fn has_seen_welcome(conn: &Connection) -> Result<bool, AppError> {
    Ok(get_setting(conn, WELCOME_SEEN_KEY)?.as_deref() == Some("true"))
}

pub fn mark_welcome_seen(conn: &Connection) -> Result<(), AppError> {
    set_setting(conn, WELCOME_SEEN_KEY, "true")
}
