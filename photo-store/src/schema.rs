use rusqlite::{Connection, Result};

/// Initialize the photo store schema
pub fn init_photo_store_schema(conn: &Connection) -> Result<()> {
    // Schema version table for the photo store
    conn.execute(
        "CREATE TABLE IF NOT EXISTS photo_store_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM photo_store_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_photo_store_schema_v1(conn)?;
        conn.execute(
            "INSERT INTO photo_store_schema_version (version) VALUES (1)",
            [],
        )?;
    }

    Ok(())
}

/// Create photo store schema version 1
fn create_photo_store_schema_v1(conn: &Connection) -> Result<()> {
    // Blob and metadata live in the same row; nothing is kept on the filesystem
    conn.execute(
        "CREATE TABLE IF NOT EXISTS wallet_photos (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            data BLOB NOT NULL,
            fingerprint TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'archived')),
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // Duplicate lookups and active counts both filter on status first
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_wallet_photos_status_fingerprint
         ON wallet_photos(status, fingerprint)",
        [],
    )?;

    Ok(())
}
