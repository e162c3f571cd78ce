pub mod schema;

use crate::config::AppConfig;
use crate::error::AppError;
use rusqlite::Connection;

/// Opens the app database and makes sure the app tables exist.
/// The photo tables are created by the photo store itself.
pub fn init_database(config: &AppConfig) -> Result<Connection, AppError> {
    let db_path = config.database_path();

    // Make sure the directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&db_path)?;
    log::debug!("Opened database at {:?}", db_path);

    schema::init_schema(&conn)?;

    Ok(conn)
}
