pub mod migrations;
pub mod queries;

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::errors::Result;

/// Shared handle to the local state database.
pub type Db = Arc<Mutex<Connection>>;

/// Opens the local client state database and brings its schema up to date.
pub fn init_db(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;

    if path != ":memory:" {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    }

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

pub fn open_shared(path: &str) -> Result<Db> {
    Ok(Arc::new(Mutex::new(init_db(path)?)))
}

pub fn lock(db: &Db) -> MutexGuard<'_, Connection> {
    db.lock().unwrap_or_else(|e| e.into_inner())
}
