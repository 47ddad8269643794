//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    -- unix epoch milliseconds
    expires_at INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_analyses_expires ON analyses(expires_at);
"#;
