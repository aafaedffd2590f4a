//! v001 -- Initial schema creation.
//!
//! A single ordered key/value table. BLOB keys compare with memcmp, so a
//! range scan over `[prefix, successor(prefix))` walks one namespace in key
//! order.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key   BLOB PRIMARY KEY NOT NULL,   -- namespace prefix || encoded key
    value BLOB NOT NULL                -- bincode record, counter, or empty marker
) WITHOUT ROWID;
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
