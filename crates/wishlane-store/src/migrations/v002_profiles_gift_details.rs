use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Purchase details on gifts
ALTER TABLE gifts ADD COLUMN price TEXT NOT NULL DEFAULT '';
ALTER TABLE gifts ADD COLUMN source_json TEXT;

-- One preference document per owner
CREATE TABLE IF NOT EXISTS profiles (
    owner_id   TEXT PRIMARY KEY NOT NULL,
    json       TEXT NOT NULL,               -- serialized UserProfile
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
