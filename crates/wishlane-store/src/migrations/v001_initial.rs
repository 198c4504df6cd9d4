//! v001 -- Initial schema creation.
//!
//! Creates the two per-owner collections: `gifts` and `events`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Events
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS events (
    id              TEXT NOT NULL,            -- UUID v4
    owner_id        TEXT NOT NULL,            -- identity provider uid
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    image_url       TEXT,
    expiration_date TEXT,                     -- RFC-3339, display only
    created_at      TEXT NOT NULL,            -- RFC-3339, store-assigned

    PRIMARY KEY (owner_id, id)
);

CREATE INDEX IF NOT EXISTS idx_events_owner_created
    ON events(owner_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_events_id ON events(id);

-- ----------------------------------------------------------------
-- Gifts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS gifts (
    id          TEXT NOT NULL,                -- UUID v4
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    image_url   TEXT,
    event_id    TEXT,                         -- nullable, no FK: see delete policy
    created_at  TEXT NOT NULL,

    PRIMARY KEY (owner_id, id)
);

CREATE INDEX IF NOT EXISTS idx_gifts_owner_created
    ON gifts(owner_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_gifts_owner_event
    ON gifts(owner_id, event_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
