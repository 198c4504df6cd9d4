//! CRUD operations for [`EventItem`] documents.

use rusqlite::params;
use wishlane_shared::{EventId, OwnerId};

use crate::database::{column_timestamp, column_uuid, format_timestamp, not_found, Database};
use crate::error::{Result, StoreError};
use crate::models::{EventDeletePolicy, EventDeletion, EventItem, EventPatch};

const EVENT_COLUMNS: &str =
    "id, owner_id, name, description, image_url, expiration_date, created_at";

impl Database {
    pub fn insert_event(&self, event: &EventItem) -> Result<()> {
        self.conn().execute(
            "INSERT INTO events (id, owner_id, name, description, image_url, expiration_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id.to_string(),
                event.owner_id.as_str(),
                event.name,
                event.description,
                event.image_url,
                event.expiration_date.as_ref().map(format_timestamp),
                format_timestamp(&event.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_event(&self, owner: &OwnerId, id: EventId) -> Result<EventItem> {
        self.conn()
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = ?1 AND id = ?2"),
                params![owner.as_str(), id.to_string()],
                row_to_event,
            )
            .map_err(not_found)
    }

    pub fn list_events(&self, owner: &OwnerId) -> Result<Vec<EventItem>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {EVENT_COLUMNS}
             FROM events
             WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![owner.as_str()], row_to_event)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Look up which owner holds an event id, across all collections.
    pub fn event_owner(&self, id: EventId) -> Result<Option<OwnerId>> {
        let owner: Option<String> = self
            .conn()
            .query_row(
                "SELECT owner_id FROM events WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(owner.map(OwnerId::new))
    }

    pub fn update_event(&self, owner: &OwnerId, id: EventId, patch: &EventPatch) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE events SET
                 name            = COALESCE(?1, name),
                 description     = COALESCE(?2, description),
                 image_url       = CASE WHEN ?3 IS NULL THEN image_url ELSE NULLIF(?3, '') END,
                 expiration_date = COALESCE(?4, expiration_date)
             WHERE owner_id = ?5 AND id = ?6",
            params![
                patch.name,
                patch.description,
                patch.image_url,
                patch.expiration_date.as_ref().map(format_timestamp),
                owner.as_str(),
                id.to_string(),
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Delete an event, applying `policy` to gifts that reference it.
    /// Both steps run in one transaction.
    pub fn delete_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        policy: EventDeletePolicy,
    ) -> Result<EventDeletion> {
        let tx = self.conn().unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM events WHERE owner_id = ?1 AND id = ?2",
            params![owner.as_str(), id.to_string()],
        )? > 0;

        // same connection, so this runs inside `tx`
        let cleared_gifts = match policy {
            EventDeletePolicy::ClearReferences => self.clear_event_references(owner, id)?,
            EventDeletePolicy::KeepReferences => 0,
        };

        tx.commit()?;

        Ok(EventDeletion {
            deleted,
            cleared_gifts,
        })
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventItem> {
    let id_str: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let name: String = row.get(2)?;
    let description: String = row.get(3)?;
    let image_url: Option<String> = row.get(4)?;
    let expiration_str: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;

    let expiration_date = expiration_str
        .map(|s| column_timestamp(5, &s))
        .transpose()?;

    Ok(EventItem {
        id: EventId(column_uuid(0, &id_str)?),
        owner_id: OwnerId::new(owner),
        name,
        description,
        image_url,
        expiration_date,
        created_at: column_timestamp(6, &created_str)?,
    })
}
