//! CRUD operations for [`Gift`] documents.

use rusqlite::params;
use wishlane_shared::{EventId, GiftId, OwnerId};

use crate::database::{column_timestamp, column_uuid, format_timestamp, not_found, Database};
use crate::error::{Result, StoreError};
use crate::models::{Gift, GiftPatch, GiftSource};

const GIFT_COLUMNS: &str =
    "id, owner_id, name, description, image_url, price, source_json, created_at, event_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new gift.  The caller supplies identity and `created_at`.
    pub fn insert_gift(&self, gift: &Gift) -> Result<()> {
        let source_json = gift.source.as_ref().map(serde_json::to_string).transpose()?;

        self.conn().execute(
            "INSERT INTO gifts (id, owner_id, name, description, image_url, price, source_json, created_at, event_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                gift.id.to_string(),
                gift.owner_id.as_str(),
                gift.name,
                gift.description,
                gift.image_url,
                gift.price,
                source_json,
                format_timestamp(&gift.created_at),
                gift.event_id.map(|e| e.to_string()),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single gift from `owner`'s collection.
    pub fn get_gift(&self, owner: &OwnerId, id: GiftId) -> Result<Gift> {
        self.conn()
            .query_row(
                &format!("SELECT {GIFT_COLUMNS} FROM gifts WHERE owner_id = ?1 AND id = ?2"),
                params![owner.as_str(), id.to_string()],
                row_to_gift,
            )
            .map_err(not_found)
    }

    /// List `owner`'s gifts, newest first.
    pub fn list_gifts(&self, owner: &OwnerId) -> Result<Vec<Gift>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GIFT_COLUMNS}
             FROM gifts
             WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![owner.as_str()], row_to_gift)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Set (or clear) the owning event.  Touches only the `event_id` column.
    pub fn set_gift_event(
        &self,
        owner: &OwnerId,
        id: GiftId,
        event_id: Option<EventId>,
    ) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE gifts SET event_id = ?1 WHERE owner_id = ?2 AND id = ?3",
            params![
                event_id.map(|e| e.to_string()),
                owner.as_str(),
                id.to_string()
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Point a gift at `event_id` (or clear it with `None`).  The event must
    /// exist and belong to `owner`; the check and the write share one
    /// transaction.
    pub fn assign_gift(
        &self,
        owner: &OwnerId,
        id: GiftId,
        event_id: Option<EventId>,
    ) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;

        if let Some(event_id) = event_id {
            match self.event_owner(event_id)? {
                None => return Err(StoreError::EventMissing(event_id)),
                Some(holder) if &holder != owner => {
                    return Err(StoreError::ForeignEvent(event_id))
                }
                Some(_) => {}
            }
        }
        // same connection, so this runs inside `tx`
        self.set_gift_event(owner, id, event_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Apply a partial update.  Columns not named in the patch keep the value
    /// they have at statement time.
    pub fn update_gift(&self, owner: &OwnerId, id: GiftId, patch: &GiftPatch) -> Result<()> {
        let source_json = patch.source.as_ref().map(serde_json::to_string).transpose()?;

        let affected = self.conn().execute(
            "UPDATE gifts SET
                 name        = COALESCE(?1, name),
                 description = COALESCE(?2, description),
                 image_url   = CASE WHEN ?3 IS NULL THEN image_url ELSE NULLIF(?3, '') END,
                 price       = COALESCE(?4, price),
                 source_json = COALESCE(?5, source_json)
             WHERE owner_id = ?6 AND id = ?7",
            params![
                patch.name,
                patch.description,
                patch.image_url,
                patch.price,
                source_json,
                owner.as_str(),
                id.to_string(),
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Un-assign every gift of `owner` that points at `event_id`.
    /// Returns the number of gifts changed.
    pub fn clear_event_references(&self, owner: &OwnerId, event_id: EventId) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE gifts SET event_id = NULL WHERE owner_id = ?1 AND event_id = ?2",
            params![owner.as_str(), event_id.to_string()],
        )?;
        Ok(affected)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a gift.  Returns `true` if a row was deleted.
    pub fn delete_gift(&self, owner: &OwnerId, id: GiftId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM gifts WHERE owner_id = ?1 AND id = ?2",
            params![owner.as_str(), id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Gift`].
fn row_to_gift(row: &rusqlite::Row<'_>) -> rusqlite::Result<Gift> {
    let id_str: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let name: String = row.get(2)?;
    let description: String = row.get(3)?;
    let image_url: Option<String> = row.get(4)?;
    let price: String = row.get(5)?;
    let source_json: Option<String> = row.get(6)?;
    let created_str: String = row.get(7)?;
    let event_str: Option<String> = row.get(8)?;

    let source = source_json
        .map(|json| serde_json::from_str::<GiftSource>(&json))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let event_id = event_str
        .map(|s| column_uuid(8, &s))
        .transpose()?
        .map(EventId);

    Ok(Gift {
        id: GiftId(column_uuid(0, &id_str)?),
        owner_id: OwnerId::new(owner),
        name,
        description,
        image_url,
        price,
        source,
        created_at: column_timestamp(7, &created_str)?,
        event_id,
    })
}
