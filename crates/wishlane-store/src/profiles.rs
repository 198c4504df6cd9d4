use chrono::{DateTime, Utc};
use rusqlite::params;
use wishlane_shared::OwnerId;

use crate::database::{format_timestamp, parse_timestamp, Database};
use crate::error::Result;
use crate::models::UserProfile;

impl Database {
    /// Read the profile document, `None` if the owner has never saved one.
    pub fn get_profile(&self, owner: &OwnerId) -> Result<Option<UserProfile>> {
        let row: Option<(String, String, String)> = self
            .conn()
            .query_row(
                "SELECT json, created_at, updated_at FROM profiles WHERE owner_id = ?1",
                params![owner.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some((json, created, updated)) = row else {
            return Ok(None);
        };

        let mut profile: UserProfile = serde_json::from_str(&json)?;
        // the columns are authoritative for the bookkeeping timestamps
        profile.created_at = Some(parse_timestamp(&created)?);
        profile.updated_at = Some(parse_timestamp(&updated)?);
        Ok(Some(profile))
    }

    /// Write the whole profile document.  `created_at` is kept from the first
    /// write; `updated_at` is set to `now`.
    pub fn put_profile(
        &self,
        owner: &OwnerId,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<UserProfile> {
        let now_str = format_timestamp(&now);
        let json = serde_json::to_string(profile)?;

        self.conn().execute(
            "INSERT INTO profiles (owner_id, json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(owner_id) DO UPDATE SET
                 json = excluded.json,
                 updated_at = excluded.updated_at",
            params![owner.as_str(), json, now_str],
        )?;

        Ok(self.get_profile(owner)?.unwrap_or_else(|| profile.clone()))
    }
}
