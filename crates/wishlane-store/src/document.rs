//! The document-store seam.
//!
//! [`DocumentStore`] is the contract the client layer programs against:
//! per-owner `gifts` / `events` collections, a profile document per owner,
//! and a change feed for live queries.  [`SqliteDocumentStore`] is the
//! shipped implementation; tests substitute their own.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::broadcast;
use wishlane_shared::{EventId, GiftId, OwnerId};

use crate::changes::{ChangeFeed, ChangeNotice, Collection};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    EventDeletePolicy, EventDeletion, EventItem, EventPatch, Gift, GiftPatch, NewEvent, NewGift,
    ProfileUpdate, UserProfile,
};

pub trait DocumentStore: Send + Sync {
    /// Allocate an id and a store timestamp, then insert.
    fn create_gift(&self, owner: &OwnerId, draft: NewGift) -> Result<Gift>;
    fn create_event(&self, owner: &OwnerId, draft: NewEvent) -> Result<EventItem>;

    fn get_gift(&self, owner: &OwnerId, id: GiftId) -> Result<Option<Gift>>;
    fn get_event(&self, owner: &OwnerId, id: EventId) -> Result<Option<EventItem>>;
    /// Newest first.
    fn list_gifts(&self, owner: &OwnerId) -> Result<Vec<Gift>>;
    /// Newest first.
    fn list_events(&self, owner: &OwnerId) -> Result<Vec<EventItem>>;

    /// Single-field update of `event_id`, atomic with the check that the
    /// target event exists ([`StoreError::EventMissing`]) and belongs to
    /// `owner` ([`StoreError::ForeignEvent`]).  [`StoreError::NotFound`] if
    /// the gift does not exist under `owner`.
    fn assign_gift(&self, owner: &OwnerId, id: GiftId, event_id: Option<EventId>) -> Result<()>;
    fn update_gift(&self, owner: &OwnerId, id: GiftId, patch: &GiftPatch) -> Result<()>;
    fn update_event(&self, owner: &OwnerId, id: EventId, patch: &EventPatch) -> Result<()>;

    fn delete_gift(&self, owner: &OwnerId, id: GiftId) -> Result<bool>;
    fn delete_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        policy: EventDeletePolicy,
    ) -> Result<EventDeletion>;

    fn get_profile(&self, owner: &OwnerId) -> Result<Option<UserProfile>>;
    /// Merge `update` into the stored profile, creating it if absent.
    fn merge_profile(&self, owner: &OwnerId, update: ProfileUpdate) -> Result<UserProfile>;

    /// Subscribe to change notices for every subsequent write.
    fn watch(&self) -> broadcast::Receiver<ChangeNotice>;
}

// ---------------------------------------------------------------------------
// Store clock
// ---------------------------------------------------------------------------

/// Authoritative timestamp source: strictly increasing even if the wall
/// clock steps backwards.
#[derive(Debug, Default)]
struct StoreClock {
    last: Option<DateTime<Utc>>,
}

impl StoreClock {
    fn seeded(last: Option<DateTime<Utc>>) -> Self {
        Self { last }
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.tick_from(Utc::now())
    }

    fn tick_from(&mut self, wall: DateTime<Utc>) -> DateTime<Utc> {
        // stored with microsecond precision
        let wall = wall.trunc_subsecs(6);
        let next = match self.last {
            Some(last) if wall <= last => last + chrono::Duration::microseconds(1),
            _ => wall,
        };
        self.last = Some(next);
        next
    }
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

struct Inner {
    db: Database,
    clock: StoreClock,
}

/// [`DocumentStore`] over a single SQLite connection.  The connection mutex
/// is the serialization point for concurrent writes.
pub struct SqliteDocumentStore {
    inner: Mutex<Inner>,
    changes: ChangeFeed,
}

impl SqliteDocumentStore {
    pub fn new(db: Database, feed_capacity: usize) -> Result<Self> {
        let clock = StoreClock::seeded(db.latest_created_at()?);

        tracing::info!(
            path = ?db.path(),
            feed_capacity,
            "document store ready"
        );

        Ok(Self {
            inner: Mutex::new(Inner { db, clock }),
            changes: ChangeFeed::new(feed_capacity),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(
            Database::open_in_memory()?,
            wishlane_shared::constants::DEFAULT_CHANGE_FEED_CAPACITY,
        )
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn create_gift(&self, owner: &OwnerId, draft: NewGift) -> Result<Gift> {
        let gift = {
            let mut inner = self.lock()?;
            let gift = Gift {
                id: GiftId::new(),
                owner_id: owner.clone(),
                name: draft.name,
                description: draft.description.unwrap_or_default(),
                image_url: draft.image_url.filter(|u| !u.is_empty()),
                price: draft.price.unwrap_or_default(),
                source: draft.source,
                created_at: inner.clock.tick(),
                event_id: None,
            };
            inner.db.insert_gift(&gift)?;
            gift
        };

        tracing::debug!(%owner, gift_id = %gift.id, "gift created");
        self.changes.publish(owner, Collection::Gifts);
        Ok(gift)
    }

    fn create_event(&self, owner: &OwnerId, draft: NewEvent) -> Result<EventItem> {
        let event = {
            let mut inner = self.lock()?;
            let event = EventItem {
                id: EventId::new(),
                owner_id: owner.clone(),
                name: draft.name,
                description: draft.description.unwrap_or_default(),
                image_url: draft.image_url.filter(|u| !u.is_empty()),
                expiration_date: draft.expiration_date.map(|d| d.trunc_subsecs(6)),
                created_at: inner.clock.tick(),
            };
            inner.db.insert_event(&event)?;
            event
        };

        tracing::debug!(%owner, event_id = %event.id, "event created");
        self.changes.publish(owner, Collection::Events);
        Ok(event)
    }

    fn get_gift(&self, owner: &OwnerId, id: GiftId) -> Result<Option<Gift>> {
        match self.lock()?.db.get_gift(owner, id) {
            Ok(gift) => Ok(Some(gift)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_event(&self, owner: &OwnerId, id: EventId) -> Result<Option<EventItem>> {
        match self.lock()?.db.get_event(owner, id) {
            Ok(event) => Ok(Some(event)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list_gifts(&self, owner: &OwnerId) -> Result<Vec<Gift>> {
        self.lock()?.db.list_gifts(owner)
    }

    fn list_events(&self, owner: &OwnerId) -> Result<Vec<EventItem>> {
        self.lock()?.db.list_events(owner)
    }

    fn assign_gift(&self, owner: &OwnerId, id: GiftId, event_id: Option<EventId>) -> Result<()> {
        self.lock()?.db.assign_gift(owner, id, event_id)?;
        self.changes.publish(owner, Collection::Gifts);
        Ok(())
    }

    fn update_gift(&self, owner: &OwnerId, id: GiftId, patch: &GiftPatch) -> Result<()> {
        self.lock()?.db.update_gift(owner, id, patch)?;
        self.changes.publish(owner, Collection::Gifts);
        Ok(())
    }

    fn update_event(&self, owner: &OwnerId, id: EventId, patch: &EventPatch) -> Result<()> {
        self.lock()?.db.update_event(owner, id, patch)?;
        self.changes.publish(owner, Collection::Events);
        Ok(())
    }

    fn delete_gift(&self, owner: &OwnerId, id: GiftId) -> Result<bool> {
        let deleted = self.lock()?.db.delete_gift(owner, id)?;
        if deleted {
            self.changes.publish(owner, Collection::Gifts);
        }
        Ok(deleted)
    }

    fn delete_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        policy: EventDeletePolicy,
    ) -> Result<EventDeletion> {
        let outcome = self.lock()?.db.delete_event(owner, id, policy)?;
        if outcome.deleted {
            self.changes.publish(owner, Collection::Events);
        }
        if outcome.cleared_gifts > 0 {
            self.changes.publish(owner, Collection::Gifts);
        }
        Ok(outcome)
    }

    fn get_profile(&self, owner: &OwnerId) -> Result<Option<UserProfile>> {
        self.lock()?.db.get_profile(owner)
    }

    fn merge_profile(&self, owner: &OwnerId, update: ProfileUpdate) -> Result<UserProfile> {
        let inner = self.lock()?;
        let mut profile = inner.db.get_profile(owner)?.unwrap_or_default();
        update.apply_to(&mut profile);
        inner.db.put_profile(owner, &profile, Utc::now())
    }

    fn watch(&self) -> broadcast::Receiver<ChangeNotice> {
        self.changes.subscribe()
    }
}
