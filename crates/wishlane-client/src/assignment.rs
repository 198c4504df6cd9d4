//! Owner-scoped access to the `gifts` and `events` collections.
//!
//! Store calls are synchronous, so each one runs on the blocking pool and
//! the caller only suspends until the store answers.  Live queries are
//! tokio tasks that re-read the collection whenever the change feed
//! reports a write for the same owner and collection.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use wishlane_shared::{EventId, GiftId, OwnerId};
use wishlane_store::{
    Collection, DocumentStore, EventDeletion, EventItem, EventPatch, Gift, GiftPatch, NewEvent,
    NewGift, StoreError,
};

use crate::context::ClientContext;
use crate::error::{ClientError, Result};
use crate::subscription::{lock_active, Subscription};

type Query<T> = fn(&dyn DocumentStore, &OwnerId) -> wishlane_store::Result<Vec<T>>;

#[derive(Clone)]
pub struct AssignmentStore {
    ctx: ClientContext,
}

impl AssignmentStore {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentStore) -> Result<T> + Send + 'static,
    {
        let documents = self.ctx.documents();
        tokio::task::spawn_blocking(move || op(documents.as_ref()))
            .await
            .map_err(|e| ClientError::Write(format!("store task failed: {e}")))?
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub async fn create_gift(&self, owner: &OwnerId, mut draft: NewGift) -> Result<Gift> {
        draft.name = required_name(&draft.name, "gift")?;
        let owner = owner.clone();
        let gift = self
            .blocking(move |db| Ok(db.create_gift(&owner, draft)?))
            .await?;
        debug!(gift_id = %gift.id, name = %gift.name, "created gift");
        Ok(gift)
    }

    pub async fn create_event(&self, owner: &OwnerId, mut draft: NewEvent) -> Result<EventItem> {
        draft.name = required_name(&draft.name, "event")?;
        let owner = owner.clone();
        let event = self
            .blocking(move |db| Ok(db.create_event(&owner, draft)?))
            .await?;
        debug!(event_id = %event.id, name = %event.name, "created event");
        Ok(event)
    }

    /// Set (or with `None`, clear) the event a gift is assigned to.  Only the
    /// `event_id` field is written.  The target event must belong to `owner`;
    /// the store checks that in the same step as the write.
    pub async fn assign_gift_to_event(
        &self,
        owner: &OwnerId,
        gift_id: GiftId,
        event_id: Option<EventId>,
    ) -> Result<()> {
        let owner = owner.clone();
        self.blocking(move |db| {
            db.assign_gift(&owner, gift_id, event_id)
                .map_err(|e| gift_error(e, gift_id))
        })
        .await?;

        match event_id {
            Some(event_id) => info!(%gift_id, %event_id, "assigned gift"),
            None => info!(%gift_id, "unassigned gift"),
        }
        Ok(())
    }

    pub async fn update_gift(
        &self,
        owner: &OwnerId,
        id: GiftId,
        mut patch: GiftPatch,
    ) -> Result<()> {
        if let Some(name) = patch.name.as_deref() {
            patch.name = Some(required_name(name, "gift")?);
        }
        let owner = owner.clone();
        self.blocking(move |db| db.update_gift(&owner, id, &patch).map_err(|e| gift_error(e, id)))
            .await
    }

    pub async fn update_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        mut patch: EventPatch,
    ) -> Result<()> {
        if let Some(name) = patch.name.as_deref() {
            patch.name = Some(required_name(name, "event")?);
        }
        let owner = owner.clone();
        self.blocking(move |db| {
            db.update_event(&owner, id, &patch).map_err(|e| match e {
                StoreError::NotFound => ClientError::NotFound(format!("event {id}")),
                other => other.into(),
            })
        })
        .await
    }

    /// Returns `false` when the gift was already gone.
    pub async fn delete_gift(&self, owner: &OwnerId, id: GiftId) -> Result<bool> {
        let owner = owner.clone();
        self.blocking(move |db| Ok(db.delete_gift(&owner, id)?)).await
    }

    /// Delete an event, treating assigned gifts according to the configured
    /// [`EventDeletePolicy`](wishlane_store::EventDeletePolicy).
    pub async fn delete_event(&self, owner: &OwnerId, id: EventId) -> Result<EventDeletion> {
        let owner = owner.clone();
        let policy = self.ctx.config().event_delete_policy;
        let outcome = self
            .blocking(move |db| Ok(db.delete_event(&owner, id, policy)?))
            .await?;
        if outcome.cleared_gifts > 0 {
            debug!(event_id = %id, cleared = outcome.cleared_gifts, "cleared gift assignments");
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_gift(&self, owner: &OwnerId, id: GiftId) -> Result<Option<Gift>> {
        let owner = owner.clone();
        self.blocking(move |db| Ok(db.get_gift(&owner, id)?)).await
    }

    pub async fn get_event(&self, owner: &OwnerId, id: EventId) -> Result<Option<EventItem>> {
        let owner = owner.clone();
        self.blocking(move |db| Ok(db.get_event(&owner, id)?)).await
    }

    /// Newest first.
    pub async fn get_gifts(&self, owner: &OwnerId) -> Result<Vec<Gift>> {
        let owner = owner.clone();
        self.blocking(move |db| Ok(db.list_gifts(&owner)?)).await
    }

    /// Newest first.
    pub async fn get_events(&self, owner: &OwnerId) -> Result<Vec<EventItem>> {
        let owner = owner.clone();
        self.blocking(move |db| Ok(db.list_events(&owner)?)).await
    }

    // -----------------------------------------------------------------------
    // Live queries
    // -----------------------------------------------------------------------

    /// Deliver the owner's gifts, newest first, now and after every change.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe_to_gifts<F>(&self, owner: &OwnerId, on_update: F) -> Subscription
    where
        F: FnMut(Vec<Gift>) + Send + 'static,
    {
        self.subscribe(owner, Collection::Gifts, |db, owner| db.list_gifts(owner), on_update)
    }

    /// Deliver the owner's events, newest first, now and after every change.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe_to_events<F>(&self, owner: &OwnerId, on_update: F) -> Subscription
    where
        F: FnMut(Vec<EventItem>) + Send + 'static,
    {
        self.subscribe(owner, Collection::Events, |db, owner| db.list_events(owner), on_update)
    }

    fn subscribe<T, F>(
        &self,
        owner: &OwnerId,
        collection: Collection,
        query: Query<T>,
        mut on_update: F,
    ) -> Subscription
    where
        T: Send + 'static,
        F: FnMut(Vec<T>) + Send + 'static,
    {
        let documents = self.ctx.documents();
        // subscribe before the first read so no write falls in between
        let mut changes = documents.watch();
        let active = Arc::new(Mutex::new(true));

        let task_owner = owner.clone();
        let task_active = Arc::clone(&active);
        let task = tokio::spawn(async move {
            let owner = task_owner;
            if !deliver_snapshot(&documents, &owner, query, &task_active, &mut on_update).await {
                return;
            }

            loop {
                match changes.recv().await {
                    Ok(notice) if notice.affects(&owner, collection) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%owner, %collection, skipped, "change feed lagged, resyncing");
                    }
                    Err(RecvError::Closed) => break,
                }

                if !deliver_snapshot(&documents, &owner, query, &task_active, &mut on_update)
                    .await
                {
                    break;
                }
            }
            debug!(%owner, %collection, "live query finished");
        });

        debug!(%owner, %collection, "subscribed");
        Subscription::new(collection, owner.clone(), active, task.abort_handle())
    }
}

/// Read one snapshot and hand it to `on_update`.  Returns `false` once the
/// subscription has been released.
async fn deliver_snapshot<T, F>(
    documents: &Arc<dyn DocumentStore>,
    owner: &OwnerId,
    query: Query<T>,
    active: &Mutex<bool>,
    on_update: &mut F,
) -> bool
where
    T: Send + 'static,
    F: FnMut(Vec<T>),
{
    let documents = Arc::clone(documents);
    let read_owner = owner.clone();
    let snapshot =
        tokio::task::spawn_blocking(move || query(documents.as_ref(), &read_owner)).await;

    // held through the callback; `unsubscribe` takes it too
    let active = lock_active(active);
    if !*active {
        return false;
    }

    match snapshot {
        Ok(Ok(items)) => on_update(items),
        // keep the last delivered snapshot; the next change retries
        Ok(Err(e)) => warn!(%owner, error = %e, "snapshot read failed"),
        Err(e) => warn!(%owner, error = %e, "snapshot task failed"),
    }
    true
}

fn required_name(name: &str, kind: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Invalid(format!("{kind} name must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn gift_error(e: StoreError, id: GiftId) -> ClientError {
    match e {
        StoreError::NotFound => ClientError::NotFound(format!("gift {id}")),
        other => other.into(),
    }
}
