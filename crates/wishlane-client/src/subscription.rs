use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;
use wishlane_shared::OwnerId;
use wishlane_store::Collection;

/// Shared with the live-query task, which holds the lock while a callback
/// runs.
pub(crate) type ActiveFlag = Arc<Mutex<bool>>;

pub(crate) fn lock_active(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a live query.  Delivery stops on [`unsubscribe`](Self::unsubscribe)
/// or when the handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    collection: Collection,
    owner: OwnerId,
    active: ActiveFlag,
    task: AbortHandle,
}

impl Subscription {
    pub(crate) fn new(
        collection: Collection,
        owner: OwnerId,
        active: ActiveFlag,
        task: AbortHandle,
    ) -> Self {
        Self {
            collection,
            owner,
            active,
            task,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Stop delivery and release the feed.  Waits for a callback that is
    /// already running, so none runs after this returns.  Calling it again is
    /// a no-op.
    pub fn unsubscribe(&self) {
        let mut active = lock_active(&self.active);
        if *active {
            *active = false;
            self.task.abort();
            tracing::debug!(owner = %self.owner, collection = %self.collection, "unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        *lock_active(&self.active)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
