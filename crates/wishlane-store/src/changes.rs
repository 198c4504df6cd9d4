//! Change notifications for live queries.
//!
//! Every successful write publishes a [`ChangeNotice`] naming the owner and
//! collection it touched.  Live subscribers listen on the feed and re-read the
//! affected collection, so they always receive full snapshots rather than
//! deltas.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use wishlane_shared::constants::{EVENTS_COLLECTION, GIFTS_COLLECTION};
use wishlane_shared::OwnerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Gifts,
    Events,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Gifts => GIFTS_COLLECTION,
            Collection::Events => EVENTS_COLLECTION,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub owner: OwnerId,
    pub collection: Collection,
}

impl ChangeNotice {
    pub fn affects(&self, owner: &OwnerId, collection: Collection) -> bool {
        self.collection == collection && &self.owner == owner
    }
}

/// Broadcast fan-out of [`ChangeNotice`]s.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeNotice>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, owner: &OwnerId, collection: Collection) {
        let notice = ChangeNotice {
            owner: owner.clone(),
            collection,
        };
        // no receivers is normal when nothing is mounted
        if self.tx.send(notice).is_err() {
            tracing::trace!(%owner, %collection, "change published with no listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.tx.subscribe()
    }
}
