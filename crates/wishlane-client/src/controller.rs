//! Screen-level state for the gifts / events assignment view.
//!
//! The controller owns two live queries whose snapshots back the displayed
//! lists, plus the tap-to-select state machine:
//!
//! ```text
//! Idle       --tap_gift(g)-->   Armed(g)
//! Armed(g)   --tap_gift(g)-->   Idle
//! Armed(g)   --tap_gift(g2)-->  Armed(g2)
//! Armed(g)   --tap_event(e)-->  Idle       (assigns g to e)
//! Idle       --tap_event(e)-->  Idle       (prompt, no write)
//! ```
//!
//! Drag and drop skips the selection entirely and writes straight from the
//! payload.  Local lists are never edited by hand; they only ever hold the
//! last snapshot delivered by the store.

use std::sync::{Arc, RwLock};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wishlane_shared::constants::SAMPLE_NUMBER_RANGE;
use wishlane_shared::{EventId, GiftId, OwnerId};
use wishlane_store::{EventDeletion, EventItem, Gift, NewEvent, NewGift};

use crate::assignment::AssignmentStore;
use crate::context::ClientContext;
use crate::error::{ClientError, Result};
use crate::notices::{Notice, NoticeSink};
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Idle,
    Armed(GiftId),
}

impl Selection {
    pub fn gift_id(&self) -> Option<GiftId> {
        match self {
            Selection::Idle => None,
            Selection::Armed(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    TapToSelect,
    DragAndDrop,
}

impl InteractionMode {
    pub fn for_drag_support(available: bool) -> Self {
        if available {
            InteractionMode::DragAndDrop
        } else {
            InteractionMode::TapToSelect
        }
    }
}

/// Carried from a gift to a drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub gift_id: GiftId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Assigned { gift_id: GiftId, event_id: EventId },
    PromptedSelectGift,
}

pub struct AssignmentController {
    store: AssignmentStore,
    owner: OwnerId,
    mode: InteractionMode,
    selection: Selection,
    gifts: Arc<RwLock<Vec<Gift>>>,
    events: Arc<RwLock<Vec<EventItem>>>,
    notices: Arc<dyn NoticeSink>,
    subscriptions: Vec<Subscription>,
}

impl AssignmentController {
    /// Start both live queries for `owner`.  Must be called from within a
    /// Tokio runtime.
    pub fn mount(
        store: AssignmentStore,
        owner: OwnerId,
        mode: InteractionMode,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let gifts = Arc::new(RwLock::new(Vec::new()));
        let events = Arc::new(RwLock::new(Vec::new()));

        let gift_list = Arc::clone(&gifts);
        let gifts_sub = store.subscribe_to_gifts(&owner, move |snapshot| {
            *gift_list.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
        });
        let event_list = Arc::clone(&events);
        let events_sub = store.subscribe_to_events(&owner, move |snapshot| {
            *event_list.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
        });

        info!(%owner, ?mode, "assignment screen mounted");

        Self {
            store,
            owner,
            mode,
            selection: Selection::Idle,
            gifts,
            events,
            notices,
            subscriptions: vec![gifts_sub, events_sub],
        }
    }

    /// Mount for the context's current owner, picking the interaction mode
    /// from the configured drag support.
    pub fn mount_for_context(ctx: ClientContext, notices: Arc<dyn NoticeSink>) -> Self {
        let owner = ctx.owner_id();
        let mode = InteractionMode::for_drag_support(ctx.config().drag_enabled);
        Self::mount(AssignmentStore::new(ctx), owner, mode, notices)
    }

    /// Release both live queries.  Writes already in flight are not
    /// cancelled.
    pub fn unmount(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
        info!(owner = %self.owner, "assignment screen unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Last gifts snapshot, newest first.
    pub fn gifts(&self) -> Vec<Gift> {
        self.gifts.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Last events snapshot, newest first.
    pub fn events(&self) -> Vec<EventItem> {
        self.events.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The event a gift is shown under, if it is assigned to one that is
    /// still listed.
    pub fn gift_event(&self, gift_id: GiftId) -> Option<EventItem> {
        let event_id = self
            .gifts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|g| g.id == gift_id)?
            .event_id?;
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Tap to select
    // -----------------------------------------------------------------------

    /// Toggle the armed gift.  Tapping a different gift re-arms.
    pub fn tap_gift(&mut self, gift_id: GiftId) -> Selection {
        self.selection = match self.selection {
            Selection::Armed(current) if current == gift_id => Selection::Idle,
            _ => Selection::Armed(gift_id),
        };
        debug!(%gift_id, selection = ?self.selection, "gift tapped");
        self.selection
    }

    /// Assign the armed gift to `event_id`.  With nothing armed, prompts the
    /// user and writes nothing.
    pub async fn tap_event(&mut self, event_id: EventId) -> Result<TapOutcome> {
        let gift_id = match self.selection {
            Selection::Idle => {
                self.notices.notify(Notice::select_gift_first());
                return Ok(TapOutcome::PromptedSelectGift);
            }
            Selection::Armed(gift_id) => gift_id,
        };

        match self
            .store
            .assign_gift_to_event(&self.owner, gift_id, Some(event_id))
            .await
        {
            Ok(()) => {
                self.selection = Selection::Idle;
                Ok(TapOutcome::Assigned { gift_id, event_id })
            }
            Err(e) => {
                if e.clears_selection() {
                    self.selection = Selection::Idle;
                }
                Err(self.report(e))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------------

    /// Begin a drag on a listed gift.  `None` in tap-to-select mode.
    pub fn start_drag(&self, gift_id: GiftId) -> Option<DragPayload> {
        if self.mode != InteractionMode::DragAndDrop {
            return None;
        }
        let listed = self
            .gifts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|g| g.id == gift_id);
        listed.then_some(DragPayload { gift_id })
    }

    pub async fn drop_on_event(&self, payload: DragPayload, event_id: EventId) -> Result<()> {
        self.store
            .assign_gift_to_event(&self.owner, payload.gift_id, Some(event_id))
            .await
            .map_err(|e| self.report(e))
    }

    // -----------------------------------------------------------------------
    // Other list actions
    // -----------------------------------------------------------------------

    pub async fn unassign(&self, gift_id: GiftId) -> Result<()> {
        self.store
            .assign_gift_to_event(&self.owner, gift_id, None)
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn create_gift(&self, draft: NewGift) -> Result<Gift> {
        self.store
            .create_gift(&self.owner, draft)
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn create_event(&self, draft: NewEvent) -> Result<EventItem> {
        self.store
            .create_event(&self.owner, draft)
            .await
            .map_err(|e| self.report(e))
    }

    /// Create one gift and one event with random sample names.
    pub async fn add_sample(&self) -> Result<(Gift, EventItem)> {
        let (gift_n, event_n) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(0..SAMPLE_NUMBER_RANGE),
                rng.gen_range(0..SAMPLE_NUMBER_RANGE),
            )
        };

        let gift = self
            .create_gift(NewGift::named(format!("Gift {gift_n}")))
            .await?;
        let event = self
            .create_event(NewEvent::named(format!("Event {event_n}")))
            .await?;
        Ok((gift, event))
    }

    pub async fn delete_gift(&mut self, gift_id: GiftId) -> Result<bool> {
        let deleted = self
            .store
            .delete_gift(&self.owner, gift_id)
            .await
            .map_err(|e| self.report(e))?;
        if self.selection == Selection::Armed(gift_id) {
            self.selection = Selection::Idle;
        }
        Ok(deleted)
    }

    pub async fn delete_event(&self, event_id: EventId) -> Result<EventDeletion> {
        self.store
            .delete_event(&self.owner, event_id)
            .await
            .map_err(|e| self.report(e))
    }

    fn report(&self, err: ClientError) -> ClientError {
        tracing::warn!(owner = %self.owner, error = %err, "assignment action failed");
        self.notices.notify(Notice::from_error(&err));
        err
    }
}

impl Drop for AssignmentController {
    fn drop(&mut self) {
        self.unmount();
    }
}
