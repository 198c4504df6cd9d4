#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc};
use wishlane_client::{
    AssignmentController, AssignmentStore, ClientConfig, ClientContext, InteractionMode, Notice,
    NoticeSink, Session,
};
use wishlane_shared::{EventId, GiftId, OwnerId};
use wishlane_store::{
    ChangeNotice, DocumentStore, EventDeletePolicy, EventDeletion, EventItem, EventPatch,
    FsObjectStore, Gift, GiftPatch, NewEvent, NewGift, ProfileUpdate, SqliteDocumentStore,
    StoreError, UserProfile,
};

/// SQLite store that counts write attempts and can be told to fail them.
pub struct RecordingDocuments {
    inner: SqliteDocumentStore,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    delete_target_before_assign: AtomicBool,
}

impl RecordingDocuments {
    pub fn new() -> Self {
        Self {
            inner: SqliteDocumentStore::in_memory().unwrap(),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            delete_target_before_assign: AtomicBool::new(false),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delete the target event right before each assignment reaches the store.
    pub fn delete_target_before_assign(&self, on: bool) {
        self.delete_target_before_assign.store(on, Ordering::SeqCst);
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&SqliteDocumentStore) -> wishlane_store::Result<T>,
    ) -> wishlane_store::Result<T> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("backend unreachable".into()));
        }
        op(&self.inner)
    }
}

impl DocumentStore for RecordingDocuments {
    fn create_gift(&self, owner: &OwnerId, draft: NewGift) -> wishlane_store::Result<Gift> {
        self.write(|db| db.create_gift(owner, draft))
    }

    fn create_event(&self, owner: &OwnerId, draft: NewEvent) -> wishlane_store::Result<EventItem> {
        self.write(|db| db.create_event(owner, draft))
    }

    fn get_gift(&self, owner: &OwnerId, id: GiftId) -> wishlane_store::Result<Option<Gift>> {
        self.inner.get_gift(owner, id)
    }

    fn get_event(&self, owner: &OwnerId, id: EventId) -> wishlane_store::Result<Option<EventItem>> {
        self.inner.get_event(owner, id)
    }

    fn list_gifts(&self, owner: &OwnerId) -> wishlane_store::Result<Vec<Gift>> {
        self.inner.list_gifts(owner)
    }

    fn list_events(&self, owner: &OwnerId) -> wishlane_store::Result<Vec<EventItem>> {
        self.inner.list_events(owner)
    }

    fn assign_gift(
        &self,
        owner: &OwnerId,
        id: GiftId,
        event_id: Option<EventId>,
    ) -> wishlane_store::Result<()> {
        if let Some(event_id) = event_id {
            if self.delete_target_before_assign.load(Ordering::SeqCst) {
                // another screen deletes the event just as this assignment starts
                self.inner
                    .delete_event(owner, event_id, EventDeletePolicy::ClearReferences)?;
            }
        }
        self.write(|db| db.assign_gift(owner, id, event_id))
    }

    fn update_gift(
        &self,
        owner: &OwnerId,
        id: GiftId,
        patch: &GiftPatch,
    ) -> wishlane_store::Result<()> {
        self.write(|db| db.update_gift(owner, id, patch))
    }

    fn update_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        patch: &EventPatch,
    ) -> wishlane_store::Result<()> {
        self.write(|db| db.update_event(owner, id, patch))
    }

    fn delete_gift(&self, owner: &OwnerId, id: GiftId) -> wishlane_store::Result<bool> {
        self.write(|db| db.delete_gift(owner, id))
    }

    fn delete_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        policy: EventDeletePolicy,
    ) -> wishlane_store::Result<EventDeletion> {
        self.write(|db| db.delete_event(owner, id, policy))
    }

    fn get_profile(&self, owner: &OwnerId) -> wishlane_store::Result<Option<UserProfile>> {
        self.inner.get_profile(owner)
    }

    fn merge_profile(
        &self,
        owner: &OwnerId,
        update: ProfileUpdate,
    ) -> wishlane_store::Result<UserProfile> {
        self.write(|db| db.merge_profile(owner, update))
    }

    fn watch(&self) -> broadcast::Receiver<ChangeNotice> {
        self.inner.watch()
    }
}

pub struct Harness {
    pub documents: Arc<RecordingDocuments>,
    pub session: Arc<Session>,
    pub ctx: ClientContext,
    pub store: AssignmentStore,
    _objects_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let objects = FsObjectStore::new(
            dir.path().to_path_buf(),
            "https://objects.test",
            config.max_upload_size,
        )
        .unwrap();
        let documents = Arc::new(RecordingDocuments::new());
        let session = Arc::new(Session::new());
        let ctx = ClientContext::new(
            documents.clone(),
            session.clone(),
            Arc::new(objects),
            config,
        );
        let store = AssignmentStore::new(ctx.clone());
        Self {
            documents,
            session,
            ctx,
            store,
            _objects_dir: dir,
        }
    }

    pub fn mount(
        &self,
        owner: &OwnerId,
        mode: InteractionMode,
    ) -> (AssignmentController, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notices: Arc<dyn NoticeSink> = Arc::new(tx);
        let controller =
            AssignmentController::mount(self.store.clone(), owner.clone(), mode, notices);
        (controller, rx)
    }
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        out.push(notice);
    }
    out
}

/// Poll `cond` until it holds, failing the test after five seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
