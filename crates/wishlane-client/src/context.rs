//! Explicitly constructed client context.
//!
//! A [`ClientContext`] bundles the document store, identity provider, object
//! storage and configuration.  It is built once and handed to every service
//! constructor, so tests can swap in their own implementations.

use std::sync::Arc;

use tracing::info;
use wishlane_shared::OwnerId;
use wishlane_store::{Database, DocumentStore, FsObjectStore, ObjectStorage, SqliteDocumentStore};

use crate::config::ClientConfig;
use crate::identity::IdentityProvider;

#[derive(Clone)]
pub struct ClientContext {
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    objects: Arc<dyn ObjectStorage>,
    config: Arc<ClientConfig>,
}

impl ClientContext {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        objects: Arc<dyn ObjectStorage>,
        config: ClientConfig,
    ) -> Self {
        Self {
            documents,
            identity,
            objects,
            config: Arc::new(config),
        }
    }

    /// Open the SQLite document store and the on-disk object store described
    /// by `config`.
    pub fn open(
        config: ClientConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> wishlane_store::Result<Self> {
        let db = match &config.database_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        let documents = SqliteDocumentStore::new(db, config.change_feed_capacity)?;

        let objects = FsObjectStore::new(
            config.object_storage_path.clone(),
            config.resolved_object_base_url(),
            config.max_upload_size,
        )?;

        info!(
            drag_enabled = config.drag_enabled,
            event_delete_policy = ?config.event_delete_policy,
            "client context opened"
        );

        Ok(Self::new(
            Arc::new(documents),
            identity,
            Arc::new(objects),
            config,
        ))
    }

    pub fn documents(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.documents)
    }

    pub fn objects(&self) -> Arc<dyn ObjectStorage> {
        Arc::clone(&self.objects)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The signed-in owner, or the configured demo owner when signed out.
    pub fn owner_id(&self) -> OwnerId {
        self.identity
            .current_owner()
            .unwrap_or_else(|| OwnerId::new(self.config.demo_owner_id.clone()))
    }
}
