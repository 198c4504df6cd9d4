//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration for local use.

use std::path::PathBuf;

use wishlane_shared::constants::{DEFAULT_CHANGE_FEED_CAPACITY, DEMO_OWNER_ID, MAX_UPLOAD_SIZE};
use wishlane_store::EventDeletePolicy;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SQLite database file.
    /// Env: `WISHLANE_DB_PATH`
    /// Default: platform data directory (`wishlane.db`).
    pub database_path: Option<PathBuf>,

    /// Directory backing object storage (uploaded images).
    /// Env: `WISHLANE_OBJECTS_PATH`
    /// Default: `./objects`
    pub object_storage_path: PathBuf,

    /// Base URL prefixed to object paths.
    /// Env: `WISHLANE_OBJECTS_URL`
    /// Default: `file://` URL of the storage directory.
    pub object_base_url: Option<String>,

    /// Maximum upload size in bytes.
    /// Env: `WISHLANE_MAX_UPLOAD_BYTES`
    pub max_upload_size: usize,

    /// Owner identity used while nobody is signed in.
    /// Env: `WISHLANE_DEMO_OWNER`
    /// Default: `demo-user`
    pub demo_owner_id: String,

    /// Whether the runtime offers native drag gestures.
    /// Env: `WISHLANE_DRAG` (true/false)
    /// Default: `false` (tap-to-select)
    pub drag_enabled: bool,

    /// What deleting an event does to gifts assigned to it.
    /// Env: `WISHLANE_EVENT_DELETE` (`clear` / `keep`)
    /// Default: `clear`
    pub event_delete_policy: EventDeletePolicy,

    /// Buffered change notices per live subscription before it resyncs.
    /// Env: `WISHLANE_FEED_CAPACITY`
    pub change_feed_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            object_storage_path: PathBuf::from("./objects"),
            object_base_url: None,
            max_upload_size: MAX_UPLOAD_SIZE,
            demo_owner_id: DEMO_OWNER_ID.to_string(),
            drag_enabled: false,
            event_delete_policy: EventDeletePolicy::default(),
            change_feed_capacity: DEFAULT_CHANGE_FEED_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = var("WISHLANE_DB_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = var("WISHLANE_OBJECTS_PATH").filter(|p| !p.is_empty()) {
            config.object_storage_path = PathBuf::from(path);
        }

        if let Some(url) = var("WISHLANE_OBJECTS_URL").filter(|u| !u.is_empty()) {
            config.object_base_url = Some(url);
        }

        if let Some(val) = var("WISHLANE_MAX_UPLOAD_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid WISHLANE_MAX_UPLOAD_BYTES, using default"),
            }
        }

        if let Some(owner) = var("WISHLANE_DEMO_OWNER").filter(|o| !o.trim().is_empty()) {
            config.demo_owner_id = owner.trim().to_string();
        }

        if let Some(val) = var("WISHLANE_DRAG") {
            config.drag_enabled = val != "false" && val != "0";
        }

        if let Some(val) = var("WISHLANE_EVENT_DELETE") {
            match val.parse::<EventDeletePolicy>() {
                Ok(policy) => config.event_delete_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Invalid WISHLANE_EVENT_DELETE, using default"),
            }
        }

        if let Some(val) = var("WISHLANE_FEED_CAPACITY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.change_feed_capacity = n,
                _ => tracing::warn!(value = %val, "Invalid WISHLANE_FEED_CAPACITY, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Base URL for object storage, defaulting to a `file://` URL.
    pub fn resolved_object_base_url(&self) -> String {
        match &self.object_base_url {
            Some(url) => url.clone(),
            None => {
                let dir = if self.object_storage_path.is_absolute() {
                    self.object_storage_path.clone()
                } else {
                    std::env::current_dir()
                        .map(|cwd| cwd.join(&self.object_storage_path))
                        .unwrap_or_else(|_| self.object_storage_path.clone())
                };
                format!("file://{}", dir.display())
            }
        }
    }
}
