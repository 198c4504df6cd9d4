//! Preference profile: load, merge-save, avatar upload, form helpers.
//!
//! Nothing in the assignment workflow reads the profile.

use tracing::{debug, warn};
use wishlane_shared::constants::AVATAR_PREFIX;
use wishlane_shared::OwnerId;
use wishlane_store::{ProfileUpdate, UserProfile};

use crate::context::ClientContext;
use crate::error::{ClientError, Result};

pub const INTEREST_OPTIONS: &[&str] = &[
    "activity",
    "reading",
    "cooking",
    "travel",
    "music",
    "art",
    "gardening",
    "tech",
    "gaming",
];

pub const RELAX_OPTIONS: &[&str] = &[
    "Spa day",
    "Watching live sport",
    "Extreme sports",
    "Coffee in a nice place",
    "Reading",
    "Meditation",
];

pub const GIFT_TYPE_OPTIONS: &[&str] = &[
    "experience",
    "physical",
    "consumable",
    "subscription",
    "handmade",
    "charity",
];

pub const PRICE_RANGES: &[&str] = &["$", "$$", "$$$"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLoad {
    pub profile: UserProfile,
    /// The profile did not exist and was just created.
    pub first_time: bool,
}

#[derive(Clone)]
pub struct ProfileService {
    ctx: ClientContext,
}

impl ProfileService {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    /// Read the owner's profile, creating an empty one if absent.
    pub async fn load(&self, owner: &OwnerId) -> Result<ProfileLoad> {
        let documents = self.ctx.documents();
        let owner = owner.clone();
        let loaded = tokio::task::spawn_blocking(move || -> Result<ProfileLoad> {
            if let Some(profile) = documents.get_profile(&owner)? {
                return Ok(ProfileLoad {
                    profile,
                    first_time: false,
                });
            }
            let profile = documents.merge_profile(&owner, ProfileUpdate::default())?;
            debug!(%owner, "created empty profile");
            Ok(ProfileLoad {
                profile,
                first_time: true,
            })
        })
        .await
        .map_err(|e| ClientError::Write(format!("profile task failed: {e}")))??;
        Ok(loaded)
    }

    /// Merge the provided fields into the stored profile.
    pub async fn save(&self, owner: &OwnerId, update: ProfileUpdate) -> Result<UserProfile> {
        let documents = self.ctx.documents();
        let owner = owner.clone();
        tokio::task::spawn_blocking(move || -> Result<UserProfile> {
            Ok(documents.merge_profile(&owner, update)?)
        })
        .await
        .map_err(|e| ClientError::Write(format!("profile task failed: {e}")))?
    }

    /// Store a new avatar under `avatars/<owner>.<extension>` and point the
    /// profile's photo at it.
    pub async fn upload_photo(
        &self,
        owner: &OwnerId,
        data: Vec<u8>,
        extension: &str,
    ) -> Result<UserProfile> {
        let path = avatar_path(owner, extension)?;
        let objects = self.ctx.objects();
        let url = tokio::task::spawn_blocking(move || objects.put(&path, &data))
            .await
            .map_err(|e| ClientError::Write(format!("upload task failed: {e}")))??;
        debug!(%owner, %url, "uploaded avatar");

        self.save(
            owner,
            ProfileUpdate {
                photo_url: Some(url),
                ..ProfileUpdate::default()
            },
        )
        .await
    }

    /// Fetch the avatar bytes behind `profile.photo_url`.  Failures are
    /// logged and yield `None`.
    pub async fn fetch_avatar(&self, profile: &UserProfile) -> Option<Vec<u8>> {
        if profile.photo_url.is_empty() {
            return None;
        }
        let objects = self.ctx.objects();
        let Some(path) = objects.path_for_url(&profile.photo_url) else {
            warn!(url = %profile.photo_url, "avatar is not served by this object store");
            return None;
        };

        match tokio::task::spawn_blocking(move || objects.get(&path)).await {
            Ok(Ok(bytes)) => Some(bytes),
            Ok(Err(e)) => {
                warn!(url = %profile.photo_url, error = %e, "avatar fetch failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "avatar fetch task failed");
                None
            }
        }
    }
}

fn avatar_path(owner: &OwnerId, extension: &str) -> Result<String> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ClientError::Invalid(format!(
            "unsupported image extension: {extension:?}"
        )));
    }
    let name: String = owner
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    Ok(format!("{AVATAR_PREFIX}/{name}.{ext}"))
}

/// Split a comma-separated form field, dropping blanks.
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

/// Add `option` if absent, remove it if present.  Options outside
/// `catalogue` are ignored and `false` is returned.
pub fn toggle_option(selected: &mut Vec<String>, catalogue: &[&str], option: &str) -> bool {
    if !catalogue.contains(&option) {
        return false;
    }
    if let Some(pos) = selected.iter().position(|s| s == option) {
        selected.remove(pos);
    } else {
        selected.push(option.to_string());
    }
    true
}
