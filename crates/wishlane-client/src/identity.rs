//! Signed-in identity.
//!
//! Authentication itself (email/password, Google OAuth) happens in the
//! external identity provider; its result is recorded in a [`Session`], which
//! the rest of the client reads through [`IdentityProvider`].

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;
use wishlane_shared::OwnerId;

pub trait IdentityProvider: Send + Sync {
    /// The signed-in owner, `None` when signed out.
    fn current_owner(&self) -> Option<OwnerId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthProvider {
    EmailPassword,
    Google,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub provider: AuthProvider,
}

impl AuthUser {
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.uid.clone())
    }
}

/// In-process record of the current sign-in.
#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<AuthUser>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user: AuthUser) {
        info!(uid = %user.uid, provider = ?user.provider, "signed in");
        let mut guard = self.user.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(user);
    }

    /// Returns the user that was signed in, if any.
    pub fn sign_out(&self) -> Option<AuthUser> {
        let mut guard = self.user.write().unwrap_or_else(|e| e.into_inner());
        let previous = guard.take();
        if let Some(ref user) = previous {
            info!(uid = %user.uid, "signed out");
        }
        previous
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.user
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl IdentityProvider for Session {
    fn current_owner(&self) -> Option<OwnerId> {
        self.current_user().map(|u| u.owner_id())
    }
}
