use std::sync::Arc;

use tokio::sync::watch;
use workbench_types::Profile;

use crate::{ApiError, WorkbenchClient};

/// Latest known profile, shared between the views that read it and the actions that
/// refresh it.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    tx: Arc<watch::Sender<Option<Profile>>>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn get(&self) -> Option<Profile> {
        self.tx.borrow().clone()
    }

    /// Receives every profile written after the call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Profile>> {
        self.tx.subscribe()
    }

    pub fn set(&self, profile: Profile) {
        self.tx.send_replace(Some(profile));
    }

    /// Fetch the profile and publish it. A failed fetch leaves the old value in place.
    pub async fn reload(&self, client: &WorkbenchClient) -> Result<Profile, ApiError> {
        let profile = client.get_profile().await?;
        tracing::debug!(username = %profile.username, "Profile reloaded");
        self.set(profile.clone());
        Ok(profile)
    }

    /// The cached profile, fetching it first if nothing has been loaded.
    pub async fn get_or_load(&self, client: &WorkbenchClient) -> Result<Profile, ApiError> {
        match self.get() {
            Some(profile) => Ok(profile),
            None => self.reload(client).await,
        }
    }
}
