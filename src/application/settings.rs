//! # Settings
//!
//! Names of the persisted settings and typed access on top of any [`ConfigStore`].

use crate::domain::error::StoreError;
use crate::domain::traits::ConfigStore;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const REPLY_SETTINGS: &str = "reply_settings";
pub const AFK_GROUP_ACTIVE: &str = "afk_group_active";
pub const AFK_DM_ACTIVE: &str = "afk_dm_active";
pub const AFK_MESSAGE: &str = "afk_message";
pub const AFK_SUSPENDED_GROUPS: &str = "afk_suspended_groups";
pub const AFK_SUSPENDED_DMS: &str = "afk_suspended_dms";

/// Typed `get(name, default)` / `set(name, value)`.
#[async_trait]
pub trait ConfigStoreExt: ConfigStore {
    /// Reads `name`, falling back to `default` when it is missing or fails to decode.
    /// Store failures are returned so the caller can decide whether to keep going.
    async fn get_or<T>(&self, name: &str, default: T) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(name).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(decoded) => Ok(decoded),
                Err(e) => {
                    tracing::warn!("Setting `{}` has an unexpected shape, using default: {}", name, e);
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    async fn put<T>(&self, name: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.set(name, serde_json::to_value(value)?).await
    }
}

impl<S: ConfigStore + ?Sized> ConfigStoreExt for S {}
