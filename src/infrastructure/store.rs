//! # Settings Stores
//!
//! `ConfigStore` backends. The JSON file store is the default: every setting lives in one object in
//! `data/settings.json`, rewritten through a temp file and rename so a crash never leaves a
//! half-written file behind. The memory store backs tests and throwaway runs. The Redis store
//! (feature `redis`) keeps one key per setting.

use crate::domain::config::{StoreBackend, SystemConfig};
use crate::domain::error::StoreError;
use crate::domain::traits::ConfigStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens `path`, creating parent directories. A missing file is an empty store.
    /// An unreadable file is moved aside and the store starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    tracing::warn!(
                        "Settings file {} is unreadable ({}), moving it to {}",
                        path.display(),
                        e,
                        aside.display()
                    );
                    tokio::fs::rename(&path, &aside).await?;
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    async fn get(&self, name: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        let previous = values.insert(name.to_string(), value);
        if let Err(e) = self.write_file(&values).await {
            // Keep the cache in line with the file.
            match previous {
                Some(previous) => values.insert(name.to_string(), previous),
                None => values.remove(name),
            };
            return Err(e);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: Value) -> Result<(), StoreError> {
        self.values.lock().await.insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(feature = "redis")]
pub struct RedisStore {
    manager: redis::aio::ConnectionManager,
    prefix: String,
}

#[cfg(feature = "redis")]
impl RedisStore {
    pub async fn connect(url: &str, prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url.to_string())
            .with_context(|| format!("failed to open redis client for {url}"))?;
        let manager = client
            .get_connection_manager()
            .await
            .context("failed to connect to redis")?;
        Ok(Self {
            manager,
            prefix: prefix.to_string(),
        })
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

#[cfg(feature = "redis")]
#[async_trait]
impl ConfigStore for RedisStore {
    async fn get(&self, name: &str) -> Result<Option<Value>, StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(self.key(name)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, name: &str, value: Value) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let payload = serde_json::to_string(&value)?;
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(self.key(name), payload).await?;
        Ok(())
    }
}

/// Builds the backend selected in `system.store`.
pub async fn build_store(system: &SystemConfig) -> Result<Arc<dyn ConfigStore>> {
    match system.store.backend {
        StoreBackend::File => {
            let path = system.settings_path();
            let store = JsonFileStore::open(&path)
                .await
                .with_context(|| format!("Failed to open settings file {}", path.display()))?;
            tracing::info!("Settings stored in {}", store.path().display());
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Settings are kept in memory only and will not survive a restart");
            Ok(Arc::new(MemoryStore::default()))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis => {
            let url = system
                .store
                .redis_url
                .as_deref()
                .context("system.store.redis_url is required for the redis backend")?;
            let store = RedisStore::connect(url, &system.store.key_prefix).await?;
            tracing::info!(url = %url, "Settings stored in Redis");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis => {
            anyhow::bail!("The redis settings backend needs a build with `--features redis`")
        }
    }
}
