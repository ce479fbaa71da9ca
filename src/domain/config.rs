//! # Configuration
//!
//! Manages the loading and parsing of the agent's configuration file (`config.yaml`).
//! Defines the structs for platform credentials, system settings and automation tunables.

use crate::domain::types::ChatId;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    pub system: SystemConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.automation.validate()?;
        Ok(config)
    }
}

/// Configuration for the connected chat platform.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Process-level settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    /// The only account allowed to issue commands.
    pub owner: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,
    #[serde(default)]
    pub store: StoreConfig,
}

impl SystemConfig {
    /// Messages sent by the logged-in account never reach the router, so an owner equal to it
    /// could never issue a command.
    pub fn check_owner_account(owner: &ChatId, account: &ChatId) -> Result<()> {
        if owner.as_str().eq_ignore_ascii_case(account.as_str()) {
            anyhow::bail!(
                "system.owner is {owner}, the account the agent logs in as; \
                 the owner must command from a separate account"
            );
        }
        Ok(())
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_log_file() -> String {
    "session.log".to_string()
}
fn default_restart_delay() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
    Redis,
}

/// Where persisted settings live.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_key_prefix() -> String {
    "standby:".to_string()
}

/// Tunables for command handling, AFK and auto-replies.
#[derive(Debug, Deserialize, Clone)]
pub struct AutomationConfig {
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    #[serde(default = "default_dm_cooldown")]
    pub dm_cooldown_secs: u64,
    #[serde(default = "default_group_cooldown")]
    pub group_cooldown_secs: u64,
    #[serde(default = "default_reply_cooldown")]
    pub reply_cooldown_secs: u64,
    #[serde(default = "default_afk_message")]
    pub default_afk_message: String,
    #[serde(default)]
    pub clear_reply_on_owner_activity: bool,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_prefix(),
            dm_cooldown_secs: default_dm_cooldown(),
            group_cooldown_secs: default_group_cooldown(),
            reply_cooldown_secs: default_reply_cooldown(),
            default_afk_message: default_afk_message(),
            clear_reply_on_owner_activity: false,
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl AutomationConfig {
    fn validate(&self) -> Result<()> {
        if self.command_prefix.is_empty() || self.command_prefix.starts_with(char::is_whitespace) {
            anyhow::bail!(
                "automation.command_prefix must be non-empty and must not start with whitespace, got {:?}",
                self.command_prefix
            );
        }
        self.broadcast.validate()
    }

    pub fn dm_cooldown(&self) -> Duration {
        Duration::from_secs(self.dm_cooldown_secs)
    }

    pub fn group_cooldown(&self) -> Duration {
        Duration::from_secs(self.group_cooldown_secs)
    }

    pub fn reply_cooldown(&self) -> Duration {
        Duration::from_secs(self.reply_cooldown_secs)
    }
}

fn default_prefix() -> String {
    ".".to_string()
}
fn default_dm_cooldown() -> u64 {
    1800
}
fn default_group_cooldown() -> u64 {
    300
}
fn default_reply_cooldown() -> u64 {
    1800
}
fn default_afk_message() -> String {
    "Currently offline".to_string()
}

/// Limits for broadcast tasks.
#[derive(Debug, Deserialize, Clone)]
pub struct BroadcastConfig {
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval")]
    pub max_interval_secs: u64,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    #[serde(default = "default_backoff")]
    pub default_backoff_secs: u64,
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            max_interval_secs: default_max_interval(),
            max_message_len: default_max_message_len(),
            default_backoff_secs: default_backoff(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl BroadcastConfig {
    fn validate(&self) -> Result<()> {
        if self.min_interval_secs == 0 || self.min_interval_secs > self.max_interval_secs {
            anyhow::bail!(
                "automation.broadcast: need 0 < min_interval_secs <= max_interval_secs, got {}..{}",
                self.min_interval_secs,
                self.max_interval_secs
            );
        }
        Ok(())
    }

    pub fn default_backoff(&self) -> Duration {
        Duration::from_secs(self.default_backoff_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_min_interval() -> u64 {
    1
}
fn default_max_interval() -> u64 {
    3600
}
fn default_max_message_len() -> usize {
    4096
}
fn default_backoff() -> u64 {
    30
}
fn default_shutdown_grace() -> u64 {
    5
}
