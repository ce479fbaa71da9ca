//! # Automation State
//!
//! The single process-wide owner of AFK state, reply rules and their cooldowns.
//! Loaded from the settings store at startup and written back in full after every mutation.
//! The store is the durable copy; this struct is authoritative for the running session.

use crate::application::afk::{AfkPolicy, AfkState};
use crate::application::replies::ReplyRegistry;
use crate::application::settings::{self, ConfigStoreExt};
use crate::domain::config::AutomationConfig;
use crate::domain::error::StoreError;
use crate::domain::traits::ConfigStore;
use crate::domain::types::{ChatId, InboundEvent};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Afk,
    Rule,
}

/// A reply the router decided to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReply {
    pub kind: ReplyKind,
    pub target: ChatId,
    pub text: String,
}

pub type SharedState = Arc<Mutex<AutomationState>>;

#[derive(Debug)]
pub struct AutomationState {
    pub afk: AfkPolicy,
    pub replies: ReplyRegistry,
    /// Outcome of the most recent write-back, shown by `status`.
    pub last_persist_ok: bool,
}

impl AutomationState {
    pub fn new(config: &AutomationConfig, afk: AfkState, rules: BTreeMap<ChatId, String>) -> Self {
        Self {
            afk: AfkPolicy::new(afk, config.dm_cooldown(), config.group_cooldown()),
            replies: ReplyRegistry::new(rules, config.reply_cooldown()),
            last_persist_ok: true,
        }
    }

    /// Fresh state with nothing armed.
    pub fn empty(config: &AutomationConfig) -> Self {
        let afk = AfkState {
            message: config.default_afk_message.clone(),
            ..AfkState::default()
        };
        Self::new(config, afk, BTreeMap::new())
    }

    /// Reads every setting. Missing values take their defaults.
    pub async fn load(config: &AutomationConfig, store: &dyn ConfigStore) -> Result<Self, StoreError> {
        let rules: BTreeMap<ChatId, String> =
            store.get_or(settings::REPLY_SETTINGS, BTreeMap::new()).await?;
        let afk = AfkState {
            group_active: store.get_or(settings::AFK_GROUP_ACTIVE, false).await?,
            dm_active: store.get_or(settings::AFK_DM_ACTIVE, false).await?,
            message: store
                .get_or(settings::AFK_MESSAGE, config.default_afk_message.clone())
                .await?,
            suspended_groups: store
                .get_or(settings::AFK_SUSPENDED_GROUPS, BTreeSet::new())
                .await?,
            suspended_dms: store
                .get_or(settings::AFK_SUSPENDED_DMS, BTreeSet::new())
                .await?,
        };
        tracing::info!(
            "Loaded settings: {} reply rules, AFK group={} dm={}",
            rules.len(),
            afk.group_active,
            afk.dm_active
        );
        Ok(Self::new(config, afk, rules))
    }

    /// Rewrites every setting. Stops at the first failure.
    pub async fn persist(&mut self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        let result = self.write_all(store).await;
        self.last_persist_ok = result.is_ok();
        if let Err(e) = &result {
            tracing::error!("Failed to persist settings: {}", e);
        }
        result
    }

    async fn write_all(&self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        let afk = self.afk.state();
        store.put(settings::REPLY_SETTINGS, self.replies.rules()).await?;
        store.put(settings::AFK_GROUP_ACTIVE, &afk.group_active).await?;
        store.put(settings::AFK_DM_ACTIVE, &afk.dm_active).await?;
        store.put(settings::AFK_MESSAGE, &afk.message).await?;
        store
            .put(settings::AFK_SUSPENDED_GROUPS, &afk.suspended_groups)
            .await?;
        store.put(settings::AFK_SUSPENDED_DMS, &afk.suspended_dms).await?;
        Ok(())
    }

    /// Decides whether a non-owner event gets an automatic reply.
    ///
    /// AFK is evaluated first and short-circuits reply rules, so at most one reply is planned.
    /// Group messages only qualify when they address the bot.
    pub fn plan_reply(&mut self, event: &InboundEvent, bot: &ChatId, now: Instant) -> Option<PlannedReply> {
        let addressed = event.is_private || event.addresses(bot);
        if !addressed {
            return None;
        }

        if let Some(text) = self.afk.try_fire(event, addressed, now) {
            return Some(PlannedReply {
                kind: ReplyKind::Afk,
                target: event.conversation.clone(),
                text,
            });
        }

        self.replies.try_fire(event, now).map(|text| PlannedReply {
            kind: ReplyKind::Rule,
            target: event.conversation.clone(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Scope;
    use crate::infrastructure::store::MemoryStore;
    use std::time::Duration;

    fn config() -> AutomationConfig {
        AutomationConfig::default()
    }

    fn bot() -> ChatId {
        ChatId::new("@bot:x")
    }

    fn dm(sender: &str) -> InboundEvent {
        InboundEvent {
            sender: ChatId::new(sender),
            conversation: ChatId::new(format!("dm-{sender}")),
            is_private: true,
            text: "hello".into(),
            reply_to: None,
            mentions_me: false,
        }
    }

    fn group(conversation: &str, mentions_me: bool) -> InboundEvent {
        InboundEvent {
            sender: ChatId::new("7"),
            conversation: ChatId::new(conversation),
            is_private: false,
            text: "hello".into(),
            reply_to: None,
            mentions_me,
        }
    }

    #[tokio::test]
    async fn test_settings_survive_reload() {
        let store = MemoryStore::default();
        let mut state = AutomationState::empty(&config());
        state.replies.set(ChatId::new("100"), "ping-pong".into());
        state.afk.enable(Scope::Dm, Some("brb".into()));
        state.afk.suspend(&ChatId::new("!room:x"), false);
        state.persist(&store).await.unwrap();

        let reloaded = AutomationState::load(&config(), &store).await.unwrap();
        assert_eq!(reloaded.afk.state(), state.afk.state());
        assert_eq!(reloaded.replies.rules(), state.replies.rules());
    }

    #[tokio::test]
    async fn test_empty_store_loads_defaults() {
        let store = MemoryStore::default();
        let state = AutomationState::load(&config(), &store).await.unwrap();
        assert!(!state.afk.state().group_active);
        assert!(!state.afk.state().dm_active);
        assert_eq!(state.afk.state().message, "Currently offline");
        assert!(state.replies.is_empty());
    }

    #[test]
    fn test_afk_short_circuits_rule() {
        let mut state = AutomationState::empty(&config());
        state.afk.enable(Scope::Dm, Some("brb".into()));
        state.replies.set(ChatId::new("42"), "custom".into());
        let t0 = Instant::now();

        let first = state.plan_reply(&dm("42"), &bot(), t0).unwrap();
        assert_eq!(first.kind, ReplyKind::Afk);
        assert_eq!(first.text, "brb");

        // AFK cooling down: the rule gets its turn.
        let second = state
            .plan_reply(&dm("42"), &bot(), t0 + Duration::from_secs(1))
            .unwrap();
        assert_eq!(second.kind, ReplyKind::Rule);
        assert_eq!(second.text, "custom");

        // Both cooling down: nothing.
        assert_eq!(state.plan_reply(&dm("42"), &bot(), t0 + Duration::from_secs(2)), None);
    }

    #[test]
    fn test_group_rule_needs_mention() {
        let mut state = AutomationState::empty(&config());
        state.replies.set(ChatId::new("100"), "ping-pong".into());
        let t0 = Instant::now();

        assert_eq!(state.plan_reply(&group("100", false), &bot(), t0), None);
        let reply = state.plan_reply(&group("100", true), &bot(), t0).unwrap();
        assert_eq!(reply.text, "ping-pong");
        assert_eq!(reply.target, ChatId::new("100"));
    }

    #[test]
    fn test_reply_to_bot_counts_as_addressed() {
        let mut state = AutomationState::empty(&config());
        state.afk.enable(Scope::Group, Some("away".into()));
        let mut event = group("100", false);
        event.reply_to = Some(bot());
        let reply = state.plan_reply(&event, &bot(), Instant::now()).unwrap();
        assert_eq!(reply.kind, ReplyKind::Afk);
    }

    #[test]
    fn test_suspended_conversation_falls_through_to_rule() {
        let mut state = AutomationState::empty(&config());
        state.afk.enable(Scope::Group, Some("away".into()));
        state.replies.set(ChatId::new("100"), "rule".into());
        state.afk.suspend(&ChatId::new("100"), false);

        let reply = state
            .plan_reply(&group("100", true), &bot(), Instant::now())
            .unwrap();
        assert_eq!(reply.kind, ReplyKind::Rule);
    }
}
