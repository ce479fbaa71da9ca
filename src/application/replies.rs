//! # Reply Registry
//!
//! Canned replies keyed by conversation or correspondent id, each with its own cooldown.

use crate::application::cooldown::CooldownTracker;
use crate::domain::types::{ChatId, InboundEvent};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct ReplyRegistry {
    rules: BTreeMap<ChatId, String>,
    cooldown: CooldownTracker,
}

impl ReplyRegistry {
    pub fn new(rules: BTreeMap<ChatId, String>, window: Duration) -> Self {
        Self {
            rules,
            cooldown: CooldownTracker::new(window),
        }
    }

    /// Inserts or replaces. Returns the previous text. A running cooldown for `key` is kept.
    pub fn set(&mut self, key: ChatId, message: String) -> Option<String> {
        self.rules.insert(key, message)
    }

    pub fn clear(&mut self, key: &ChatId) -> Option<String> {
        self.cooldown.forget(key);
        self.rules.remove(key)
    }

    pub fn clear_all(&mut self) -> usize {
        self.cooldown.reset();
        let count = self.rules.len();
        self.rules.clear();
        count
    }

    pub fn rules(&self) -> &BTreeMap<ChatId, String> {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule key that applies to `event`, most specific first.
    ///
    /// DMs look up the correspondent, then the conversation. Groups look up the conversation,
    /// then the sender.
    pub fn matching_key(&self, event: &InboundEvent) -> Option<&ChatId> {
        let (primary, secondary) = if event.is_private {
            (&event.sender, &event.conversation)
        } else {
            (&event.conversation, &event.sender)
        };
        [primary, secondary]
            .into_iter()
            .find_map(|key| self.rules.get_key_value(key).map(|(k, _)| k))
    }

    /// Text to send for `event`, if a rule matches and its cooldown has passed.
    pub fn try_fire(&mut self, event: &InboundEvent, now: Instant) -> Option<String> {
        let key = self.matching_key(event)?.clone();
        if !self.cooldown.try_acquire(&key, now) {
            tracing::debug!(key = %key, "reply rule cooling down");
            return None;
        }
        self.rules.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn group(conversation: &str, sender: &str) -> InboundEvent {
        InboundEvent {
            sender: ChatId::new(sender),
            conversation: ChatId::new(conversation),
            is_private: false,
            text: "hello".into(),
            reply_to: None,
            mentions_me: true,
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = ReplyRegistry::new(BTreeMap::new(), Duration::ZERO);
        assert_eq!(registry.set(ChatId::new("1"), "a".into()), None);
        assert_eq!(registry.set(ChatId::new("1"), "b".into()), Some("a".into()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.rules()[&ChatId::new("1")], "b");
    }

    #[test]
    fn test_lookup_order() {
        let mut registry = ReplyRegistry::new(BTreeMap::new(), Duration::ZERO);
        registry.set(ChatId::new("42"), "for the user".into());
        registry.set(ChatId::new("100"), "for the room".into());

        assert_eq!(registry.matching_key(&dm("42")), Some(&ChatId::new("42")));
        assert_eq!(
            registry.matching_key(&group("100", "42")),
            Some(&ChatId::new("100"))
        );
        assert_eq!(
            registry.matching_key(&group("200", "42")),
            Some(&ChatId::new("42"))
        );
        assert_eq!(registry.matching_key(&dm("7")), None);
    }

    #[test]
    fn test_rule_cooldown_is_per_key() {
        let mut registry = ReplyRegistry::new(BTreeMap::new(), Duration::from_secs(60));
        registry.set(ChatId::new("42"), "pong".into());
        let t0 = Instant::now();

        assert_eq!(registry.try_fire(&dm("42"), t0), Some("pong".into()));
        assert_eq!(registry.try_fire(&dm("42"), t0 + Duration::from_secs(30)), None);
        assert_eq!(
            registry.try_fire(&dm("42"), t0 + Duration::from_secs(60)),
            Some("pong".into())
        );
    }

    #[test]
    fn test_replacing_rule_keeps_cooldown() {
        let mut registry = ReplyRegistry::new(BTreeMap::new(), Duration::from_secs(60));
        registry.set(ChatId::new("42"), "pong".into());
        let t0 = Instant::now();
        assert_eq!(registry.try_fire(&dm("42"), t0), Some("pong".into()));

        registry.set(ChatId::new("42"), "pong again".into());
        assert_eq!(registry.try_fire(&dm("42"), t0 + Duration::from_secs(5)), None);
        assert_eq!(
            registry.try_fire(&dm("42"), t0 + Duration::from_secs(60)),
            Some("pong again".into())
        );
    }

    #[test]
    fn test_clear_forgets_cooldown() {
        let mut registry = ReplyRegistry::new(BTreeMap::new(), Duration::from_secs(60));
        registry.set(ChatId::new("42"), "pong".into());
        let t0 = Instant::now();
        assert!(registry.try_fire(&dm("42"), t0).is_some());

        registry.clear(&ChatId::new("42"));
        registry.set(ChatId::new("42"), "back".into());
        assert_eq!(
            registry.try_fire(&dm("42"), t0 + Duration::from_secs(5)),
            Some("back".into())
        );
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let mut registry = ReplyRegistry::new(BTreeMap::new(), Duration::ZERO);
        registry.set(ChatId::new("1"), "a".into());
        registry.set(ChatId::new("2"), "b".into());
        assert_eq!(registry.clear_all(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.clear_all(), 0);
        assert!(registry.is_empty());
    }
}
