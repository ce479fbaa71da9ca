//! Test doubles for the chat platform and the settings store.

use crate::domain::error::{DeliveryError, StoreError};
use crate::domain::traits::{ConfigStore, Transport};
use crate::domain::types::{ChatId, InboundEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub const BOT: &str = "@bot:example.org";
pub const OWNER: &str = "@owner:example.org";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: ChatId,
    pub text: String,
    pub at: Instant,
}

/// Records every successful send. Failures can be scripted per target, latency per text.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    slow: Mutex<Vec<(String, Duration)>>,
    attempts: Mutex<HashMap<ChatId, usize>>,
    permanent: Mutex<HashMap<ChatId, String>>,
    transient_once: Mutex<HashMap<ChatId, Option<Duration>>>,
    groups: Mutex<Vec<ChatId>>,
}

impl RecordingTransport {
    pub fn with_groups(groups: &[&str]) -> Self {
        let transport = Self::default();
        *transport.groups.lock().unwrap() = groups.iter().map(|g| ChatId::new(*g)).collect();
        transport
    }

    pub fn fail_permanently(&self, target: &ChatId, reason: &str) {
        self.permanent
            .lock()
            .unwrap()
            .insert(target.clone(), reason.to_string());
    }

    pub fn fail_transiently_once(&self, target: &ChatId, retry_after: Option<Duration>) {
        self.transient_once
            .lock()
            .unwrap()
            .insert(target.clone(), retry_after);
    }

    /// Sends whose text contains `fragment` take `delay` before they land.
    pub fn delay_when_contains(&self, fragment: &str, delay: Duration) {
        self.slow.lock().unwrap().push((fragment.to_string(), delay));
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, target: &ChatId) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|s| &s.target == target)
            .collect()
    }

    pub fn texts_to(&self, target: &str) -> Vec<String> {
        self.sent_to(&ChatId::new(target))
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    pub fn attempts_to(&self, target: &ChatId) -> usize {
        self.attempts.lock().unwrap().get(target).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, target: &ChatId, text: &str) -> Result<(), DeliveryError> {
        *self.attempts.lock().unwrap().entry(target.clone()).or_default() += 1;

        if let Some(reason) = self.permanent.lock().unwrap().get(target) {
            return Err(DeliveryError::permanent(reason.clone()));
        }
        if let Some(retry_after) = self.transient_once.lock().unwrap().remove(target) {
            return Err(DeliveryError::transient("rate limited", retry_after));
        }

        let delay = self
            .slow
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| text.contains(fragment.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.sent.lock().unwrap().push(SentMessage {
            target: target.clone(),
            text: text.to_string(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn group_targets(&self) -> Result<Vec<ChatId>, DeliveryError> {
        Ok(self.groups.lock().unwrap().clone())
    }

    fn own_id(&self) -> ChatId {
        ChatId::new(BOT)
    }
}

/// Store whose writes can be switched off to simulate an outage.
#[derive(Default)]
pub struct FlakyStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
    broken: AtomicBool,
}

impl FlakyStore {
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigStore for FlakyStore {
    async fn get(&self, name: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.values.lock().unwrap().get(name).cloned())
    }

    async fn set(&self, name: &str, value: serde_json::Value) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk on fire".into()));
        }
        self.values.lock().unwrap().insert(name.to_string(), value);
        Ok(())
    }
}

pub fn dm(sender: &str, text: &str) -> InboundEvent {
    InboundEvent {
        sender: ChatId::new(sender),
        conversation: ChatId::new(format!("dm-{sender}")),
        is_private: true,
        text: text.to_string(),
        reply_to: None,
        mentions_me: false,
    }
}

pub fn group(conversation: &str, sender: &str, text: &str, mentions_me: bool) -> InboundEvent {
    InboundEvent {
        sender: ChatId::new(sender),
        conversation: ChatId::new(conversation),
        is_private: false,
        text: text.to_string(),
        reply_to: None,
        mentions_me,
    }
}
