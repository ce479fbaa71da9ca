//! # Domain Traits
//!
//! Abstract interfaces for the collaborators the engine talks to (chat transport, event feed,
//! settings store). Implementations live in the Infrastructure layer.

use crate::domain::error::{DeliveryError, StoreError};
use crate::domain::types::{ChatId, InboundEvent};
use async_trait::async_trait;
use futures::{Stream, StreamExt};

/// Outbound side of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `text` to a conversation or correspondent.
    async fn send_message(&self, target: &ChatId, text: &str) -> Result<(), DeliveryError>;

    /// Every group conversation the account currently belongs to.
    async fn group_targets(&self) -> Result<Vec<ChatId>, DeliveryError>;

    /// Id of the account the agent is logged in as.
    fn own_id(&self) -> ChatId;
}

/// Inbound side of the chat platform.
#[async_trait]
pub trait EventSource: Send {
    /// Waits for the next event. `None` once the feed is closed.
    async fn next_event(&mut self) -> Option<InboundEvent>;
}

#[async_trait]
impl<S> EventSource for S
where
    S: Stream<Item = InboundEvent> + Unpin + Send,
{
    async fn next_event(&mut self) -> Option<InboundEvent> {
        self.next().await
    }
}

/// Durable named settings. A `set` must be visible to any later `get` from this process.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<serde_json::Value>, StoreError>;

    async fn set(&self, name: &str, value: serde_json::Value) -> Result<(), StoreError>;
}
