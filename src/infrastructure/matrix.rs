//! # Matrix Adapter
//!
//! Implements the `Transport` trait for the Matrix protocol using the `matrix_sdk`, and turns the
//! SDK's room message events into [`InboundEvent`]s on a bounded channel.
//! Delivery failures are sorted into transient (rate limited, network) and permanent (no such
//! room, forbidden) so the broadcast loops know whether to wait or give up.

use crate::domain::error::DeliveryError;
use crate::domain::traits::Transport;
use crate::domain::types::{ChatId, InboundEvent};
use crate::strings::logs;
use async_trait::async_trait;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::api::client::error::{ErrorKind, RetryAfter};
use matrix_sdk::ruma::events::room::member::{MembershipState, StrippedRoomMemberEvent};
use matrix_sdk::ruma::events::room::message::{
    MessageType, OriginalSyncRoomMessageEvent, Relation, RoomMessageEventContent,
    RoomMessageEventContentWithoutRelation,
};
use matrix_sdk::ruma::{OwnedUserId, RoomId, UserId};
use matrix_sdk::Client;
use regex::Regex;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Clone)]
pub struct MatrixTransport {
    client: Client,
    own_id: ChatId,
}

impl MatrixTransport {
    /// `client` must be logged in.
    pub fn new(client: Client) -> Option<Self> {
        let own_id = ChatId::new(client.user_id()?.as_str());
        Some(Self { client, own_id })
    }

    fn resolve(&self, target: &ChatId) -> Result<Room, DeliveryError> {
        let raw = target.as_str();
        let room = if raw.starts_with('!') {
            let room_id = <&RoomId>::try_from(raw)
                .map_err(|e| DeliveryError::permanent(format!("invalid room id: {e}")))?;
            self.client.get_room(room_id)
        } else if raw.starts_with('@') {
            let user_id = <&UserId>::try_from(raw)
                .map_err(|e| DeliveryError::permanent(format!("invalid user id: {e}")))?;
            self.client.get_dm_room(user_id)
        } else {
            return Err(DeliveryError::permanent(format!(
                "{target} is not a Matrix room or user id"
            )));
        };
        room.ok_or_else(|| DeliveryError::permanent(format!("not joined to a room for {target}")))
    }
}

/// Sorts an SDK failure into the two delivery outcomes.
fn classify_error(e: &matrix_sdk::Error) -> DeliveryError {
    match e.client_api_error_kind() {
        Some(ErrorKind::LimitExceeded { retry_after, .. }) => {
            let wait = retry_after.as_ref().map(|after| match after {
                RetryAfter::Delay(delay) => *delay,
                RetryAfter::DateTime(at) => at
                    .duration_since(SystemTime::now())
                    .unwrap_or(Duration::ZERO),
            });
            DeliveryError::transient(e.to_string(), wait)
        }
        // Any other answer from the homeserver means it refused this request outright.
        Some(_) => DeliveryError::permanent(e.to_string()),
        None => DeliveryError::transient(e.to_string(), None),
    }
}

#[async_trait]
impl Transport for MatrixTransport {
    async fn send_message(&self, target: &ChatId, text: &str) -> Result<(), DeliveryError> {
        let room = self.resolve(target)?;
        tracing::debug!(chat = %target, "Sending message");
        room.send(RoomMessageEventContent::text_markdown(text))
            .await
            .map(|_| ())
            .map_err(|e| classify_error(&e))
    }

    async fn group_targets(&self) -> Result<Vec<ChatId>, DeliveryError> {
        let mut groups = Vec::new();
        for room in self.client.joined_rooms() {
            if !room.is_direct().await.unwrap_or(false) {
                groups.push(ChatId::new(room.room_id().as_str()));
            }
        }
        Ok(groups)
    }

    fn own_id(&self) -> ChatId {
        self.own_id.clone()
    }
}

/// Whether `body` names the account by full id or by `@localpart`.
fn mentions_by_text(pattern: &Regex, body: &str) -> bool {
    pattern.is_match(body)
}

fn mention_pattern(own: &UserId) -> Option<Regex> {
    let full = regex::escape(own.as_str());
    let local = regex::escape(own.localpart());
    Regex::new(&format!(r"(?i)(?:{full}|@{local}\b)")).ok()
}

async fn replied_to_sender(room: &Room, relation: Option<&Relation<RoomMessageEventContentWithoutRelation>>) -> Option<ChatId> {
    let Some(Relation::Reply { in_reply_to }) = relation else {
        return None;
    };
    let event = room.event(&in_reply_to.event_id, None).await.ok()?;
    let sender: OwnedUserId = event.raw().get_field("sender").ok()??;
    Some(ChatId::new(sender.as_str()))
}

/// Registers the message and invite handlers and returns the inbound feed.
///
/// Messages sent by this account and anything older than `start_time` never reach the channel.
pub fn event_stream(client: &Client, start_time: SystemTime, capacity: usize) -> ReceiverStream<InboundEvent> {
    let (tx, rx) = mpsc::channel(capacity);
    let own_user = client.user_id().map(ToOwned::to_owned);
    let pattern = own_user.as_deref().and_then(mention_pattern);

    client.add_event_handler(move |ev: OriginalSyncRoomMessageEvent, room: Room| {
        let tx = tx.clone();
        let own_user = own_user.clone();
        let pattern = pattern.clone();
        async move {
            if own_user.as_ref().is_some_and(|own| ev.sender == *own) {
                return;
            }
            let event_time = std::time::UNIX_EPOCH
                + Duration::from_millis(ev.origin_server_ts.get().into());
            if event_time < start_time {
                return;
            }
            let MessageType::Text(text) = &ev.content.msgtype else {
                return;
            };

            let explicit = match (&ev.content.mentions, &own_user) {
                (Some(mentions), Some(own)) => mentions.user_ids.contains(own),
                _ => false,
            };
            let mentions_me = explicit
                || pattern
                    .as_ref()
                    .is_some_and(|p| mentions_by_text(p, &text.body));

            let event = InboundEvent {
                sender: ChatId::new(ev.sender.as_str()),
                conversation: ChatId::new(room.room_id().as_str()),
                is_private: room.is_direct().await.unwrap_or(false),
                text: text.body.clone(),
                reply_to: replied_to_sender(&room, ev.content.relates_to.as_ref()).await,
                mentions_me,
            };
            tracing::debug!(sender = %event.sender, chat = %event.conversation, "Inbound message");
            if let Err(e) = tx.send(event).await {
                tracing::warn!("{}", logs::events_dropped(&e.to_string()));
            }
        }
    });

    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room, client: Client| async move {
        if ev.content.membership != MembershipState::Invite {
            return;
        }
        if client.user_id() != Some(&*ev.state_key) {
            return;
        }
        tracing::info!("{}", logs::invite_received(room.room_id().as_str()));
        match room.join().await {
            Ok(()) => tracing::info!("{}", logs::JOIN_INVITE_SUCCESS),
            Err(e) => tracing::warn!("{}", logs::join_invite_fail(&e.to_string())),
        }
    });

    ReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_pattern_matches_id_and_localpart() {
        let own = <&UserId>::try_from("@standby:example.org").unwrap();
        let pattern = mention_pattern(own).unwrap();
        assert!(mentions_by_text(&pattern, "hey @standby:example.org"));
        assert!(mentions_by_text(&pattern, "@Standby are you there?"));
        assert!(!mentions_by_text(&pattern, "@standbyer hello"));
        assert!(!mentions_by_text(&pattern, "nobody here"));
    }
}
