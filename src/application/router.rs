//! # Event Router
//!
//! Classifies every inbound event and sends it down exactly one path: owner command, owner
//! activity, silent discard, or automatic-reply evaluation.
//! Decisions run inline and in arrival order. Command answers are sent inline too, so the owner
//! reads them in the order the commands were given. Auto-replies are spawned so a slow transport
//! never holds up the next event.

use crate::application::dispatcher::{CommandDispatcher, Origin};
use crate::application::state::SharedState;
use crate::domain::traits::{ConfigStore, EventSource, Transport};
use crate::domain::types::{ChatId, InboundEvent};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Owner command text, prefix stripped.
    Command(String),
    OwnerActivity,
    Discard,
    Evaluate,
}

pub struct EventRouter {
    owner: ChatId,
    bot: ChatId,
    prefix: String,
    clear_reply_on_owner_activity: bool,
    state: SharedState,
    store: Arc<dyn ConfigStore>,
    transport: Arc<dyn Transport>,
    dispatcher: Arc<CommandDispatcher>,
}

impl EventRouter {
    pub fn new(dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            owner: dispatcher.owner.clone(),
            bot: dispatcher.transport.own_id(),
            prefix: dispatcher.config.command_prefix.clone(),
            clear_reply_on_owner_activity: dispatcher.config.clear_reply_on_owner_activity,
            state: dispatcher.state.clone(),
            store: dispatcher.store.clone(),
            transport: dispatcher.transport.clone(),
            dispatcher,
        }
    }

    /// First match wins.
    pub fn classify(&self, event: &InboundEvent) -> Route {
        let text = event.text.trim_start();
        let command = text.strip_prefix(self.prefix.as_str());

        match (event.sender == self.owner, command) {
            (true, Some(rest)) => Route::Command(rest.to_string()),
            (true, None) => Route::OwnerActivity,
            (false, Some(_)) => Route::Discard,
            (false, None) => Route::Evaluate,
        }
    }

    pub async fn handle(&self, event: InboundEvent) {
        match self.classify(&event) {
            Route::Command(text) => {
                let origin = Origin {
                    sender: event.sender,
                    conversation: event.conversation,
                    is_private: event.is_private,
                };
                let reply = self.dispatcher.dispatch(&text, &origin).await;
                self.answer(&origin.conversation, &reply).await;
            }
            Route::OwnerActivity => self.on_owner_activity(&event).await,
            Route::Discard => {
                tracing::debug!(sender = %event.sender, "Ignoring command from non-owner");
            }
            Route::Evaluate => {
                let planned = {
                    let mut state = self.state.lock().await;
                    state.plan_reply(&event, &self.bot, Instant::now())
                };
                if let Some(reply) = planned {
                    tracing::info!(
                        kind = ?reply.kind,
                        chat = %reply.target,
                        sender = %event.sender,
                        "Auto-replying"
                    );
                    self.deliver(reply.target, reply.text);
                }
            }
        }
    }

    async fn on_owner_activity(&self, event: &InboundEvent) {
        let mut state = self.state.lock().await;
        let afk = state.afk.state();
        let armed = if event.is_private { afk.dm_active } else { afk.group_active };

        let mut changed = armed && state.afk.suspend(&event.conversation, event.is_private);
        if changed {
            tracing::info!(chat = %event.conversation, "Owner active, AFK muted here");
        }
        if self.clear_reply_on_owner_activity && state.replies.clear(&event.conversation).is_some() {
            tracing::info!(chat = %event.conversation, "Owner active, reply rule cleared");
            changed = true;
        }
        if changed {
            // Failures are logged and surfaced by the next status.
            let _ = state.persist(self.store.as_ref()).await;
        }
    }

    async fn answer(&self, conversation: &ChatId, text: &str) {
        if let Err(e) = self.transport.send_message(conversation, text).await {
            tracing::warn!(chat = %conversation, "Failed to deliver command answer: {}", e);
        }
    }

    fn deliver(&self, target: ChatId, text: String) {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.send_message(&target, &text).await {
                tracing::warn!(chat = %target, "Failed to deliver reply: {}", e);
            }
        });
    }

    /// Consumes events until the source ends or `shutdown` resolves, then drains what is
    /// already buffered.
    pub async fn run<S, F>(&self, source: &mut S, shutdown: F)
    where
        S: EventSource + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Event router stopping");
                    break;
                }
                event = source.next_event() => match event {
                    Some(event) => self.handle(event).await,
                    None => {
                        tracing::info!("Event source closed");
                        return;
                    }
                },
            }
        }

        let mut drained = 0usize;
        while let Some(Some(event)) = source.next_event().now_or_never() {
            self.handle(event).await;
            drained += 1;
        }
        if drained > 0 {
            tracing::info!("Drained {} buffered events", drained);
        }
    }
}
