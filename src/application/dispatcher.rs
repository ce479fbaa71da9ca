//! # Command Dispatcher
//!
//! Runs owner commands. Text is parsed into a [`Command`] and handed to the matching handler in
//! `interface/commands`. Every outcome, including errors, becomes a reply string; nothing
//! propagates back into the event loop.

use crate::application::parsing::{self, Command};
use crate::application::scheduler::BroadcastScheduler;
use crate::application::state::{AutomationState, SharedState};
use crate::domain::config::AutomationConfig;
use crate::domain::error::CommandError;
use crate::domain::traits::{ConfigStore, Transport};
use crate::domain::types::ChatId;
use crate::interface::commands;
use crate::strings::{help, messages};
use std::sync::Arc;
use tokio::time::Instant;

/// Where a command came from.
#[derive(Debug, Clone)]
pub struct Origin {
    pub sender: ChatId,
    pub conversation: ChatId,
    pub is_private: bool,
}

pub struct CommandDispatcher {
    pub config: AutomationConfig,
    pub owner: ChatId,
    pub state: SharedState,
    pub scheduler: Arc<BroadcastScheduler>,
    pub store: Arc<dyn ConfigStore>,
    pub transport: Arc<dyn Transport>,
    started: Instant,
    started_at: chrono::DateTime<chrono::Local>,
}

impl CommandDispatcher {
    pub fn new(
        config: AutomationConfig,
        owner: ChatId,
        state: SharedState,
        scheduler: Arc<BroadcastScheduler>,
        store: Arc<dyn ConfigStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            owner,
            state,
            scheduler,
            store,
            transport,
            started: Instant::now(),
            started_at: chrono::Local::now(),
        }
    }

    /// Runs one command (prefix already stripped) and returns the reply text.
    pub async fn dispatch(&self, text: &str, origin: &Origin) -> String {
        let verb = parsing::split_head(text).map_or("", |(word, _)| word);
        tracing::info!(verb = %verb, "Owner command received");
        tracing::debug!(args = %text, "Owner command text");

        let command = match parsing::parse_command(text, &self.config.broadcast) {
            Ok(command) => command,
            Err(e @ CommandError::UnknownVerb(_)) => {
                tracing::info!("Unknown owner command: {}", verb);
                return format!("{e}\n\n{}", help::main(&self.config.command_prefix));
            }
            Err(e) => return e.to_string(),
        };

        match self.execute(command, origin).await {
            Ok(reply) => reply,
            Err(e) => e.to_string(),
        }
    }

    async fn execute(&self, command: Command, origin: &Origin) -> Result<String, CommandError> {
        match command {
            Command::SetBroadcast {
                target,
                message,
                interval,
            } => commands::broadcast::handle_set(self, target, message, interval).await,
            Command::BroadcastAll { message, interval } => {
                commands::broadcast::handle_all(self, message, interval).await
            }
            Command::StopBroadcast { target } => commands::broadcast::handle_stop(self, &target).await,
            Command::StopAllBroadcasts => commands::broadcast::handle_stop_all(self).await,
            Command::SetReply { key, message } => commands::replies::handle_set(self, key, message).await,
            Command::ClearReply { key } => commands::replies::handle_clear(self, &key).await,
            Command::ClearAllReplies => commands::replies::handle_clear_all(self).await,
            Command::ListReplies => commands::replies::handle_list(self).await,
            Command::SetAfk { scope, message } => commands::afk::handle_set(self, scope, message).await,
            Command::ClearAfk { scope } => commands::afk::handle_clear(self, scope).await,
            Command::Status => commands::misc::handle_status(self).await,
            Command::Help => Ok(commands::help::handle_help(self)),
            Command::Debug => Ok(commands::misc::handle_debug(self, origin)),
        }
    }

    /// Writes the state back. Returns the warning to append when the write failed.
    pub async fn persist(&self, state: &mut AutomationState) -> &'static str {
        match state.persist(self.store.as_ref()).await {
            Ok(()) => "",
            Err(_) => messages::PERSISTENCE_WARNING,
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    pub fn started_at(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
