//! # Broadcast Commands
//!
//! Handles `.setBroadcast`, `.broadcastAll`, `.stopBroadcast` and `.stopAllBroadcasts`.
//! Broadcast tasks live only in the scheduler, so nothing here touches the settings store.

use crate::application::dispatcher::CommandDispatcher;
use crate::domain::error::CommandError;
use crate::domain::types::ChatId;
use crate::strings::messages;
use std::time::Duration;

pub async fn handle_set(
    ctx: &CommandDispatcher,
    target: ChatId,
    message: String,
    interval: Duration,
) -> Result<String, CommandError> {
    let replaced = ctx.scheduler.start(target.clone(), message, interval).await;
    Ok(messages::broadcast_started(&target, interval, replaced))
}

pub async fn handle_all(
    ctx: &CommandDispatcher,
    message: String,
    interval: Duration,
) -> Result<String, CommandError> {
    let groups = match ctx.transport.group_targets().await {
        Ok(groups) => groups,
        Err(e) => {
            tracing::warn!("Could not list joined groups: {}", e);
            Vec::new()
        }
    };
    if groups.is_empty() {
        return Err(CommandError::not_found(messages::NO_GROUPS));
    }

    let count = groups.len();
    for group in groups {
        ctx.scheduler.start(group, message.clone(), interval).await;
    }
    Ok(messages::broadcasts_started(count, interval))
}

pub async fn handle_stop(ctx: &CommandDispatcher, target: &ChatId) -> Result<String, CommandError> {
    if ctx.scheduler.stop(target).await {
        Ok(messages::broadcast_stopped(target))
    } else {
        Err(CommandError::not_found(messages::no_broadcast(target)))
    }
}

pub async fn handle_stop_all(ctx: &CommandDispatcher) -> Result<String, CommandError> {
    let count = ctx.scheduler.stop_all().await;
    Ok(messages::broadcasts_stopped(count))
}
