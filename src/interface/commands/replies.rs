//! # Reply Commands
//!
//! Handles `.setReply`, `.clearReply`, `.clearAllReplies` and `.listReplies`.

use crate::application::dispatcher::CommandDispatcher;
use crate::domain::error::CommandError;
use crate::domain::types::ChatId;
use crate::strings::messages;

pub async fn handle_set(
    ctx: &CommandDispatcher,
    key: ChatId,
    message: String,
) -> Result<String, CommandError> {
    let mut state = ctx.state.lock().await;
    let replaced = state.replies.set(key.clone(), message).is_some();
    let warning = ctx.persist(&mut state).await;
    Ok(format!("{}{warning}", messages::reply_set(&key, replaced)))
}

pub async fn handle_clear(ctx: &CommandDispatcher, key: &ChatId) -> Result<String, CommandError> {
    let mut state = ctx.state.lock().await;
    if state.replies.clear(key).is_none() {
        return Err(CommandError::not_found(messages::no_reply(key)));
    }
    let warning = ctx.persist(&mut state).await;
    Ok(format!("{}{warning}", messages::reply_removed(key)))
}

pub async fn handle_clear_all(ctx: &CommandDispatcher) -> Result<String, CommandError> {
    let mut state = ctx.state.lock().await;
    let removed = state.replies.clear_all();
    let warning = ctx.persist(&mut state).await;
    Ok(format!("{}{warning}", messages::replies_cleared(removed)))
}

pub async fn handle_list(ctx: &CommandDispatcher) -> Result<String, CommandError> {
    let state = ctx.state.lock().await;
    if state.replies.is_empty() {
        return Ok(messages::NO_REPLIES.to_string());
    }
    Ok(messages::replies_list(state.replies.rules()))
}
