//! # AFK Commands
//!
//! Handles `.setAfk` and `.clearAfk` plus their legacy aliases. Both re-arm AFK in every
//! conversation of the affected scope.

use crate::application::dispatcher::CommandDispatcher;
use crate::domain::error::CommandError;
use crate::domain::types::Scope;
use crate::strings::messages;

pub async fn handle_set(
    ctx: &CommandDispatcher,
    scope: Scope,
    message: Option<String>,
) -> Result<String, CommandError> {
    let mut state = ctx.state.lock().await;
    state.afk.enable(scope, message);
    let reply = messages::afk_enabled(scope, &state.afk.state().message);
    let warning = ctx.persist(&mut state).await;
    Ok(format!("{reply}{warning}"))
}

pub async fn handle_clear(ctx: &CommandDispatcher, scope: Scope) -> Result<String, CommandError> {
    let mut state = ctx.state.lock().await;
    let changed = state.afk.disable(scope);
    let warning = ctx.persist(&mut state).await;
    Ok(format!("{}{warning}", messages::afk_disabled(scope, changed)))
}
