//! # Miscellaneous Commands
//!
//! Handles `.status` and `.debug`.

use crate::application::dispatcher::{CommandDispatcher, Origin};
use crate::domain::error::CommandError;
use crate::strings::messages::{self, StatusView};

pub async fn handle_status(ctx: &CommandDispatcher) -> Result<String, CommandError> {
    let broadcasts = ctx.scheduler.snapshot().await;
    let terminated = ctx.scheduler.take_terminated().await;
    let started_at = ctx.started_at();

    let state = ctx.state.lock().await;
    let afk = state.afk.state();
    Ok(messages::status(&StatusView {
        uptime: ctx.uptime(),
        started_at: &started_at,
        broadcasts: &broadcasts,
        terminated: &terminated,
        afk_group: afk.group_active,
        afk_dm: afk.dm_active,
        afk_message: &afk.message,
        suspended: afk.suspended_groups.len() + afk.suspended_dms.len(),
        reply_count: state.replies.len(),
        persisted: state.last_persist_ok,
    }))
}

pub fn handle_debug(ctx: &CommandDispatcher, origin: &Origin) -> String {
    messages::debug_info(
        &origin.sender,
        &ctx.owner,
        &ctx.transport.own_id(),
        &origin.conversation,
        origin.is_private,
    )
}
