//! # Help Command
//!
//! Handles `.help`. Renders the command list with the configured prefix.

use crate::application::dispatcher::CommandDispatcher;

pub fn handle_help(ctx: &CommandDispatcher) -> String {
    crate::strings::help::main(&ctx.config.command_prefix)
}
