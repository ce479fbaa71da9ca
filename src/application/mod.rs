//! # Application Layer
//!
//! Contains the core logic of the agent: event routing, command dispatch, the broadcast scheduler,
//! AFK and auto-reply policies, and the state they share.

pub mod afk;
pub mod cooldown;
pub mod dispatcher;
pub mod logging;
pub mod parsing;
pub mod replies;
pub mod router;
pub mod scheduler;
pub mod settings;
pub mod state;
