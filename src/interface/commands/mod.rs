//! # Command Handlers
//!
//! One function per owner command. Handlers are invoked by the dispatcher, mutate state through the
//! owning component, persist when settings changed, and return the reply text.

pub mod afk;
pub mod broadcast;
pub mod help;
pub mod misc;
pub mod replies;
