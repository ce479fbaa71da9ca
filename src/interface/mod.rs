//! # Interface Layer
//!
//! Owner-facing command handlers.

pub mod commands;
