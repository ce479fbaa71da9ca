//! # Infrastructure Layer
//!
//! Handles interactions with external systems.
//! Implements the traits defined in the Domain layer (`Transport`, `EventSource`, `ConfigStore`).

pub mod matrix;
pub mod store;
