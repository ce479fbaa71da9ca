//! # Domain Layer
//!
//! Core definitions, types, and traits that define the business domain of the agent.
//! Independent of the chat platform, serving as the contract for the other layers.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
