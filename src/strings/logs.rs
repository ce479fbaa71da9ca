//! # Log Lines
//!
//! Reusable operational log messages for the entry point and the Matrix adapter.

pub fn config_loaded(path: &str, owner: &str) -> String {
    format!("Loaded configuration from {path} (owner: {owner})")
}

pub fn logged_in(user: &str) -> String {
    format!("Logged in as {user}")
}

pub fn setting_display_name(name: &str) -> String {
    format!("Setting display name to: {name}")
}

pub fn set_display_name_fail(err: &str) -> String {
    format!("Failed to set display name: {err}")
}

pub const SYNC_LOOP_START: &str = "Starting sync loop...";

pub fn sync_loop_fail(err: &str, delay_secs: u64) -> String {
    format!("Sync loop failed: {err}. Restarting in {delay_secs} seconds...")
}

pub const SHUTDOWN: &str = "Shutting down...";

pub fn shutdown_fail(err: &str) -> String {
    format!("Unable to listen for shutdown signal: {err}")
}

pub fn invite_received(room_id: &str) -> String {
    format!("💌 Received invite for room {room_id:?}")
}

pub fn join_invite_fail(err: &str) -> String {
    format!("Failed to join room after invite: {err}")
}

pub const JOIN_INVITE_SUCCESS: &str = "✅ Successfully joined room!";

pub fn store_load_fail(err: &str) -> String {
    format!("Could not load settings, starting with defaults: {err}")
}

pub fn events_dropped(err: &str) -> String {
    format!("Event queue closed, dropping inbound message: {err}")
}
