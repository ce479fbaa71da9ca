//! # Messages
//!
//! Constant strings and format functions for replies sent to the owner.

use crate::application::scheduler::{BroadcastInfo, TerminatedBroadcast};
use crate::domain::types::{ChatId, Scope};
use std::collections::BTreeMap;
use std::time::Duration;

pub const SET_BROADCAST_USAGE: &str = "Usage: `setBroadcast <target> <message> <delaySeconds>`";
pub const BROADCAST_ALL_USAGE: &str = "Usage: `broadcastAll <message> <delaySeconds>`";
pub const STOP_BROADCAST_USAGE: &str = "Usage: `stopBroadcast <target>`";
pub const SET_REPLY_USAGE: &str = "Usage: `setReply <id> <message>`";
pub const CLEAR_REPLY_USAGE: &str = "Usage: `clearReply <id>`";
pub const SET_AFK_USAGE: &str = "Usage: `setAfk group|dm|both [message]`";
pub const CLEAR_AFK_USAGE: &str = "Usage: `clearAfk group|dm|both`";

pub const NO_GROUPS: &str = "No joined groups to broadcast to.";
pub const NO_REPLIES: &str = "❌ No active replies.";
pub const PERSISTENCE_WARNING: &str =
    "\n⚠️ Settings could not be saved; this change only lasts until restart.";

pub fn message_too_long(length: usize, max: usize) -> String {
    format!("Message is {length} characters, the limit is {max}.")
}

pub fn bad_interval(raw: &str, min: u64, max: u64) -> String {
    format!("Delay `{raw}` must be a whole number of seconds between {min} and {max}.")
}

pub fn broadcast_started(target: &ChatId, interval: Duration, replaced: bool) -> String {
    let verb = if replaced { "Replaced" } else { "Started" };
    format!(
        "✅ {verb} broadcast to {target} every {}s.",
        interval.as_secs()
    )
}

pub fn broadcasts_started(count: usize, interval: Duration) -> String {
    format!(
        "✅ Started broadcasting in {count} groups with {}s delay.",
        interval.as_secs()
    )
}

pub fn broadcast_stopped(target: &ChatId) -> String {
    format!("✅ Stopped broadcast to {target}.")
}

pub fn no_broadcast(target: &ChatId) -> String {
    format!("No broadcast running for {target}.")
}

pub fn broadcasts_stopped(count: usize) -> String {
    format!("✅ Stopped {count} broadcasts.")
}

pub fn reply_set(key: &ChatId, replaced: bool) -> String {
    if replaced {
        format!("✅ Reply updated for ID {key}.")
    } else {
        format!("✅ Reply set for ID {key}.")
    }
}

pub fn reply_removed(key: &ChatId) -> String {
    format!("✅ Reply removed for ID {key}.")
}

pub fn no_reply(key: &ChatId) -> String {
    format!("No reply found for ID {key}.")
}

pub fn replies_cleared(count: usize) -> String {
    format!("✅ All replies cleared ({count} removed).")
}

pub fn replies_list(rules: &BTreeMap<ChatId, String>) -> String {
    let mut out = String::from("📋 **Active Replies:**");
    for (key, message) in rules {
        out.push_str(&format!("\n• {key}: {message}"));
    }
    out
}

pub fn afk_enabled(scope: Scope, message: &str) -> String {
    format!("✅ AFK {} activated: {message}", scope.label())
}

pub fn afk_disabled(scope: Scope, changed: bool) -> String {
    if changed {
        format!("✅ AFK {} deactivated.", scope.label())
    } else {
        format!("AFK {} was already off.", scope.label())
    }
}

/// `Xd Xh Xm Xs`, leading zero units dropped.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "On" } else { "Off" }
}

pub struct StatusView<'a> {
    pub uptime: Duration,
    pub started_at: &'a str,
    pub broadcasts: &'a [BroadcastInfo],
    pub terminated: &'a [TerminatedBroadcast],
    pub afk_group: bool,
    pub afk_dm: bool,
    pub afk_message: &'a str,
    pub suspended: usize,
    pub reply_count: usize,
    pub persisted: bool,
}

pub fn status(view: &StatusView<'_>) -> String {
    let mut out = format!(
        "📊 **Status**\n\n⏱️ Uptime: {} (since {})\n\n🔄 Broadcasts: {}",
        format_uptime(view.uptime),
        view.started_at,
        view.broadcasts.len()
    );
    for info in view.broadcasts {
        out.push_str(&format!(
            "\n• {} every {}s ({} sent, {} backoffs)",
            info.target,
            info.interval.as_secs(),
            info.sent,
            info.backoffs
        ));
    }
    for ended in view.terminated {
        out.push_str(&format!(
            "\n⛔ {} stopped itself: {}",
            ended.target, ended.reason
        ));
    }
    out.push_str(&format!(
        "\n\n😴 AFK:\n• Group AFK: {}\n• DM AFK: {}\n• Message: \"{}\"\n• Muted conversations: {}",
        on_off(view.afk_group),
        on_off(view.afk_dm),
        view.afk_message,
        view.suspended
    ));
    out.push_str(&format!(
        "\n\n💬 Auto-Reply:\n• Active replies: {}",
        view.reply_count
    ));
    if !view.persisted {
        out.push_str("\n\n⚠️ Last settings write failed.");
    }
    out
}

pub fn debug_info(sender: &ChatId, owner: &ChatId, bot: &ChatId, conversation: &ChatId, is_private: bool) -> String {
    format!(
        "🔍 **Debug Info**\n\nYour ID: {sender}\nOwner ID: {owner}\nMatch: {}\nBot ID: {bot}\nConversation: {conversation}\nMessage Type: {}",
        if sender == owner { "YES" } else { "NO" },
        if is_private { "DM" } else { "Group" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(7)), "7s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_uptime(Duration::from_secs(3_600)), "1h 0m 0s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }

    #[test]
    fn test_status_lists_everything() {
        let broadcasts = [BroadcastInfo {
            target: ChatId::new("555"),
            message: "hello".into(),
            interval: Duration::from_secs(5),
            sent: 3,
            backoffs: 1,
        }];
        let terminated = [TerminatedBroadcast {
            target: ChatId::new("403"),
            reason: "banned".into(),
        }];
        let text = status(&StatusView {
            uptime: Duration::from_secs(61),
            started_at: "2026-01-01 00:00:00",
            broadcasts: &broadcasts,
            terminated: &terminated,
            afk_group: true,
            afk_dm: false,
            afk_message: "brb",
            suspended: 0,
            reply_count: 2,
            persisted: false,
        });
        assert!(text.contains("Uptime: 1m 1s"));
        assert!(text.contains("Broadcasts: 1"));
        assert!(text.contains("555 every 5s (3 sent, 1 backoffs)"));
        assert!(text.contains("403 stopped itself: banned"));
        assert!(text.contains("Group AFK: On"));
        assert!(text.contains("DM AFK: Off"));
        assert!(text.contains("\"brb\""));
        assert!(text.contains("Active replies: 2"));
        assert!(text.contains("Last settings write failed"));
    }
}
