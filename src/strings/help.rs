//! # Help Text
//!
//! Help message for owner commands. Displayed via the `help` command and on unknown verbs.

/// `{p}` is replaced with the configured command prefix.
const MAIN: &str = concat!(
    "**🤖 Standby Commands**\n",
    "\n",
    "**📣 Broadcast**\n",
    "* {p}setBroadcast <target> <message> <delaySeconds>\n",
    "* {p}broadcastAll <message> <delaySeconds>: every joined group\n",
    "* {p}stopBroadcast <target>\n",
    "* {p}stopAllBroadcasts\n",
    "\n",
    "**💬 Replies**\n",
    "* {p}setReply <id> <message>\n",
    "* {p}clearReply <id>\n",
    "* {p}clearAllReplies\n",
    "* {p}listReplies\n",
    "\n",
    "**😴 AFK**\n",
    "* {p}setAfk group|dm|both [message]\n",
    "* {p}clearAfk group|dm|both\n",
    "\n",
    "**⚡ Info**\n",
    "* {p}status\n",
    "* {p}debug\n",
    "* {p}help\n"
);

pub fn main(prefix: &str) -> String {
    MAIN.replace("{p}", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_uses_prefix() {
        let text = main("!");
        assert!(text.contains("* !setBroadcast"));
        assert!(!text.contains("{p}"));
    }
}
