//! # Domain Types
//!
//! Identifiers, inbound events and AFK scopes used across the application logic.

use crate::domain::error::CommandError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque conversation or correspondent identifier.
///
/// Accepts decimal ids (`555`, `-100123`) and Matrix sigil ids (`!room:server`, `@user:server`,
/// `#alias:server`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Wraps an id coming from the platform. No validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses an id typed by the owner.
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CommandError::validation("Target id is missing."));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(CommandError::validation(format!(
                "`{raw}` is not a valid id."
            )));
        }

        let numeric = raw.strip_prefix('-').unwrap_or(raw);
        if !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit()) {
            return raw
                .parse::<i64>()
                .map(|_| Self(raw.to_string()))
                .map_err(|_| CommandError::validation(format!("`{raw}` is out of range.")));
        }

        if let Some(rest) = raw.strip_prefix(['!', '@', '#'])
            && let Some((local, server)) = rest.split_once(':')
            && !local.is_empty()
            && !server.is_empty()
        {
            return Ok(Self(raw.to_string()));
        }

        Err(CommandError::validation(format!(
            "`{raw}` is not a valid id (expected a number or a `!room:server` / `@user:server` id)."
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which AFK mode a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Group,
    Dm,
    Both,
}

impl Scope {
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        match raw.trim().to_lowercase().as_str() {
            "group" | "groups" => Ok(Self::Group),
            "dm" | "dms" | "private" => Ok(Self::Dm),
            "both" | "all" => Ok(Self::Both),
            other => Err(CommandError::validation(format!(
                "Unknown scope `{other}`, expected group, dm or both."
            ))),
        }
    }

    pub fn covers_group(self) -> bool {
        matches!(self, Self::Group | Self::Both)
    }

    pub fn covers_dm(self) -> bool {
        matches!(self, Self::Dm | Self::Both)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Dm => "DM",
            Self::Both => "group & DM",
        }
    }
}

/// One inbound message, already translated out of the platform's event format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: ChatId,
    pub conversation: ChatId,
    pub is_private: bool,
    /// Message body. Empty for non-text messages.
    pub text: String,
    /// Sender of the message this one replies to, if any.
    pub reply_to: Option<ChatId>,
    pub mentions_me: bool,
}

impl InboundEvent {
    /// True when a group message is aimed at the bot account.
    pub fn addresses(&self, bot: &ChatId) -> bool {
        self.mentions_me || self.reply_to.as_ref() == Some(bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_accepts_numeric_and_matrix_ids() {
        assert_eq!(ChatId::parse("555").unwrap().as_str(), "555");
        assert_eq!(ChatId::parse("-100123").unwrap().as_str(), "-100123");
        assert!(ChatId::parse("!abc:example.org").is_ok());
        assert!(ChatId::parse("@bob:example.org").is_ok());
        assert!(ChatId::parse("#lobby:example.org").is_ok());
    }

    #[test]
    fn test_chat_id_rejects_garbage() {
        assert!(matches!(ChatId::parse(""), Err(CommandError::Validation(_))));
        assert!(matches!(ChatId::parse("abc"), Err(CommandError::Validation(_))));
        assert!(matches!(ChatId::parse("-"), Err(CommandError::Validation(_))));
        assert!(matches!(ChatId::parse("@bob"), Err(CommandError::Validation(_))));
        assert!(matches!(
            ChatId::parse("99999999999999999999999"),
            Err(CommandError::Validation(_))
        ));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(Scope::parse("GROUP").unwrap(), Scope::Group);
        assert_eq!(Scope::parse("dm").unwrap(), Scope::Dm);
        assert_eq!(Scope::parse("both").unwrap(), Scope::Both);
        assert!(Scope::parse("everyone").is_err());
        assert!(Scope::Both.covers_dm() && Scope::Both.covers_group());
        assert!(!Scope::Dm.covers_group());
    }

    #[test]
    fn test_addresses_mention_or_reply() {
        let bot = ChatId::new("@bot:x");
        let mut ev = InboundEvent {
            sender: ChatId::new("@a:x"),
            conversation: ChatId::new("!r:x"),
            is_private: false,
            text: "hi".into(),
            reply_to: None,
            mentions_me: false,
        };
        assert!(!ev.addresses(&bot));
        ev.reply_to = Some(ChatId::new("@other:x"));
        assert!(!ev.addresses(&bot));
        ev.reply_to = Some(bot.clone());
        assert!(ev.addresses(&bot));
        ev.reply_to = None;
        ev.mentions_me = true;
        assert!(ev.addresses(&bot));
    }
}
