//! # Command Parsing
//!
//! Turns owner command text into a typed [`Command`]. Verbs are looked up case-insensitively in a
//! fixed table. Message bodies are always the trailing free-text segment, so they are never cut at
//! a space.

use crate::domain::config::BroadcastConfig;
use crate::domain::error::CommandError;
use crate::domain::types::{ChatId, Scope};
use crate::strings::messages;
use std::time::Duration;

/// Handler selected by a verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    SetBroadcast,
    BroadcastAll,
    StopBroadcast,
    StopAllBroadcasts,
    SetReply,
    ClearReply,
    ClearAllReplies,
    ListReplies,
    SetAfk(Option<Scope>),
    ClearAfk(Option<Scope>),
    Status,
    Help,
    Debug,
}

/// Verb table. Keys are lowercase; lookups lowercase the input.
pub const VERBS: &[(&str, Verb)] = &[
    ("setbroadcast", Verb::SetBroadcast),
    ("broadcastall", Verb::BroadcastAll),
    ("spam", Verb::BroadcastAll),
    ("stopbroadcast", Verb::StopBroadcast),
    ("stopallbroadcasts", Verb::StopAllBroadcasts),
    ("stop_spam", Verb::StopAllBroadcasts),
    ("setreply", Verb::SetReply),
    ("setreplyfor", Verb::SetReply),
    ("clearreply", Verb::ClearReply),
    ("resetreplyfor", Verb::ClearReply),
    ("clearallreplies", Verb::ClearAllReplies),
    ("clear_reply", Verb::ClearAllReplies),
    ("listreplies", Verb::ListReplies),
    ("listreply", Verb::ListReplies),
    ("setafk", Verb::SetAfk(None)),
    ("afk", Verb::SetAfk(Some(Scope::Both))),
    ("afk_group", Verb::SetAfk(Some(Scope::Group))),
    ("afk_dm", Verb::SetAfk(Some(Scope::Dm))),
    ("clearafk", Verb::ClearAfk(None)),
    ("afk_off", Verb::ClearAfk(Some(Scope::Both))),
    ("afk_group_off", Verb::ClearAfk(Some(Scope::Group))),
    ("afk_dm_off", Verb::ClearAfk(Some(Scope::Dm))),
    ("status", Verb::Status),
    ("help", Verb::Help),
    ("debug", Verb::Debug),
];

pub fn lookup_verb(word: &str) -> Option<Verb> {
    let word = word.to_lowercase();
    VERBS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, verb)| *verb)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetBroadcast {
        target: ChatId,
        message: String,
        interval: Duration,
    },
    BroadcastAll {
        message: String,
        interval: Duration,
    },
    StopBroadcast {
        target: ChatId,
    },
    StopAllBroadcasts,
    SetReply {
        key: ChatId,
        message: String,
    },
    ClearReply {
        key: ChatId,
    },
    ClearAllReplies,
    ListReplies,
    SetAfk {
        scope: Scope,
        message: Option<String>,
    },
    ClearAfk {
        scope: Scope,
    },
    Status,
    Help,
    Debug,
}

/// Splits off the first whitespace-delimited token. The rest keeps its inner spacing.
pub fn split_head(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(idx) => Some((&input[..idx], input[idx..].trim_start())),
        None => Some((input, "")),
    }
}

/// Splits off the last whitespace-delimited token.
fn split_tail(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_end();
    let (idx, ws) = input.char_indices().rev().find(|(_, c)| c.is_whitespace())?;
    Some((input[..idx].trim_end(), &input[idx + ws.len_utf8()..]))
}

/// Parses command text with the prefix already removed.
pub fn parse_command(text: &str, limits: &BroadcastConfig) -> Result<Command, CommandError> {
    let (word, args) = split_head(text).ok_or_else(|| CommandError::UnknownVerb(String::new()))?;
    let verb = lookup_verb(word).ok_or_else(|| CommandError::UnknownVerb(word.to_string()))?;

    match verb {
        Verb::SetBroadcast => {
            let (target, rest) = split_head(args)
                .ok_or_else(|| CommandError::validation(messages::SET_BROADCAST_USAGE))?;
            let (message, delay) = split_tail(rest)
                .ok_or_else(|| CommandError::validation(messages::SET_BROADCAST_USAGE))?;
            Ok(Command::SetBroadcast {
                target: ChatId::parse(target)?,
                message: parse_message(message, limits, messages::SET_BROADCAST_USAGE)?,
                interval: parse_interval(delay, limits)?,
            })
        }
        Verb::BroadcastAll => {
            let (message, delay) = split_tail(args)
                .ok_or_else(|| CommandError::validation(messages::BROADCAST_ALL_USAGE))?;
            Ok(Command::BroadcastAll {
                message: parse_message(message, limits, messages::BROADCAST_ALL_USAGE)?,
                interval: parse_interval(delay, limits)?,
            })
        }
        Verb::StopBroadcast => Ok(Command::StopBroadcast {
            target: single_id(args, messages::STOP_BROADCAST_USAGE)?,
        }),
        Verb::StopAllBroadcasts => Ok(Command::StopAllBroadcasts),
        Verb::SetReply => {
            let (key, message) =
                split_head(args).ok_or_else(|| CommandError::validation(messages::SET_REPLY_USAGE))?;
            let message = message.trim_end();
            if message.is_empty() {
                return Err(CommandError::validation(messages::SET_REPLY_USAGE));
            }
            Ok(Command::SetReply {
                key: ChatId::parse(key)?,
                message: message.to_string(),
            })
        }
        Verb::ClearReply => Ok(Command::ClearReply {
            key: single_id(args, messages::CLEAR_REPLY_USAGE)?,
        }),
        Verb::ClearAllReplies => Ok(Command::ClearAllReplies),
        Verb::ListReplies => Ok(Command::ListReplies),
        Verb::SetAfk(fixed) => {
            let (scope, message) = match fixed {
                Some(scope) => (scope, args),
                None => {
                    let (scope, message) = split_head(args)
                        .ok_or_else(|| CommandError::validation(messages::SET_AFK_USAGE))?;
                    (Scope::parse(scope)?, message)
                }
            };
            let message = message.trim_end();
            Ok(Command::SetAfk {
                scope,
                message: (!message.is_empty()).then(|| message.to_string()),
            })
        }
        Verb::ClearAfk(fixed) => {
            let scope = match fixed {
                Some(scope) => scope,
                None => {
                    let (scope, _) = split_head(args)
                        .ok_or_else(|| CommandError::validation(messages::CLEAR_AFK_USAGE))?;
                    Scope::parse(scope)?
                }
            };
            Ok(Command::ClearAfk { scope })
        }
        Verb::Status => Ok(Command::Status),
        Verb::Help => Ok(Command::Help),
        Verb::Debug => Ok(Command::Debug),
    }
}

fn single_id(args: &str, usage: &str) -> Result<ChatId, CommandError> {
    let (id, _) = split_head(args).ok_or_else(|| CommandError::validation(usage))?;
    ChatId::parse(id)
}

fn parse_message(message: &str, limits: &BroadcastConfig, usage: &str) -> Result<String, CommandError> {
    if message.is_empty() {
        return Err(CommandError::validation(usage));
    }
    let length = message.chars().count();
    if length > limits.max_message_len {
        return Err(CommandError::validation(messages::message_too_long(
            length,
            limits.max_message_len,
        )));
    }
    Ok(message.to_string())
}

fn parse_interval(raw: &str, limits: &BroadcastConfig) -> Result<Duration, CommandError> {
    let range = limits.min_interval_secs..=limits.max_interval_secs;
    match raw.parse::<u64>() {
        Ok(secs) if range.contains(&secs) => Ok(Duration::from_secs(secs)),
        _ => Err(CommandError::validation(messages::bad_interval(
            raw,
            limits.min_interval_secs,
            limits.max_interval_secs,
        ))),
    }
}
