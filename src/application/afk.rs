//! # AFK Policy
//!
//! Away-mode state machine for the two scopes (groups, DMs). Each scope is Off or On; while On a
//! qualifying event gets the away message, at most once per cooldown window per subject.
//! Conversations where the owner has been active since AFK was armed are suspended.

use crate::application::cooldown::CooldownTracker;
use crate::domain::types::{ChatId, InboundEvent, Scope};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;

/// Persisted part of the AFK policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AfkState {
    pub group_active: bool,
    pub dm_active: bool,
    pub message: String,
    pub suspended_groups: BTreeSet<ChatId>,
    pub suspended_dms: BTreeSet<ChatId>,
}

#[derive(Debug)]
pub struct AfkPolicy {
    state: AfkState,
    dm_cooldown: CooldownTracker,
    group_cooldown: CooldownTracker,
}

impl AfkPolicy {
    pub fn new(state: AfkState, dm_window: Duration, group_window: Duration) -> Self {
        Self {
            state,
            dm_cooldown: CooldownTracker::new(dm_window),
            group_cooldown: CooldownTracker::new(group_window),
        }
    }

    pub fn state(&self) -> &AfkState {
        &self.state
    }

    /// Off → On for `scope`. Re-arms every suspended conversation of that scope.
    ///
    /// Cooldown tables survive, so a subject answered recently stays quiet until its window ends.
    pub fn enable(&mut self, scope: Scope, message: Option<String>) {
        if let Some(message) = message {
            self.state.message = message;
        }
        if scope.covers_group() {
            self.state.group_active = true;
            self.state.suspended_groups.clear();
        }
        if scope.covers_dm() {
            self.state.dm_active = true;
            self.state.suspended_dms.clear();
        }
    }

    /// On → Off for `scope`. Returns whether anything was switched off.
    pub fn disable(&mut self, scope: Scope) -> bool {
        let mut changed = false;
        if scope.covers_group() {
            changed |= std::mem::take(&mut self.state.group_active);
            self.state.suspended_groups.clear();
        }
        if scope.covers_dm() {
            changed |= std::mem::take(&mut self.state.dm_active);
            self.state.suspended_dms.clear();
        }
        changed
    }

    /// Owner was active in `conversation`: stop auto-replying there until AFK is re-armed.
    /// Returns whether the conversation was newly suspended.
    pub fn suspend(&mut self, conversation: &ChatId, is_private: bool) -> bool {
        let set = if is_private {
            &mut self.state.suspended_dms
        } else {
            &mut self.state.suspended_groups
        };
        set.insert(conversation.clone())
    }

    pub fn is_suspended(&self, conversation: &ChatId, is_private: bool) -> bool {
        if is_private {
            self.state.suspended_dms.contains(conversation)
        } else {
            self.state.suspended_groups.contains(conversation)
        }
    }

    /// Away message for `event`, if AFK fires for it.
    ///
    /// `addressed` says whether a group message mentions or replies to the bot. The cooldown slot
    /// is claimed as soon as the decision is made.
    pub fn try_fire(&mut self, event: &InboundEvent, addressed: bool, now: Instant) -> Option<String> {
        let (active, tracker, subject) = if event.is_private {
            (self.state.dm_active, &mut self.dm_cooldown, &event.sender)
        } else {
            if !addressed {
                return None;
            }
            (
                self.state.group_active,
                &mut self.group_cooldown,
                &event.conversation,
            )
        };

        if !active {
            return None;
        }
        let suspended = if event.is_private {
            self.state.suspended_dms.contains(&event.conversation)
        } else {
            self.state.suspended_groups.contains(&event.conversation)
        };
        if suspended {
            tracing::debug!(conversation = %event.conversation, "AFK suspended here");
            return None;
        }
        if !tracker.try_acquire(subject, now) {
            tracing::debug!(subject = %subject, "AFK reply cooling down");
            return None;
        }
        Some(self.state.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(1800);

    fn policy() -> AfkPolicy {
        AfkPolicy::new(
            AfkState {
                message: "Currently offline".into(),
                ..AfkState::default()
            },
            WINDOW,
            Duration::from_secs(300),
        )
    }

    fn dm(sender: &str) -> InboundEvent {
        InboundEvent {
            sender: ChatId::new(sender),
            conversation: ChatId::new(format!("dm-{sender}")),
            is_private: true,
            text: "hi".into(),
            reply_to: None,
            mentions_me: false,
        }
    }

    fn group(conversation: &str) -> InboundEvent {
        InboundEvent {
            sender: ChatId::new("7"),
            conversation: ChatId::new(conversation),
            is_private: false,
            text: "hi".into(),
            reply_to: None,
            mentions_me: true,
        }
    }

    #[test]
    fn test_off_by_default() {
        let mut afk = policy();
        assert_eq!(afk.try_fire(&dm("42"), false, Instant::now()), None);
        assert_eq!(afk.try_fire(&group("100"), true, Instant::now()), None);
    }

    #[test]
    fn test_dm_scope_only_fires_for_dms() {
        let mut afk = policy();
        afk.enable(Scope::Dm, Some("brb".into()));
        let now = Instant::now();
        assert_eq!(afk.try_fire(&dm("42"), false, now), Some("brb".into()));
        assert_eq!(afk.try_fire(&group("100"), true, now), None);
    }

    #[test]
    fn test_group_requires_addressing() {
        let mut afk = policy();
        afk.enable(Scope::Group, None);
        let now = Instant::now();
        assert_eq!(afk.try_fire(&group("100"), false, now), None);
        assert_eq!(
            afk.try_fire(&group("100"), true, now),
            Some("Currently offline".into())
        );
    }

    #[test]
    fn test_dm_cooldown_per_correspondent() {
        let mut afk = policy();
        afk.enable(Scope::Dm, Some("brb".into()));
        let t0 = Instant::now();
        assert!(afk.try_fire(&dm("42"), false, t0).is_some());
        assert!(afk.try_fire(&dm("42"), false, t0 + Duration::from_secs(10)).is_none());
        assert!(afk.try_fire(&dm("43"), false, t0 + Duration::from_secs(10)).is_some());
        assert!(afk.try_fire(&dm("42"), false, t0 + WINDOW).is_some());
    }

    #[test]
    fn test_rearming_keeps_cooldown() {
        let mut afk = policy();
        afk.enable(Scope::Dm, Some("brb".into()));
        let t0 = Instant::now();
        assert_eq!(afk.try_fire(&dm("42"), false, t0), Some("brb".into()));

        afk.enable(Scope::Dm, Some("brb".into()));
        assert_eq!(afk.try_fire(&dm("42"), false, t0 + Duration::from_secs(10)), None);

        afk.disable(Scope::Dm);
        afk.enable(Scope::Both, None);
        assert_eq!(afk.try_fire(&dm("42"), false, t0 + Duration::from_secs(20)), None);
        assert_eq!(afk.try_fire(&dm("42"), false, t0 + WINDOW), Some("brb".into()));
    }

    #[test]
    fn test_suspension_is_per_conversation_and_rearmed_by_enable() {
        let mut afk = policy();
        afk.enable(Scope::Both, Some("away".into()));
        assert!(afk.suspend(&ChatId::new("100"), false));
        assert!(!afk.suspend(&ChatId::new("100"), false));

        let now = Instant::now();
        assert_eq!(afk.try_fire(&group("100"), true, now), None);
        assert_eq!(afk.try_fire(&group("200"), true, now), Some("away".into()));

        afk.enable(Scope::Dm, None);
        assert!(afk.is_suspended(&ChatId::new("100"), false));
        afk.enable(Scope::Group, None);
        assert!(!afk.is_suspended(&ChatId::new("100"), false));
        assert_eq!(afk.try_fire(&group("100"), true, now), Some("away".into()));
    }

    #[test]
    fn test_disable_reports_change() {
        let mut afk = policy();
        assert!(!afk.disable(Scope::Both));
        afk.enable(Scope::Group, None);
        assert!(afk.disable(Scope::Both));
        assert!(!afk.state().group_active);
        assert!(!afk.state().dm_active);
    }

    #[test]
    fn test_enable_keeps_message_when_omitted() {
        let mut afk = policy();
        afk.enable(Scope::Dm, Some("lunch".into()));
        afk.disable(Scope::Dm);
        afk.enable(Scope::Group, None);
        assert_eq!(afk.state().message, "lunch");
    }
}
