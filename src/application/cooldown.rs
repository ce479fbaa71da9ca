//! # Cooldown Tracker
//!
//! Per-subject "last fired" table. Consulted on every event (pull model), so there are no
//! reset timers to leak.

use crate::domain::types::ChatId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Entries are only pruned once the table grows past this.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CooldownCheck {
    Ready,
    Cooling { remaining: Duration },
}

#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    last_fired: HashMap<ChatId, Instant>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: HashMap::new(),
        }
    }

    pub fn check(&self, subject: &ChatId, now: Instant) -> CooldownCheck {
        match self.last_fired.get(subject) {
            Some(last) => {
                let elapsed = now.saturating_duration_since(*last);
                if elapsed < self.window {
                    CooldownCheck::Cooling {
                        remaining: self.window - elapsed,
                    }
                } else {
                    CooldownCheck::Ready
                }
            }
            None => CooldownCheck::Ready,
        }
    }

    /// Claims the slot for `subject` if its window has passed.
    ///
    /// The timestamp is recorded here, before the reply is delivered, so a second event arriving
    /// while the first reply is in flight sees the subject as cooling.
    pub fn try_acquire(&mut self, subject: &ChatId, now: Instant) -> bool {
        if self.check(subject, now) != CooldownCheck::Ready {
            return false;
        }
        if self.last_fired.len() >= PRUNE_THRESHOLD {
            self.prune(now);
        }
        self.last_fired.insert(subject.clone(), now);
        true
    }

    pub fn forget(&mut self, subject: &ChatId) {
        self.last_fired.remove(subject);
    }

    pub fn reset(&mut self) {
        self.last_fired.clear();
    }

    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.last_fired
            .retain(|_, last| now.saturating_duration_since(*last) < window);
    }
}
