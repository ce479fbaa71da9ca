//! # Broadcast Scheduler
//!
//! Owns the repeating send loops, one per target. Starting a loop for a target that already has one
//! cancels the old loop and waits for it to exit before the new one is spawned, so a send still in
//! flight from the old loop always lands first. Loops stop cooperatively: the stop flag is checked
//! before every send and interrupts the sleep between sends.
//!
//! A rate-limited send pauses the loop for the signaled backoff. A permanently refused send ends the
//! loop, which then removes its own registry entry and leaves a note for the next `status`.

use crate::domain::error::DeliveryError;
use crate::domain::traits::Transport;
use crate::domain::types::ChatId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Read-only view of a running broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastInfo {
    pub target: ChatId,
    pub message: String,
    pub interval: Duration,
    pub sent: u64,
    pub backoffs: u64,
}

/// A loop that ended itself because the target refused delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminatedBroadcast {
    pub target: ChatId,
    pub reason: String,
}

#[derive(Debug, Default)]
struct LoopStats {
    sent: AtomicU64,
    backoffs: AtomicU64,
}

struct TaskEntry {
    generation: u64,
    message: String,
    interval: Duration,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    stats: Arc<LoopStats>,
}

impl TaskEntry {
    fn cancel(self) -> JoinHandle<()> {
        let _ = self.stop.send(true);
        self.handle
    }

    /// Cancels and waits for the loop to exit. The registry lock must not be held.
    async fn finish(self, target: &ChatId) {
        if let Err(e) = self.cancel().await {
            tracing::warn!(chat = %target, "Broadcast loop ended abnormally: {}", e);
        }
    }
}

type Registry = Arc<Mutex<HashMap<ChatId, TaskEntry>>>;

pub struct BroadcastScheduler {
    transport: Arc<dyn Transport>,
    tasks: Registry,
    /// Serializes `start` calls while they wait for a replaced loop.
    starting: Mutex<()>,
    terminated: Arc<Mutex<Vec<TerminatedBroadcast>>>,
    next_generation: AtomicU64,
    default_backoff: Duration,
}

impl BroadcastScheduler {
    pub fn new(transport: Arc<dyn Transport>, default_backoff: Duration) -> Self {
        Self {
            transport,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            starting: Mutex::new(()),
            terminated: Arc::new(Mutex::new(Vec::new())),
            next_generation: AtomicU64::new(1),
            default_backoff,
        }
    }

    /// Starts broadcasting `message` to `target` every `interval`.
    /// Returns whether an earlier broadcast to the same target was replaced.
    pub async fn start(&self, target: ChatId, message: String, interval: Duration) -> bool {
        let _starting = self.starting.lock().await;

        // The old loop may need the registry lock to retire, so it is released before waiting.
        let previous = self.tasks.lock().await.remove(&target);
        let replaced = previous.is_some();
        if let Some(previous) = previous {
            previous.finish(&target).await;
        }

        // Held across the spawn so a loop that fails at once retires its own entry.
        let mut tasks = self.tasks.lock().await;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (stop, stop_rx) = watch::channel(false);
        let stats = Arc::new(LoopStats::default());
        let unit = BroadcastLoop {
            target: target.clone(),
            message: message.clone(),
            interval,
            generation,
            default_backoff: self.default_backoff,
            transport: self.transport.clone(),
            tasks: self.tasks.clone(),
            terminated: self.terminated.clone(),
            stats: stats.clone(),
        };
        let handle = tokio::spawn(unit.run(stop_rx));

        tracing::info!(chat = %target, interval_secs = interval.as_secs(), replaced, "Broadcast started");
        tasks.insert(
            target,
            TaskEntry {
                generation,
                message,
                interval,
                stop,
                handle,
                stats,
            },
        );
        replaced
    }

    /// Cancels the broadcast to `target` and waits for its loop to exit.
    /// Returns whether one was running.
    pub async fn stop(&self, target: &ChatId) -> bool {
        let entry = self.tasks.lock().await.remove(target);
        match entry {
            Some(entry) => {
                entry.finish(target).await;
                tracing::info!(chat = %target, "Broadcast stopped");
                true
            }
            None => false,
        }
    }

    /// Cancels every broadcast and waits for the loops to exit. Returns how many were running.
    pub async fn stop_all(&self) -> usize {
        let handles = self.cancel_all().await;
        let count = handles.len();
        futures::future::join_all(handles).await;
        tracing::info!("Stopped {} broadcasts", count);
        count
    }

    /// Cancels every broadcast and waits up to `grace` for the loops to exit.
    pub async fn shutdown(&self, grace: Duration) {
        let handles = self.cancel_all().await;
        if handles.is_empty() {
            return;
        }
        let count = handles.len();
        if tokio::time::timeout(grace, futures::future::join_all(handles))
            .await
            .is_err()
        {
            tracing::warn!("{} broadcast loops did not exit within {:?}", count, grace);
        }
    }

    async fn cancel_all(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = self.tasks.lock().await;
        tasks.drain().map(|(_, entry)| entry.cancel()).collect()
    }

    pub async fn active_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn snapshot(&self) -> Vec<BroadcastInfo> {
        let tasks = self.tasks.lock().await;
        let mut infos: Vec<BroadcastInfo> = tasks
            .iter()
            .map(|(target, entry)| BroadcastInfo {
                target: target.clone(),
                message: entry.message.clone(),
                interval: entry.interval,
                sent: entry.stats.sent.load(Ordering::Relaxed),
                backoffs: entry.stats.backoffs.load(Ordering::Relaxed),
            })
            .collect();
        infos.sort_by(|a, b| a.target.cmp(&b.target));
        infos
    }

    /// Broadcasts that ended themselves since the last call.
    pub async fn take_terminated(&self) -> Vec<TerminatedBroadcast> {
        std::mem::take(&mut *self.terminated.lock().await)
    }
}

/// State moved into one spawned loop.
struct BroadcastLoop {
    target: ChatId,
    message: String,
    interval: Duration,
    generation: u64,
    default_backoff: Duration,
    transport: Arc<dyn Transport>,
    tasks: Registry,
    terminated: Arc<Mutex<Vec<TerminatedBroadcast>>>,
    stats: Arc<LoopStats>,
}

impl BroadcastLoop {
    async fn run(self, mut stop: watch::Receiver<bool>) {
        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let wait = match self.transport.send_message(&self.target, &self.message).await {
                Ok(()) => {
                    self.stats.sent.fetch_add(1, Ordering::Relaxed);
                    self.interval
                }
                Err(DeliveryError::Transient { reason, retry_after }) => {
                    let backoff = retry_after.unwrap_or(self.default_backoff);
                    self.stats.backoffs.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        chat = %self.target,
                        "Broadcast send failed ({}), backing off {:?}",
                        reason,
                        backoff
                    );
                    backoff
                }
                Err(DeliveryError::Permanent { reason }) => {
                    tracing::error!(chat = %self.target, "Broadcast refused, stopping loop: {}", reason);
                    self.retire(reason).await;
                    return;
                }
            };

            let deadline = Instant::now() + wait;
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = stop.changed() => break,
            }
        }
        tracing::debug!(chat = %self.target, "Broadcast loop exited");
    }

    /// Removes this loop's registry entry, unless a newer loop already took the target.
    async fn retire(&self, reason: String) {
        {
            let mut tasks = self.tasks.lock().await;
            if tasks.get(&self.target).map(|entry| entry.generation) == Some(self.generation) {
                tasks.remove(&self.target);
            } else {
                return;
            }
        }
        self.terminated.lock().await.push(TerminatedBroadcast {
            target: self.target.clone(),
            reason,
        });
    }
}
