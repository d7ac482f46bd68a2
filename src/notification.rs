// src/notification.rs
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    #[serde(skip)]
    expires_at: Instant,
}

struct Queue {
    next_id: u64,
    items: Vec<Notification>,
}

/// Transient status messages shown to the user
pub struct NotificationCenter {
    ttl: Duration,
    queue: Mutex<Queue>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            queue: Mutex::new(Queue {
                next_id: 1,
                items: Vec::new(),
            }),
        }
    }

    /// The queue holds plain data, so a panic elsewhere leaves it usable
    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|poisoned| {
            warn!("Notification queue lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            NotificationLevel::Error => error!("Notification: {}", message),
            _ => info!("Notification: {}", message),
        }

        let mut queue = self.queue();
        let now = Instant::now();
        queue.items.retain(|n| n.expires_at > now);
        let id = queue.next_id;
        queue.next_id += 1;
        queue.items.push(Notification {
            id,
            level,
            message,
            expires_at: now + self.ttl,
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationLevel::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationLevel::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationLevel::Info, message)
    }

    /// Unexpired notifications, oldest first; expired ones are dropped
    pub fn active(&self) -> Vec<Notification> {
        let mut queue = self.queue();
        let now = Instant::now();
        queue.items.retain(|n| n.expires_at > now);
        queue.items.clone()
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue();
        let before = queue.items.len();
        queue.items.retain(|n| n.id != id);
        queue.items.len() != before
    }
}
