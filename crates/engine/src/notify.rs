//! Transient user notifications (toasts), drained by the frontend.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Bounded FIFO of pending toasts. The oldest is dropped when full.
#[derive(Debug, Clone)]
pub struct Notifications {
    queue: VecDeque<Notification>,
    capacity: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl Notifications {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NotificationLevel::Error => log::error!("{message}"),
            _ => log::info!("{message}"),
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification { level, message });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.queue.back()
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let mut toasts = Notifications::default();
        toasts.info("copied");
        toasts.error("server said no");
        let drained = toasts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].level, NotificationLevel::Error);
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_oldest_dropped_when_full() {
        let mut toasts = Notifications::with_capacity(2);
        toasts.info("a");
        toasts.info("b");
        toasts.success("c");
        let messages: Vec<String> = toasts.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }
}
