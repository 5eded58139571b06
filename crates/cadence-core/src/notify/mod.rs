//! Notification delivery.
//!
//! The tracker hands every [`Notice`] to a [`Notifier`] after releasing its
//! locks and only logs delivery failures. Implementations that may block
//! (desktop toasts, mail, sound) belong behind a [`QueuedNotifier`] so a
//! slow channel never stalls a tick.

mod queue;
mod terminal;

pub use queue::QueuedNotifier;
pub use terminal::TerminalNotifier;

use std::sync::{Mutex, PoisonError};

use crate::error::NotifyError;
use crate::events::{Notice, NoticeKind};

/// Every notification channel implements this trait.
pub trait Notifier: Send + Sync {
    /// Deliver one notice. Errors are reported but never retried by the
    /// tracker.
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Discards everything. Used when notifications are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuteNotifier;

impl Notifier for MuteNotifier {
    fn notify(&self, _notice: &Notice) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Logs notices through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        match notice.kind {
            NoticeKind::Overdue => tracing::warn!(
                goal_id = %notice.goal_id,
                kind = ?notice.kind,
                "{}",
                notice.message()
            ),
            _ => tracing::info!(
                goal_id = %notice.goal_id,
                kind = ?notice.kind,
                "{}",
                notice.message()
            ),
        }
        Ok(())
    }
}

/// Keeps every delivered notice in memory.
///
/// Hosts that poll for changes (a GUI, a test) read them back with
/// [`MemoryNotifier::drain`].
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take everything delivered so far.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of delivered notices of the given kind.
    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::GoalId;
    use chrono::Utc;

    fn notice(kind: NoticeKind) -> Notice {
        Notice {
            goal_id: GoalId::from("g1"),
            label: "Drink water".into(),
            kind,
            at: Utc::now(),
        }
    }

    #[test]
    fn memory_notifier_counts_and_drains() {
        let notifier = MemoryNotifier::new();
        notifier.notify(&notice(NoticeKind::Overdue)).unwrap();
        notifier.notify(&notice(NoticeKind::Completed)).unwrap();
        notifier.notify(&notice(NoticeKind::Overdue)).unwrap();

        assert_eq!(notifier.count(NoticeKind::Overdue), 2);
        assert_eq!(notifier.drain().len(), 3);
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn mute_and_tracing_never_fail() {
        assert!(MuteNotifier.notify(&notice(NoticeKind::Created)).is_ok());
        assert!(TracingNotifier.notify(&notice(NoticeKind::Overdue)).is_ok());
    }
}
