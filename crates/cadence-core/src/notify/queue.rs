//! Fire-and-forget delivery.
//!
//! [`QueuedNotifier::notify`] only enqueues; a background task delivers each
//! notice through the wrapped notifier on the blocking pool, bounded by a
//! timeout. A full queue drops the notice instead of waiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Notifier;
use crate::error::NotifyError;
use crate::events::Notice;

pub struct QueuedNotifier {
    tx: mpsc::Sender<Notice>,
}

impl QueuedNotifier {
    /// Start the delivery task on the current tokio runtime.
    ///
    /// The task ends once every `QueuedNotifier` handle is dropped and the
    /// queue is drained.
    pub fn spawn(
        inner: Arc<dyn Notifier>,
        capacity: usize,
        timeout: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Notice>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(notice) = rx.recv().await {
                let goal_id = notice.goal_id.clone();
                let kind = notice.kind;
                let inner = inner.clone();
                let delivery = tokio::task::spawn_blocking(move || inner.notify(&notice));

                match tokio::time::timeout(timeout, delivery).await {
                    Ok(Ok(Ok(()))) => debug!(%goal_id, ?kind, "notice delivered"),
                    Ok(Ok(Err(e))) => warn!(%goal_id, ?kind, error = %e, "notice delivery failed"),
                    Ok(Err(e)) => warn!(%goal_id, ?kind, error = %e, "notice delivery panicked"),
                    Err(elapsed) => {
                        let e = NotifyError::from(elapsed);
                        warn!(%goal_id, ?kind, error = %e, "notice delivery abandoned");
                    }
                }
            }
            debug!("notification queue closed");
        });

        (Self { tx }, handle)
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.tx.try_send(notice.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                NotifyError::QueueUnavailable("queue full, notice dropped".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                NotifyError::QueueUnavailable("delivery task stopped".into())
            }
        })
    }
}
