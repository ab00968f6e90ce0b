//! Progress reporting
//!
//! Each node reports within its own local window: `total_steps` is
//! `1 + children`, step 1 is the node's own capabilities, step `1 + i` is
//! the completion of its `i`-th child. Callers wanting a tree-wide
//! percentage aggregate events themselves.

use crate::id::NodeId;
use tokio::sync::mpsc;

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Node whose scope this event belongs to
    pub node: NodeId,
    /// Human-readable message
    pub message: String,
    /// Step reached within the node's scope
    pub current_step: usize,
    /// Steps in the node's scope (`1 + children`)
    pub total_steps: usize,
}

impl ProgressEvent {
    /// Create new event
    #[inline]
    #[must_use]
    pub fn new(
        node: NodeId,
        message: impl Into<String>,
        current_step: usize,
        total_steps: usize,
    ) -> Self {
        Self {
            node,
            message: message.into(),
            current_step,
            total_steps,
        }
    }

    /// Percentage of the node's local window
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_complete(&self) -> f64 {
        if self.total_steps == 0 {
            return 100.0;
        }
        self.current_step as f64 / self.total_steps as f64 * 100.0
    }
}

/// Receiver of progress events
pub trait ProgressObserver: Send + Sync {
    /// Handle one event
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event);
    }
}

/// Channel-based progress: events are forwarded to a receiver task
impl ProgressObserver for mpsc::UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        if self.send(event).is_err() {
            tracing::trace!("progress receiver dropped");
        }
    }
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressObserver for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn percent_complete() {
        let e = ProgressEvent::new(NodeId::new(), "x", 1, 4);
        assert!((e.percent_complete() - 25.0).abs() < f64::EPSILON);
        let done = ProgressEvent::new(NodeId::new(), "x", 4, 4);
        assert!((done.percent_complete() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closure_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |e: ProgressEvent| seen.lock().push(e.current_step);
        observer.report(ProgressEvent::new(NodeId::new(), "a", 1, 2));
        observer.report(ProgressEvent::new(NodeId::new(), "b", 2, 2));
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn channel_observer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.report(ProgressEvent::new(NodeId::new(), "a", 1, 1));
        drop(tx);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "a");
        assert!(rx.recv().await.is_none());
    }
}
