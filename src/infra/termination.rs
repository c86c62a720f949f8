//! In-process application-termination notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::info;

use crate::application::surface::{SubscriptionId, TerminationCallback, TerminationNotifier};

/// Fan-out point for "the application is about to exit".
///
/// The binary wires this to Ctrl-C; embedders call [`TerminationHub::notify`]
/// from their own shutdown hook. Each subscriber runs at most once.
#[derive(Default)]
pub struct TerminationHub {
    next_id: AtomicU64,
    subscribers: DashMap<u64, TerminationCallback>,
}

impl TerminationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run and drop every current subscriber. Returns how many ran.
    pub fn notify(&self) -> usize {
        let ids: Vec<u64> = self.subscribers.iter().map(|entry| *entry.key()).collect();

        let mut fired = 0;
        for id in ids {
            // Removed before running so the callback may unsubscribe or re-enter freely.
            if let Some((_id, callback)) = self.subscribers.remove(&id) {
                callback();
                fired += 1;
            }
        }

        info!(
            target = "infra::termination",
            op = "termination::notify",
            subscribers = fired,
            "Termination subscribers notified"
        );
        fired
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl TerminationNotifier for TerminationHub {
    fn subscribe(&self, callback: TerminationCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, callback);
        SubscriptionId::new(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(&id.get());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn notify_runs_each_subscriber_once() {
        let hub = TerminationHub::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            hub.subscribe(Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(hub.notify(), 3);
        assert_eq!(hub.notify(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribed_callbacks_never_run() {
        let hub = TerminationHub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = hub.subscribe(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        hub.unsubscribe(id);

        assert_eq!(hub.notify(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
