//! Staging-directory teardown on host release and on application termination.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, info, warn};

use crate::application::staging::StagingSlot;
use crate::application::surface::{SubscriptionId, TerminationNotifier};
use crate::infra::lock::mutex_lock;

const LOG_TARGET: &str = "application::lifecycle";

/// Owns the termination subscription for one host's staging directory.
///
/// Teardown runs on whichever comes first: the host being released or the
/// application announcing termination. The directory is removed once.
pub struct LifecycleManager {
    slot: StagingSlot,
    notifier: Option<Arc<dyn TerminationNotifier>>,
    subscription: Option<SubscriptionId>,
    /// Cleared by the termination callback once it has fired.
    armed: Arc<AtomicBool>,
}

impl LifecycleManager {
    pub fn new(slot: StagingSlot, notifier: Option<Arc<dyn TerminationNotifier>>) -> Self {
        Self {
            slot,
            notifier,
            subscription: None,
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to termination once a staging directory exists.
    ///
    /// A no-op while a subscription is armed. After termination has fired,
    /// the next call subscribes again so a recreated directory is covered.
    pub fn watch_termination(&mut self) {
        if self.armed.load(Ordering::Acquire) {
            return;
        }
        let Some(notifier) = self.notifier.as_ref() else {
            debug!(
                target = LOG_TARGET,
                op = "lifecycle::watch",
                result = "no_notifier",
                "No termination notifier; staging removed on release only"
            );
            return;
        };

        let slot = Arc::clone(&self.slot);
        let armed = Arc::clone(&self.armed);
        self.armed.store(true, Ordering::Release);
        let id = notifier.subscribe(Box::new(move || {
            armed.store(false, Ordering::Release);
            teardown_slot(&slot, "termination");
        }));
        self.subscription = Some(id);

        debug!(
            target = LOG_TARGET,
            op = "lifecycle::watch",
            result = "subscribed",
            subscription = id.get(),
            "Watching for application termination"
        );
    }

    pub fn is_subscribed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Unsubscribe and remove the staging directory. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let (Some(id), Some(notifier)) = (self.subscription.take(), self.notifier.as_ref()) {
            notifier.unsubscribe(id);
        }
        self.armed.store(false, Ordering::Release);
        teardown_slot(&self.slot, "release");
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Remove whatever the slot holds. Failures are logged and never propagated.
fn teardown_slot(slot: &StagingSlot, trigger: &'static str) {
    let location = mutex_lock(slot, LOG_TARGET, "lifecycle::teardown").take();
    let Some(location) = location else {
        return;
    };

    let path = location.path().to_path_buf();
    match location.remove() {
        Ok(()) => info!(
            target = LOG_TARGET,
            op = "lifecycle::teardown",
            result = "removed",
            trigger,
            staging_dir = %path.display(),
            "Staging directory removed"
        ),
        Err(err) if err.kind() == io::ErrorKind::NotFound => debug!(
            target = LOG_TARGET,
            op = "lifecycle::teardown",
            result = "already_gone",
            trigger,
            staging_dir = %path.display(),
            "Staging directory was already removed"
        ),
        Err(err) => warn!(
            target = LOG_TARGET,
            op = "lifecycle::teardown",
            result = "error",
            trigger,
            staging_dir = %path.display(),
            error = %err,
            "Failed to remove staging directory"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::application::staging::ResourceMaterializer;
    use crate::infra::assets::TemplateAssets;
    use crate::infra::termination::TerminationHub;

    fn staged(root: &TempDir) -> (ResourceMaterializer, std::path::PathBuf) {
        let materializer =
            ResourceMaterializer::new(TemplateAssets::bundled(), root.path().to_path_buf());
        let (dir, _) = materializer.ensure_staging().expect("staging");
        (materializer, dir)
    }

    #[test]
    fn release_removes_directory_and_unsubscribes() {
        let root = TempDir::new().expect("root");
        let (materializer, dir) = staged(&root);
        let hub = Arc::new(TerminationHub::new());

        let mut lifecycle = LifecycleManager::new(materializer.slot(), Some(hub.clone()));
        lifecycle.watch_termination();
        lifecycle.watch_termination();
        assert_eq!(hub.subscriber_count(), 1);

        drop(lifecycle);

        assert!(!dir.exists());
        assert_eq!(hub.subscriber_count(), 0);
        assert!(materializer.staging_dir().is_none());
    }

    #[test]
    fn termination_removes_directory_before_release() {
        let root = TempDir::new().expect("root");
        let (materializer, dir) = staged(&root);
        let hub = Arc::new(TerminationHub::new());

        let mut lifecycle = LifecycleManager::new(materializer.slot(), Some(hub.clone()));
        lifecycle.watch_termination();

        assert_eq!(hub.notify(), 1);
        assert!(!dir.exists());

        // Release afterwards finds nothing left to delete.
        lifecycle.teardown();
        assert!(!dir.exists());
    }

    #[test]
    fn recreated_directory_is_watched_again_after_termination() {
        let root = TempDir::new().expect("root");
        let (materializer, first) = staged(&root);
        let hub = Arc::new(TerminationHub::new());

        let mut lifecycle = LifecycleManager::new(materializer.slot(), Some(hub.clone()));
        lifecycle.watch_termination();
        assert_eq!(hub.notify(), 1);
        assert!(!first.exists());
        assert!(!lifecycle.is_subscribed());

        let (second, _) = materializer.ensure_staging().expect("staging again");
        lifecycle.watch_termination();
        assert!(lifecycle.is_subscribed());

        assert_eq!(hub.notify(), 1);
        assert!(!second.exists());
    }

    #[test]
    fn externally_deleted_directory_is_tolerated() {
        let root = TempDir::new().expect("root");
        let (materializer, dir) = staged(&root);

        let mut lifecycle = LifecycleManager::new(materializer.slot(), None);
        fs::remove_dir_all(&dir).expect("external delete");

        lifecycle.teardown();
        assert!(materializer.staging_dir().is_none());
    }

    #[test]
    fn without_notifier_no_subscription_is_made() {
        let root = TempDir::new().expect("root");
        let (materializer, dir) = staged(&root);

        let mut lifecycle = LifecycleManager::new(materializer.slot(), None);
        lifecycle.watch_termination();

        assert!(!lifecycle.is_subscribed());
        drop(lifecycle);
        assert!(!dir.exists());
    }
}
