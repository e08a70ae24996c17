//! Session lifecycle guard
//!
//! Diagnosis data lives exactly one uninterrupted tab lifetime. The guard
//! purges the ephemeral namespace when the page is hidden or about to be
//! discarded, and unconditionally at cold start so a new diagnosis can
//! never resume stale data from a previous session.

use crate::store::{KeySpace, SessionStore, SessionStores};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Browser-originated page lifecycle signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Tab backgrounded or switched away from.
    Hidden,
    /// Page about to be discarded: close, refresh, navigation away.
    Unloading,
}

/// Purges session storage in reaction to lifecycle events.
#[derive(Clone)]
pub struct LifecycleGuard {
    stores: SessionStores,
    keys: KeySpace,
}

impl LifecycleGuard {
    pub fn new(stores: SessionStores, keys: KeySpace) -> Self {
        Self { stores, keys }
    }

    /// Cold-start purge: the ephemeral namespace plus the retained draft.
    /// Runs before anything else at the wizard entry.
    pub fn purge_at_startup(&self) {
        self.purge_session();
        self.stores.persistent.remove(&self.keys.form_draft());
        info!("session storage purged at startup");
    }

    /// Synchronously remove every namespaced key from the ephemeral store.
    /// The draft in the persistent store survives; it belongs to the tab
    /// lifetime, not the page lifetime.
    pub fn purge_session(&self) {
        self.stores.ephemeral.clear_prefix(self.keys.namespace());
    }

    pub fn handle(&self, event: PageEvent) {
        match event {
            PageEvent::Hidden | PageEvent::Unloading => {
                debug!(?event, "purging session storage");
                self.purge_session();
            }
        }
    }

    /// Spawn the listener task; it runs until the event channel closes.
    pub fn install(&self, mut events: broadcast::Receiver<PageEvent>) -> JoinHandle<()> {
        let guard = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => guard.handle(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Every event is a purge trigger, so catching up
                        // means purging once.
                        debug!(skipped, "lifecycle events lagged");
                        guard.purge_session();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
