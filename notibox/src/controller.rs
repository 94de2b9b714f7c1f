//! Session controller: wires the HTTP gateway, the live feed, and the store.
//!
//! Initialization order: the HTTP baseline loads first (its failure empties
//! the list but never blocks the live path), then the live path starts at
//! most once per session. Commands mutate local state optimistically and
//! mirror to the server over the live channel when connected, over HTTP
//! otherwise; mirror failures raise toasts and are never rolled back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use livefeed::{FeedClient, FeedEvent, FeedEvents};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::Error;
use crate::api::NotificationGateway;
use crate::store::NotificationStore;
use crate::toast::Toast;

/// Confirmation seam for destructive commands.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything. Used for `--yes` runs and non-interactive contexts.
pub struct AutoConfirm;

#[async_trait]
impl ConfirmPrompt for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub struct NotificationCenter {
    gateway: Arc<dyn NotificationGateway>,
    feed: Arc<FeedClient>,
    store: Arc<NotificationStore>,
    confirm: Arc<dyn ConfirmPrompt>,
    live_started: AtomicBool,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationCenter {
    pub fn new(
        gateway: Arc<dyn NotificationGateway>,
        feed: Arc<FeedClient>,
        store: Arc<NotificationStore>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        Self {
            gateway,
            feed,
            store,
            confirm,
            live_started: AtomicBool::new(false),
            pump: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Load the authoritative HTTP baseline.
    ///
    /// Failure empties the list and surfaces a toast; it never propagates,
    /// and the live path still starts afterwards.
    pub async fn load_baseline(&self) {
        match self.gateway.fetch_all().await {
            Ok(batch) => {
                debug!(count = batch.len(), "Loaded notification baseline");
                self.store.replace_all(batch);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load notification baseline");
                self.store.clear();
                self.store.toast(Toast::error("Failed to load notifications"));
            }
        }
    }

    /// Start the live path. Guarded to run at most once per session.
    ///
    /// A rejected connect raises a warning toast and is not retried here;
    /// the client's own fixed-delay reconnection policy governs retries.
    pub async fn start_live(&self, token: &str, events: FeedEvents) {
        if self.live_started.swap(true, Ordering::SeqCst) {
            debug!("Live path already started");
            return;
        }

        // Pump first, so nothing delivered during connect is lost.
        let store = Arc::clone(&self.store);
        *self.pump.lock() = Some(tokio::spawn(pump_events(events, store)));

        if let Err(e) = self.feed.connect(token).await {
            warn!(error = %e, "Live channel connect failed");
            self.store.toast(Toast::warning(
                "Live updates unavailable, retrying in the background",
            ));
        }
    }

    /// Flip the read state of one notification, optimistically.
    ///
    /// The flip is applied synchronously before any network call and is kept
    /// even when the mirror fails: last local write wins until the next full
    /// reload. Only the unread-to-read direction has a server command; a
    /// flip back to unread stays local.
    pub async fn toggle_read(&self, id: &str) {
        let Some(now_read) = self.store.toggle_read(id) else {
            debug!(id, "Ignoring toggle for unknown notification");
            return;
        };
        if !now_read {
            return;
        }

        let mirror = if self.feed.is_connected() {
            self.feed.mark_read(id).await.map_err(Error::from)
        } else {
            self.gateway.mark_read(id).await
        };

        if let Err(e) = mirror {
            warn!(id, error = %e, "Failed to mirror read state");
            self.store.toast(Toast::error("Failed to update notification"));
        }
    }

    /// Delete one notification after confirmation.
    ///
    /// No network call and no mutation until confirmed, and no optimistic
    /// removal: the record leaves local state only once the server call
    /// succeeds.
    pub async fn delete(&self, id: &str) {
        if !self.confirm.confirm("Delete this notification?").await {
            return;
        }

        match self.gateway.delete(id).await {
            Ok(()) => {
                self.store.remove(id);
                self.store.toast(Toast::success("Notification deleted"));
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete notification");
                self.store.toast(Toast::error("Failed to delete notification"));
            }
        }
    }

    /// Mark everything as read.
    ///
    /// The unread count is scoped to the active filter and search: when it
    /// is zero this issues no network call at all. Otherwise one mark-all
    /// command goes out and every record in local state goes read, beyond
    /// the filter scope, while the toast reports the scope count the user
    /// acted on.
    pub async fn mark_all_read(&self) {
        let scope_count = self.store.unread_in_view();
        if scope_count == 0 {
            self.store.toast(Toast::info("No unread notifications"));
            return;
        }

        let mirror = if self.feed.is_connected() {
            self.feed.mark_all_read().await.map_err(Error::from)
        } else {
            self.gateway.mark_all_read().await
        };

        self.store.mark_all_read_local();

        match mirror {
            Ok(()) => self.store.toast(Toast::success(format!(
                "Marked {scope_count} unread notifications as read"
            ))),
            Err(e) => {
                warn!(error = %e, "Failed to mirror mark-all-read");
                self.store
                    .toast(Toast::error("Failed to mark notifications as read"));
            }
        }
    }

    /// Delete every notification in the active filter + search scope, after
    /// confirmation.
    ///
    /// Deletes run sequentially; each record leaves local state only after
    /// its own call succeeds, and the first failure aborts the remainder.
    /// Already-deleted records stay removed; no partial-success count is
    /// reported to the user.
    pub async fn clear_all(&self) {
        let targets = self.store.filtered();
        if targets.is_empty() {
            self.store.toast(Toast::info("No notifications to clear"));
            return;
        }

        let prompt = format!("Delete {} notifications?", targets.len());
        if !self.confirm.confirm(&prompt).await {
            return;
        }

        let mut cleared = 0usize;
        for record in &targets {
            match self.gateway.delete(&record.id).await {
                Ok(()) => {
                    self.store.remove(&record.id);
                    cleared += 1;
                }
                Err(e) => {
                    warn!(id = %record.id, cleared, error = %e, "Clear aborted on first failure");
                    self.store.toast(Toast::error("Failed to clear notifications"));
                    return;
                }
            }
        }

        self.store
            .toast(Toast::success(format!("Cleared {cleared} notifications")));
    }

    /// Tear down the live path.
    ///
    /// In-flight HTTP futures are not aborted; their late results are
    /// discarded with the session.
    pub async fn shutdown(&self) {
        self.feed.disconnect().await;
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }
}

/// Forward feed events into the store for the session lifetime.
async fn pump_events(mut events: FeedEvents, store: Arc<NotificationStore>) {
    while let Some(event) = events.recv().await {
        match event {
            FeedEvent::Connected => {
                debug!("Live channel connected");
                store.set_connected(true);
            }
            FeedEvent::Disconnected => {
                debug!("Live channel disconnected");
                store.set_connected(false);
            }
            FeedEvent::Delivery { kind, items } => store.apply(kind, items),
            FeedEvent::UnreadCount(count) => store.set_server_unread(count),
        }
    }
}
