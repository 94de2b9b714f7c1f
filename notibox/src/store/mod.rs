//! Notification store: single source of truth for the visible list.
//!
//! Reconciles two delivery paths into one deduplicated, sorted collection:
//! the one-shot HTTP baseline replaces the list wholesale, while live
//! deliveries either replace it (replay) or merge into it (delta). The list
//! has exactly one owner; the live client only hands batches to [`apply`]
//! through the controller, and every mutation happens under the store lock,
//! so merges are atomic with respect to each other. Optimistic command
//! writes interleave with merges in arrival order: last write wins.
//!
//! [`apply`]: NotificationStore::apply

pub mod view;

use std::collections::HashSet;

use livefeed::{DeliveryKind, Notification};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::toast::Toast;
use view::{NotificationView, ReadFilter, matches_search};

const TOAST_CAPACITY: usize = 64;

struct StoreState {
    notifications: Vec<Notification>,
    filter: ReadFilter,
    search: String,
    page: usize,
    connected: bool,
    server_unread: Option<u64>,
}

pub struct NotificationStore {
    state: RwLock<StoreState>,
    page_size: usize,
    toast_tx: broadcast::Sender<Toast>,
}

impl NotificationStore {
    pub fn new(page_size: usize) -> Self {
        let (toast_tx, _) = broadcast::channel(TOAST_CAPACITY);

        Self {
            state: RwLock::new(StoreState {
                notifications: Vec::new(),
                filter: ReadFilter::default(),
                search: String::new(),
                page: 1,
                connected: false,
                server_unread: None,
            }),
            page_size: page_size.max(1),
            toast_tx,
        }
    }

    /// Subscribe to toast events.
    pub fn subscribe_toasts(&self) -> broadcast::Receiver<Toast> {
        self.toast_tx.subscribe()
    }

    /// Emit a toast. Ignores the error case of no active subscribers.
    pub(crate) fn toast(&self, toast: Toast) {
        let _ = self.toast_tx.send(toast);
    }

    /// Replace the list wholesale with an authoritative baseline.
    pub fn replace_all(&self, mut batch: Vec<Notification>) {
        sort_newest_first(&mut batch);
        self.state.write().notifications = batch;
    }

    /// Empty the list (baseline fetch failure).
    pub fn clear(&self) {
        self.state.write().notifications.clear();
    }

    /// Merge one live delivery into local state.
    ///
    /// Replays replace the baseline and never raise toasts. Deltas drop
    /// every id already present (the last baseline or last local optimistic
    /// write stays authoritative for that id), prepend the remainder, and
    /// re-sort; fresh records raise a toast.
    pub fn apply(&self, kind: DeliveryKind, items: Vec<Notification>) {
        match kind {
            DeliveryKind::Replay => {
                debug!(count = items.len(), "Applying replay");
                self.replace_all(items);
            }
            DeliveryKind::Delta => {
                let toast = {
                    let mut state = self.state.write();
                    let mut seen: HashSet<String> =
                        state.notifications.iter().map(|n| n.id.clone()).collect();
                    let fresh: Vec<Notification> = items
                        .into_iter()
                        .filter(|n| seen.insert(n.id.clone()))
                        .collect();

                    if fresh.is_empty() {
                        // Duplicate-only delta: silently dropped.
                        return;
                    }

                    let toast = if fresh.len() == 1 {
                        Toast::info(format!("New: {}", fresh[0].title))
                    } else {
                        Toast::info(format!("{} new notifications", fresh.len()))
                    };

                    debug!(count = fresh.len(), "Applying delta");
                    state.notifications.splice(0..0, fresh);
                    sort_newest_first(&mut state.notifications);
                    toast
                };
                self.toast(toast);
            }
        }
    }

    /// Flip the read state of one record. Returns the new value, or `None`
    /// when the id is unknown.
    pub fn toggle_read(&self, id: &str) -> Option<bool> {
        let mut state = self.state.write();
        let record = state.notifications.iter_mut().find(|n| n.id == id)?;
        record.read = !record.read;
        Some(record.read)
    }

    /// Optimistically mark every record in local state as read.
    pub fn mark_all_read_local(&self) {
        for record in self.state.write().notifications.iter_mut() {
            record.read = true;
        }
    }

    /// Remove one record. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        state.notifications.len() != before
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.write().connected = connected;
    }

    pub fn connected(&self) -> bool {
        self.state.read().connected
    }

    pub fn set_server_unread(&self, count: u64) {
        self.state.write().server_unread = Some(count);
    }

    /// Change the read filter; resets pagination to page 1.
    pub fn set_filter(&self, filter: ReadFilter) {
        let mut state = self.state.write();
        state.filter = filter;
        state.page = 1;
    }

    pub fn filter(&self) -> ReadFilter {
        self.state.read().filter
    }

    /// Change the search term; resets pagination to page 1.
    pub fn set_search(&self, term: impl Into<String>) {
        let mut state = self.state.write();
        state.search = term.into();
        state.page = 1;
    }

    pub fn set_page(&self, page: usize) {
        self.state.write().page = page.max(1);
    }

    pub fn len(&self) -> usize {
        self.state.read().notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().notifications.is_empty()
    }

    /// Look up one record by id.
    pub fn get(&self, id: &str) -> Option<Notification> {
        self.state
            .read()
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// Records within the active filter + search scope, across all pages.
    pub fn filtered(&self) -> Vec<Notification> {
        let state = self.state.read();
        state
            .notifications
            .iter()
            .filter(|n| state.filter.matches(n) && matches_search(n, &state.search))
            .cloned()
            .collect()
    }

    /// Unread records within the active filter + search scope.
    pub fn unread_in_view(&self) -> usize {
        let state = self.state.read();
        state
            .notifications
            .iter()
            .filter(|n| state.filter.matches(n) && matches_search(n, &state.search) && !n.read)
            .count()
    }

    /// Compute the current page of the derived view.
    pub fn view(&self) -> NotificationView {
        let state = self.state.read();
        let filtered: Vec<&Notification> = state
            .notifications
            .iter()
            .filter(|n| state.filter.matches(n) && matches_search(n, &state.search))
            .collect();

        let unread_in_filter = filtered.iter().filter(|n| !n.read).count();
        let filtered_count = filtered.len();
        let page_count = filtered_count.div_ceil(self.page_size).max(1);
        let page = state.page.min(page_count);
        let items = filtered
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect();

        NotificationView {
            items,
            page,
            page_count,
            total: state.notifications.len(),
            filtered: filtered_count,
            unread_in_filter,
            server_unread: state.server_unread,
            connected: state.connected,
        }
    }
}

fn sort_newest_first(records: &mut [Notification]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
