//! Controller-level tests driven through a mock gateway: optimistic
//! toggles, confirmation gates, mark-all scoping, and sequential clear
//! semantics.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::TryRecvError;

use livefeed::{FeedClient, FeedConfig, Notification, NotificationKind};
use notibox::api::NotificationGateway;
use notibox::controller::{AutoConfirm, ConfirmPrompt, NotificationCenter};
use notibox::error::{Error, Result};
use notibox::store::NotificationStore;
use notibox::store::view::ReadFilter;
use notibox::toast::ToastLevel;

fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
}

fn record(id: &str, minute: u32, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        title: format!("title-{id}"),
        message: format!("message-{id}"),
        kind: NotificationKind::Info,
        read,
        created_at: ts(minute),
        action_url: None,
        related_entity: None,
    }
}

#[derive(Default)]
struct MockGateway {
    baseline: Vec<Notification>,
    fail_fetch: bool,
    fail_mark_read: bool,
    fail_mark_all: bool,
    fail_delete_ids: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn push_call(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl NotificationGateway for MockGateway {
    async fn fetch_all(&self) -> Result<Vec<Notification>> {
        self.push_call("fetch_all");
        if self.fail_fetch {
            return Err(Error::other("fetch failed"));
        }
        Ok(self.baseline.clone())
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        self.push_call(format!("mark_read:{id}"));
        if self.fail_mark_read {
            return Err(Error::other("mark failed"));
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.push_call("mark_all_read");
        if self.fail_mark_all {
            return Err(Error::other("mark-all failed"));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.push_call(format!("delete:{id}"));
        if self.fail_delete_ids.contains(id) {
            return Err(Error::other("delete failed"));
        }
        Ok(())
    }
}

struct NeverConfirm;

#[async_trait]
impl ConfirmPrompt for NeverConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// The feed is never connected in these tests, so every mirror call takes
/// the HTTP path through the mock gateway.
fn center_with(
    gateway: Arc<MockGateway>,
    confirm: Arc<dyn ConfirmPrompt>,
) -> (NotificationCenter, Arc<NotificationStore>) {
    let store = Arc::new(NotificationStore::new(10));
    let (feed, _events) = FeedClient::new(FeedConfig::new("ws://localhost:1/feed"));
    let center =
        NotificationCenter::new(gateway, Arc::new(feed), Arc::clone(&store), confirm);
    (center, store)
}

#[tokio::test]
async fn start_live_connect_failure_warns_and_keeps_retrying_in_background() {
    let gateway = Arc::new(MockGateway::default());
    let store = Arc::new(NotificationStore::new(10));
    // Nothing listens on the discard port, so the first attempt fails fast.
    let (feed, events) = FeedClient::new(FeedConfig {
        reconnect_delay: Duration::from_millis(50),
        ..FeedConfig::new("ws://127.0.0.1:9/feed")
    });
    let center = NotificationCenter::new(
        gateway,
        Arc::new(feed),
        Arc::clone(&store),
        Arc::new(AutoConfirm),
    );
    let mut toasts = store.subscribe_toasts();

    center.start_live("token", events).await;

    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Warning);
    assert!(!store.connected());
    center.shutdown().await;
}

#[tokio::test]
async fn baseline_failure_empties_list_and_toasts() {
    let gateway = Arc::new(MockGateway {
        fail_fetch: true,
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    store.replace_all(vec![record("stale", 0, false)]);
    let mut toasts = store.subscribe_toasts();

    center.load_baseline().await;

    assert!(store.is_empty());
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn baseline_success_replaces_wholesale() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false), record("2", 2, false)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    store.replace_all(vec![record("stale", 0, false)]);

    center.load_baseline().await;

    assert_eq!(store.len(), 2);
    assert!(store.get("stale").is_none());
}

#[tokio::test]
async fn toggle_read_keeps_optimistic_flip_when_mirror_fails() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false)],
        fail_mark_read: true,
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.toggle_read("1").await;

    assert!(store.get("1").unwrap().read, "flip retained, no rollback");
    assert_eq!(gateway.calls(), vec!["fetch_all", "mark_read:1"]);
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn toggle_back_to_unread_is_local_only() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, true)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;

    center.toggle_read("1").await;

    assert!(!store.get("1").unwrap().read);
    assert_eq!(gateway.calls(), vec!["fetch_all"], "no mirror for the unread direction");
}

#[tokio::test]
async fn delete_declined_confirmation_touches_nothing() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(NeverConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.delete("1").await;

    assert!(store.get("1").is_some());
    assert_eq!(gateway.calls(), vec!["fetch_all"]);
    assert!(matches!(toasts.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn delete_removes_only_after_server_success() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.delete("1").await;

    assert!(store.get("1").is_none());
    assert_eq!(gateway.calls(), vec!["fetch_all", "delete:1"]);
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Success);
}

#[tokio::test]
async fn delete_failure_retains_the_record() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false)],
        fail_delete_ids: HashSet::from(["1".to_string()]),
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.delete("1").await;

    assert!(store.get("1").is_some(), "no optimistic removal for delete");
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn mark_all_with_zero_unread_in_scope_issues_no_calls() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, true)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    store.set_filter(ReadFilter::Unread);
    let mut toasts = store.subscribe_toasts();

    center.mark_all_read().await;

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Info);
}

#[tokio::test]
async fn mark_all_goes_beyond_the_filter_scope_but_toasts_its_count() {
    // 3 unread of 10; the command affects all records, the toast counts
    // only the unread within the active filter.
    let mut baseline: Vec<Notification> =
        (0..7u32).map(|i| record(&format!("r{i}"), i, true)).collect();
    baseline.extend((7..10u32).map(|i| record(&format!("u{i}"), i, false)));

    let gateway = Arc::new(MockGateway {
        baseline,
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    store.set_filter(ReadFilter::Unread);
    let mut toasts = store.subscribe_toasts();

    center.mark_all_read().await;

    assert_eq!(gateway.calls(), vec!["fetch_all", "mark_all_read"]);
    assert_eq!(store.len(), 10);
    assert!(store.filtered().is_empty(), "nothing unread remains");
    store.set_filter(ReadFilter::Read);
    assert_eq!(store.filtered().len(), 10, "all 10 went read, not just the 3");

    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Success);
    assert_eq!(toast.message, "Marked 3 unread notifications as read");
}

#[tokio::test]
async fn mark_all_failure_keeps_optimistic_state() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false)],
        fail_mark_all: true,
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.mark_all_read().await;

    assert!(store.get("1").unwrap().read, "optimistic all-read retained");
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn clear_all_declined_confirmation_issues_no_deletes() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(NeverConfirm));
    center.load_baseline().await;

    center.clear_all().await;

    assert_eq!(gateway.calls(), vec!["fetch_all"]);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn clear_all_aborts_on_first_failure() {
    // Sorted newest-first the scope is [3, 2, 1]; the delete of "2" fails.
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false), record("2", 2, false), record("3", 3, false)],
        fail_delete_ids: HashSet::from(["2".to_string()]),
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.clear_all().await;

    assert_eq!(gateway.calls(), vec!["fetch_all", "delete:3", "delete:2"]);
    assert!(store.get("3").is_none(), "successful deletes stay removed");
    assert!(store.get("2").is_some());
    assert!(store.get("1").is_some(), "remainder untouched after the abort");
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn clear_all_reports_the_cleared_count_on_success() {
    let gateway = Arc::new(MockGateway {
        baseline: vec![record("1", 1, false), record("2", 2, true)],
        ..Default::default()
    });
    let (center, store) = center_with(Arc::clone(&gateway), Arc::new(AutoConfirm));
    center.load_baseline().await;
    let mut toasts = store.subscribe_toasts();

    center.clear_all().await;

    assert!(store.is_empty());
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Success);
    assert_eq!(toast.message, "Cleared 2 notifications");
}
