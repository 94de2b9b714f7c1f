//! Derived view logic: read filter, search, pagination.
//!
//! Views are recomputed on demand from the store, never cached.

use livefeed::Notification;

/// Read-state filter. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    pub fn matches(&self, record: &Notification) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !record.read,
            Self::Read => record.read,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

/// Case-insensitive substring match against title OR message.
///
/// An empty term matches everything.
pub fn matches_search(record: &Notification, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    record.title.to_lowercase().contains(&term) || record.message.to_lowercase().contains(&term)
}

/// One page of the derived view.
#[derive(Debug, Clone)]
pub struct NotificationView {
    /// Records on the current page, newest first
    pub items: Vec<Notification>,
    /// Current page, 1-based, clamped to the available range
    pub page: usize,
    /// Number of pages in the filtered result (at least 1)
    pub page_count: usize,
    /// Records in local state, ignoring filter and search
    pub total: usize,
    /// Records within the active filter + search scope
    pub filtered: usize,
    /// Unread records within the active filter + search scope
    pub unread_in_filter: usize,
    /// Unread badge count as last reported by the server
    pub server_unread: Option<u64>,
    /// Whether the live channel is currently connected
    pub connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use livefeed::NotificationKind;

    fn record(title: &str, message: &str, read: bool) -> Notification {
        Notification {
            id: "1".to_string(),
            title: title.to_string(),
            message: message.to_string(),
            kind: NotificationKind::Info,
            read,
            created_at: Utc::now(),
            action_url: None,
            related_entity: None,
        }
    }

    #[test]
    fn test_read_filter_matches() {
        let unread = record("t", "m", false);
        let read = record("t", "m", true);

        assert!(ReadFilter::All.matches(&unread));
        assert!(ReadFilter::All.matches(&read));
        assert!(ReadFilter::Unread.matches(&unread));
        assert!(!ReadFilter::Unread.matches(&read));
        assert!(ReadFilter::Read.matches(&read));
        assert!(!ReadFilter::Read.matches(&unread));
    }

    #[test]
    fn test_search_is_case_insensitive_or_match() {
        let n = record("Offer Approved", "procurement request #42", false);

        assert!(matches_search(&n, ""));
        assert!(matches_search(&n, "offer"));
        assert!(matches_search(&n, "OFFER"));
        assert!(matches_search(&n, "#42"));
        assert!(!matches_search(&n, "warehouse"));
    }
}
