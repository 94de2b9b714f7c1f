//! Terminal rendering: toasts, notification tables, relative timestamps.

use chrono::{DateTime, Utc};
use colored::Colorize;
use livefeed::Notification;
use tabled::{Table, Tabled, settings::Style};

use crate::store::view::NotificationView;
use crate::toast::{Toast, ToastLevel};

const MESSAGE_COLUMN_WIDTH: usize = 48;

/// Print one toast to stderr, keeping stdout for command output.
pub fn print_toast(toast: &Toast) {
    let tag = match toast.level {
        ToastLevel::Success => "ok".green().bold(),
        ToastLevel::Info => "info".cyan().bold(),
        ToastLevel::Warning => "warn".yellow().bold(),
        ToastLevel::Error => "error".red().bold(),
    };
    eprintln!("[{tag}] {}", toast.message);
}

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "")]
    unread: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "When")]
    age: String,
}

impl NotificationRow {
    fn from_record(record: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            unread: if record.read { " " } else { "*" },
            id: record.id.clone(),
            kind: record.kind.as_str(),
            title: record.title.clone(),
            message: truncate(&record.message, MESSAGE_COLUMN_WIDTH),
            age: time_ago(record.created_at, now),
        }
    }
}

/// Print the current page of the derived view.
pub fn print_view(view: &NotificationView) {
    if view.items.is_empty() {
        println!("No notifications.");
    } else {
        let now = Utc::now();
        let rows: Vec<NotificationRow> = view
            .items
            .iter()
            .map(|record| NotificationRow::from_record(record, now))
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    let badge = match view.server_unread {
        Some(count) => format!(", {count} unread reported by server"),
        None => String::new(),
    };
    println!(
        "Page {}/{} ({} of {} notifications{badge})",
        view.page, view.page_count, view.filtered, view.total
    );
}

/// Relative "time ago" rendering for a timestamp.
pub fn time_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(ts);
    if delta.num_seconds() < 60 {
        "just now".to_string()
    } else if delta.num_minutes() < 60 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_hours() < 24 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}d ago", delta.num_days())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    shortened.push_str("...");
    shortened
}
