//! Livefeed: client library for live notification feeds.
//!
//! Maintains one persistent WebSocket connection per authenticated session,
//! subscribes to the per-user and broadcast topics, decodes push frames into
//! notification records, and forwards them to a single consumer. Commands
//! (mark-read, mark-all-read) are fire-and-forget.
//!
//! ## Core Types
//!
//! - [`Notification`] - A single notification record
//! - [`FeedClient`] - Connection lifecycle and command publishing
//! - [`FeedEvents`] - Single-consumer event stream
//! - [`FeedEvent`] - Connectivity, deliveries, unread badge updates
//! - [`DeliveryKind`] - Whether a batch replaces (replay) or merges (delta)

pub mod client;
pub mod error;
pub mod event;
pub mod frame;
pub mod record;

pub use client::{FeedClient, FeedConfig, FeedEvents};
pub use error::{FeedError, Result};
pub use event::FeedEvent;
pub use frame::{ClientFrame, DeliveryKind, ServerFrame, Topic};
pub use record::{Notification, NotificationKind};
