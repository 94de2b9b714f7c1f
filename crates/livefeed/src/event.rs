//! Events delivered to the feed consumer.

use crate::frame::DeliveryKind;
use crate::record::Notification;

/// Events emitted by a [`crate::FeedClient`] connection.
///
/// Connectivity is a plain boolean signal: `Connected`/`Disconnected` is the
/// primitive the rest of the system keys off, with no per-cause taxonomy.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Connection established and topic subscriptions registered.
    Connected,
    /// Connection lost or closed; the client keeps retrying on a fixed delay.
    Disconnected,
    /// A batch of notification records with its application mode.
    Delivery {
        kind: DeliveryKind,
        items: Vec<Notification>,
    },
    /// Server-maintained unread badge count.
    UnreadCount(u64),
}
