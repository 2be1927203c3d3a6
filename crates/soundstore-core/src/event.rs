//! Event bus for soundstore using tokio::broadcast
//!
//! Lets frontends react to cache refreshes, failures and rating patches
//! without polling the store.

use std::fmt;
use tokio::sync::broadcast;

/// Kind of cache entry an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Products,
    Deals,
    Categories,
    CategoryProducts,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Products => "products",
            EntryKind::Deals => "deals",
            EntryKind::Categories => "categories",
            EntryKind::CategoryProducts => "category-products",
        };
        f.write_str(name)
    }
}

/// Events emitted by the product cache
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// Flat product list was refetched
    ProductsRefreshed { count: usize },
    /// Deal list was refetched
    DealsRefreshed { count: usize },
    /// Category list was refetched
    CategoriesRefreshed { count: usize },
    /// One category bucket was refetched
    CategoryRefreshed { category_id: String, count: usize },
    /// A fetch failed and the entry now carries an error
    FetchFailed { kind: EntryKind, message: String },
    /// A rating update was applied to cached copies of a product
    RatingPatched { product_id: String, copies: usize },
    /// All entries were reset
    Cleared,
}

impl CacheEvent {
    /// Entry the event concerns; `None` for rating patches and clears
    pub fn entry_kind(&self) -> Option<EntryKind> {
        match self {
            CacheEvent::ProductsRefreshed { .. } => Some(EntryKind::Products),
            CacheEvent::DealsRefreshed { .. } => Some(EntryKind::Deals),
            CacheEvent::CategoriesRefreshed { .. } => Some(EntryKind::Categories),
            CacheEvent::CategoryRefreshed { .. } => Some(EntryKind::CategoryProducts),
            CacheEvent::FetchFailed { kind, .. } => Some(*kind),
            CacheEvent::RatingPatched { .. } | CacheEvent::Cleared => None,
        }
    }
}

/// Broadcast fan-out of [`CacheEvent`]s
///
/// Clones share one channel. Slow subscribers lag and miss old events
/// rather than blocking the cache.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    /// Send to every live subscriber; returns how many received it
    pub fn publish(&self, event: CacheEvent) -> usize {
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::trace!(delivered, "Cache event published");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(CacheEvent::ProductsRefreshed { count: 3 });
        bus.publish(CacheEvent::RatingPatched {
            product_id: "p1".to_string(),
            copies: 2,
        });

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, CacheEvent::ProductsRefreshed { count: 3 }));

        let event2 = rx.recv().await.unwrap();
        assert!(
            matches!(event2, CacheEvent::RatingPatched { product_id, copies } if product_id == "p1" && copies == 2)
        );
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.clone().subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(CacheEvent::Cleared);

        assert!(matches!(rx1.recv().await.unwrap(), CacheEvent::Cleared));
        assert!(matches!(rx2.recv().await.unwrap(), CacheEvent::Cleared));
    }

    #[test]
    fn test_publish_without_subscribers_delivers_nothing() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(CacheEvent::Cleared), 0);

        let _rx = bus.subscribe();
        assert_eq!(bus.publish(CacheEvent::Cleared), 1);
    }

    #[test]
    fn test_entry_kind_of_events() {
        let failed = CacheEvent::FetchFailed {
            kind: EntryKind::Deals,
            message: "HTTP 503".to_string(),
        };
        assert_eq!(failed.entry_kind(), Some(EntryKind::Deals));
        assert_eq!(
            CacheEvent::CategoryRefreshed {
                category_id: "c1".to_string(),
                count: 2
            }
            .entry_kind(),
            Some(EntryKind::CategoryProducts)
        );
        assert_eq!(CacheEvent::Cleared.entry_kind(), None);
    }

    #[test]
    fn test_entry_kind_display() {
        assert_eq!(EntryKind::CategoryProducts.to_string(), "category-products");
    }
}
