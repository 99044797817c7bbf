//! # Event Broadcaster
//!
//! Maintains the live set of observers and delivers discrete events and
//! periodic status snapshots to each of them.
//!
//! ## Delivery Model
//!
//! Every subscriber owns a bounded `mpsc` queue. [`EventBroadcaster::publish`]
//! only ever calls `try_send`, so it never waits on a peer:
//!
//! - queue has room → event enqueued;
//! - queue full → event dropped for that subscriber only, warning logged;
//! - queue closed → subscriber detached.
//!
//! The periodic snapshot is produced inside each subscriber's own delivery
//! loop ([`Subscription::recv`]) from the [`StateStore`], so it never takes
//! queue capacity away from discrete events. Events queued for a subscriber
//! are always yielded before the next snapshot, in publish order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Interval, MissedTickBehavior};
use uuid::Uuid;

use zvonek_core::{DoorEvent, HubMessage, StateStore};

/// Broadcaster tuning.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Capacity of each subscriber's event queue. Clamped to at least 1.
    pub queue_capacity: usize,
    /// Period of the status snapshot sent to every subscriber.
    pub status_interval: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            status_interval: Duration::from_secs(2),
        }
    }
}

/// Opaque subscriber identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of one [`EventBroadcaster::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the event was enqueued for.
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub dropped: usize,
    /// Subscribers found disconnected and detached.
    pub detached: usize,
}

#[derive(Debug)]
struct Inner {
    store: StateStore,
    config: BroadcasterConfig,
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<HubMessage>>>,
    dropped_total: AtomicU64,
}

impl Inner {
    fn remove(&self, id: SubscriberId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }
}

/// Fan-out hub for door events.
///
/// Cloneable handle; all clones share one subscriber set.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    inner: Arc<Inner>,
}

impl EventBroadcaster {
    /// Create a broadcaster reading snapshots from `store`.
    pub fn new(store: StateStore, config: BroadcasterConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                subscribers: RwLock::new(HashMap::new()),
                dropped_total: AtomicU64::new(0),
            }),
        }
    }

    /// Register a new subscriber. Returns immediately.
    ///
    /// Dropping the returned [`Subscription`] detaches it.
    pub fn attach(&self) -> Subscription {
        let id = SubscriberId(Uuid::new_v4());
        let (tx, rx) = mpsc::channel(self.inner.config.queue_capacity.max(1));
        let count = {
            let mut subscribers = self.inner.subscribers.write();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        tracing::info!(subscriber_id = %id, subscribers = count, "subscriber attached");

        Subscription {
            id,
            rx,
            ticker: None,
            status_interval: self.inner.config.status_interval,
            store: self.inner.store.clone(),
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscriber. Idempotent; returns whether it was still attached.
    pub fn detach(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            tracing::info!(subscriber_id = %id, "subscriber detached");
        }
        removed
    }

    /// Enqueue `event` for every attached subscriber without blocking.
    pub fn publish(&self, event: DoorEvent) -> PublishReport {
        let message = HubMessage::Event(event);
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        {
            let subscribers = self.inner.subscribers.read();
            for (id, tx) in subscribers.iter() {
                match tx.try_send(message) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        report.dropped += 1;
                        tracing::warn!(
                            subscriber_id = %id,
                            event = event.kind(),
                            "subscriber queue full; dropping event"
                        );
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        for id in closed {
            if self.inner.remove(id) {
                report.detached += 1;
                tracing::warn!(subscriber_id = %id, "delivery failed; subscriber detached");
            }
        }

        if report.dropped > 0 {
            self.inner
                .dropped_total
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
        tracing::debug!(
            event = event.kind(),
            delivered = report.delivered,
            dropped = report.dropped,
            detached = report.detached,
            "event published"
        );
        report
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Events dropped because a subscriber queue was full, since start.
    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped_total.load(Ordering::Relaxed)
    }

    /// The store snapshots are read from.
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }
}

/// One attached observer.
///
/// Owns the receiving end of the subscriber queue and the status ticker.
/// Dropping it detaches the subscriber and frees the queue.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<HubMessage>,
    ticker: Option<Interval>,
    status_interval: Duration,
    store: StateStore,
    hub: Weak<Inner>,
}

impl Subscription {
    /// This subscriber's identifier.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message to deliver.
    ///
    /// Queued events take priority; otherwise the next status tick yields a
    /// fresh snapshot. The first tick fires immediately so a new observer
    /// converges at once. Returns `None` once the subscriber has been
    /// detached and its queue drained.
    pub async fn recv(&mut self) -> Option<HubMessage> {
        let period = self.status_interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        tokio::select! {
            biased;
            queued = self.rx.recv() => queued,
            _ = ticker.tick() => Some(HubMessage::Status(self.store.read())),
        }
    }

    /// Take the next queued event without waiting. Status ticks are not
    /// produced here.
    pub fn try_recv_queued(&mut self) -> Option<HubMessage> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            if hub.remove(self.id) {
                tracing::info!(subscriber_id = %self.id, "subscriber detached");
            }
        }
    }
}
