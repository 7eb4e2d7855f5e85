//! Notification outbox for slot decisions.
//!
//! Every accepted or cancelled visit produces a [`TourEvent`]. The outbox
//! keeps a bounded log of recent events for polling clients and fans new
//! events out over a broadcast channel for live subscribers. Delivery is
//! best effort: publishing never fails and never blocks slot processing.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::api::{SlotId, TourCode};

/// How many recent events the outbox retains for polling clients.
pub const EVENT_LOG_CAPACITY: usize = 256;

/// Broadcast channel depth per subscriber before it starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What happened to a tour's place in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourEventKind {
    /// The tour holds a seat in the slot.
    Accepted,
    /// The tour lost or gave up its place.
    Cancelled,
}

impl std::fmt::Display for TourEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TourEventKind::Accepted => write!(f, "accepted"),
            TourEventKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A single slot decision.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TourEvent {
    /// Monotonic sequence number, unique per outbox
    pub seq: u64,
    pub kind: TourEventKind,
    pub tour_code: TourCode,
    pub slot_id: SlotId,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

struct OutboxInner {
    next_seq: AtomicU64,
    recent: RwLock<VecDeque<TourEvent>>,
    sender: broadcast::Sender<TourEvent>,
}

/// In-memory event outbox.
///
/// Cloning is cheap and clones share the same log and channel.
#[derive(Clone)]
pub struct NotificationOutbox {
    inner: Arc<OutboxInner>,
}

impl NotificationOutbox {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(OutboxInner {
                next_seq: AtomicU64::new(1),
                recent: RwLock::new(VecDeque::with_capacity(EVENT_LOG_CAPACITY)),
                sender,
            }),
        }
    }

    /// Record an event and fan it out to subscribers.
    ///
    /// Returns the published event. A send error only means nobody is
    /// subscribed right now, which is fine.
    pub fn publish(&self, kind: TourEventKind, tour_code: TourCode, slot_id: SlotId) -> TourEvent {
        let event = TourEvent {
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            kind,
            tour_code,
            slot_id,
            occurred_at: chrono::Utc::now(),
        };

        {
            let mut recent = self.inner.recent.write();
            if recent.len() == EVENT_LOG_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(event.clone());
        }

        let _ = self.inner.sender.send(event.clone());
        event
    }

    pub fn accepted(&self, tour_code: TourCode, slot_id: SlotId) -> TourEvent {
        self.publish(TourEventKind::Accepted, tour_code, slot_id)
    }

    pub fn cancelled(&self, tour_code: TourCode, slot_id: SlotId) -> TourEvent {
        self.publish(TourEventKind::Cancelled, tour_code, slot_id)
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TourEvent> {
        self.inner.sender.subscribe()
    }

    /// Snapshot of the retained log, oldest first.
    pub fn recent(&self) -> Vec<TourEvent> {
        self.inner.recent.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.recent.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.recent.read().is_empty()
    }
}

impl Default for NotificationOutbox {
    fn default() -> Self {
        Self::new()
    }
}
