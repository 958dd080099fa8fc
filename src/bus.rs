//! Per-room ordered event fan-out.
//!
//! Each room owns one [`RoomBus`]. The orchestrator stamps events with a
//! room-monotonic sequence number while it holds the room lock, then hands
//! the stamped batch to the bus *after* releasing the lock. Because two
//! operations can race between stamping and delivery, the bus keeps a
//! small reorder buffer and only fans out in sequence order, so every
//! subscriber observes events exactly in production order (delivery is
//! at-least-once around snapshots; `seq` makes duplicates harmless).
//!
//! Slow subscribers get a bounded buffer; on overflow the subscriber is
//! dropped and must resubscribe for a fresh snapshot.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::{EventEnvelope, GameEvent, RoomSnapshot};

/// Subscribers per room before the list spills to the heap.
const TYPICAL_SUBSCRIBERS: usize = 8;

struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<Arc<EventEnvelope>>,
    /// Envelopes with `seq <= min_seq` are already covered by the
    /// snapshot this subscriber received; skip them.
    min_seq: u64,
}

struct BusInner {
    subscribers: SmallVec<[Subscriber; TYPICAL_SUBSCRIBERS]>,
    /// Stamped-but-undelivered envelopes, keyed by sequence number.
    pending: BTreeMap<u64, Arc<EventEnvelope>>,
    /// Next sequence number to fan out.
    next_seq: u64,
    closed: bool,
}

/// Handle returned by [`RoomBus::subscribe`]; the first received event is
/// always the `Snapshot`.
pub struct EventStream {
    pub id: Uuid,
    rx: mpsc::Receiver<Arc<EventEnvelope>>,
}

impl EventStream {
    /// Next envelope, or `None` once the bus closed or dropped this
    /// subscriber for falling behind.
    pub async fn recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.rx.recv().await
    }
}

/// Ordered, bounded, per-room broadcast channel.
pub struct RoomBus {
    inner: Mutex<BusInner>,
    buffer_size: usize,
}

impl RoomBus {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: Mutex::new(BusInner {
                subscribers: SmallVec::new(),
                pending: BTreeMap::new(),
                next_seq: 1,
                closed: false,
            }),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Register a subscriber.
    ///
    /// Must be called while the caller holds the room lock, with a snapshot
    /// built from that same locked state: that is what guarantees no event
    /// can be stamped between snapshot and registration.
    pub fn subscribe(&self, snapshot: RoomSnapshot) -> EventStream {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let id = Uuid::new_v4();
        let min_seq = snapshot.last_seq;

        let envelope = Arc::new(EventEnvelope {
            seq: min_seq,
            event: GameEvent::Snapshot(snapshot),
        });
        // Capacity is >= 1 and the channel is brand new.
        let _ = tx.try_send(envelope);

        let mut inner = self.lock();
        if !inner.closed {
            inner.subscribers.push(Subscriber { id, tx, min_seq });
        }
        // On a closed bus the sender drops here and the stream yields only
        // the snapshot before ending.
        EventStream { id, rx }
    }

    /// Hand a stamped batch to the bus for in-order fan-out.
    ///
    /// Called after the room lock is released. Batches may arrive out of
    /// order relative to their stamps; the reorder buffer restores the
    /// production order before anything reaches a subscriber.
    pub fn deliver(&self, batch: Vec<EventEnvelope>) {
        if batch.is_empty() {
            return;
        }
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        for envelope in batch {
            inner.pending.insert(envelope.seq, Arc::new(envelope));
        }
        Self::flush(&mut inner);
    }

    fn flush(inner: &mut BusInner) {
        while let Some(envelope) = inner.pending.remove(&inner.next_seq) {
            inner.next_seq += 1;

            let mut dropped: SmallVec<[Uuid; 2]> = SmallVec::new();
            for subscriber in &inner.subscribers {
                if envelope.seq <= subscriber.min_seq {
                    continue;
                }
                match subscriber.tx.try_send(Arc::clone(&envelope)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(
                            subscriber_id = %subscriber.id,
                            seq = envelope.seq,
                            "subscriber buffer overflow, dropping subscriber"
                        );
                        dropped.push(subscriber.id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dropped.push(subscriber.id);
                    }
                }
            }
            if !dropped.is_empty() {
                inner.subscribers.retain(|s| !dropped.contains(&s.id));
            }
        }
    }

    /// Remove a subscriber explicitly (transport disconnect).
    pub fn unsubscribe(&self, id: Uuid) {
        self.lock().subscribers.retain(|s| s.id != id);
    }

    /// Deliver nothing further and disconnect everyone. Idempotent.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.subscribers.clear();
        inner.pending.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
