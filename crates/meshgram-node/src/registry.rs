//! Inbound reassembly registry.
//!
//! One [`ReassemblyBuffer`] per in-flight message id, behind a single lock.
//! Transport callbacks deliver parcels from whatever threads they run on, so
//! every public operation is a complete read-modify-write under that lock.
//!
//! The registry is bounded: at capacity it reclaims slots idle past the
//! stall timeout, then the oldest slot, so a long-running process never
//! leaks stalled partial reconstructions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use meshgram_parcel::{MessageId, Parcel, ReassemblyBuffer};
use tracing::{debug, trace};

/// A completed reconstruction, handed back when the final parcel folds in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMessage {
    /// Id the sender chose for the message.
    pub message_id: MessageId,
    /// Station that originated the message.
    pub sender: String,
    /// Destination field from the header.
    pub destination: String,
    /// Reconstructed message body.
    pub body: String,
}

/// Outcome of folding one parcel into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldOutcome {
    /// The message finished reassembling; its buffer has been retired.
    Completed(CompletedMessage),
    /// The message is still assembling.
    Pending {
        /// Whether this parcel changed buffer state (false for duplicates).
        changed: bool,
        /// The parcel worth requesting next, per the gap-detection rules.
        first_missing: u8,
    },
}

struct Slot {
    buffer: ReassemblyBuffer,
    last_update: Instant,
}

/// Process-wide table of in-flight reconstructions.
pub struct ReassemblyRegistry {
    slots: Mutex<HashMap<MessageId, Slot>>,
    max_slots: usize,
    stall_timeout: Duration,
}

impl ReassemblyRegistry {
    /// Create a registry bounded to `max_slots` concurrent reconstructions,
    /// reclaiming slots idle longer than `stall_timeout`.
    pub fn new(max_slots: usize, stall_timeout: Duration) -> Self {
        ReassemblyRegistry {
            slots: Mutex::new(HashMap::new()),
            max_slots,
            stall_timeout,
        }
    }

    /// Fold a parcel into its message's buffer, creating the buffer on first
    /// sight of the id.
    ///
    /// Completion retires the buffer; the id may be reused for a new message
    /// afterwards.
    pub fn fold(&self, parcel: &Parcel) -> FoldOutcome {
        let mut slots = self.lock();
        if !slots.contains_key(&parcel.message_id) && slots.len() >= self.max_slots {
            self.reclaim(&mut slots);
        }

        let (changed, done) = {
            let slot = slots.entry(parcel.message_id).or_insert_with(|| {
                trace!(id = %parcel.message_id, "new reassembly buffer");
                Slot {
                    buffer: ReassemblyBuffer::new(parcel.message_id),
                    last_update: Instant::now(),
                }
            });
            let changed = slot.buffer.fold(parcel);
            if changed {
                slot.last_update = Instant::now();
            }
            (changed, slot.buffer.is_complete())
        };

        if done {
            if let Some((header, body)) = slots
                .remove(&parcel.message_id)
                .and_then(|slot| slot.buffer.into_complete())
            {
                debug!(id = %parcel.message_id, chars = body.len(), "message reassembled");
                return FoldOutcome::Completed(CompletedMessage {
                    message_id: parcel.message_id,
                    sender: header.sender,
                    destination: header.destination,
                    body,
                });
            }
        }

        let first_missing = slots
            .get(&parcel.message_id)
            .and_then(|slot| slot.buffer.first_missing_index())
            .unwrap_or(0);
        FoldOutcome::Pending {
            changed,
            first_missing,
        }
    }

    /// First missing index for a message still assembling here.
    pub fn first_missing(&self, id: MessageId) -> Option<u8> {
        self.lock()
            .get(&id)
            .and_then(|slot| slot.buffer.first_missing_index())
    }

    /// Missing data indices for a message still assembling here.
    pub fn missing_indices(&self, id: MessageId) -> Vec<u8> {
        self.lock()
            .get(&id)
            .map(|slot| slot.buffer.missing_indices())
            .unwrap_or_default()
    }

    /// Number of messages currently assembling.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no message is currently assembling.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop slots idle past the stall timeout; if none qualified, drop the
    /// oldest slot so the newcomer always finds room.
    fn reclaim(&self, slots: &mut HashMap<MessageId, Slot>) {
        let now = Instant::now();
        let stalled: Vec<MessageId> = slots
            .iter()
            .filter(|(_, slot)| now.duration_since(slot.last_update) > self.stall_timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in &stalled {
            debug!(id = %id, "dropping stalled reassembly");
            slots.remove(id);
        }
        if !stalled.is_empty() {
            return;
        }
        if let Some(oldest) = slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_update)
            .map(|(id, _)| *id)
        {
            debug!(id = %oldest, "registry full, dropping oldest reassembly");
            slots.remove(&oldest);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MessageId, Slot>> {
        // A poisoned lock means another thread panicked mid-call; every
        // critical section leaves the map valid, so keep serving.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
