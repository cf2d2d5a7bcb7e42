//! Outbound retransmission archive.
//!
//! Every message this node originates is kept in memory so peers can ask for
//! individual parcels back with `/repeat`. The archive is bounded: when an
//! insert finds it at capacity, a retention pass removes entries older than
//! the configured window, and if churn within the window alone exceeds
//! capacity the whole archive is cleared as an emergency measure.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use meshgram_parcel::{MessageId, OutboundMessage};
use tracing::{debug, warn};

/// An immutable record of a sent message.
#[derive(Debug, Clone)]
struct ArchivedMessage {
    parcels: Vec<String>,
    stored_at: Instant,
}

/// Bounded cache of recently sent messages, serving retransmission requests.
pub struct RetransmissionArchive {
    entries: Mutex<HashMap<MessageId, ArchivedMessage>>,
    max_entries: usize,
    retention: Duration,
}

impl RetransmissionArchive {
    /// Create an archive bounded to `max_entries` with the given retention
    /// window.
    pub fn new(max_entries: usize, retention: Duration) -> Self {
        RetransmissionArchive {
            entries: Mutex::new(HashMap::new()),
            max_entries,
            retention,
        }
    }

    /// Store a sent message so its parcels can be replayed later.
    ///
    /// Idempotent per message id: a second insert under the same id is a
    /// no-op and does not refresh the stored timestamp.
    pub fn insert(&self, message: &OutboundMessage) {
        let mut entries = self.lock();
        if entries.contains_key(&message.id()) {
            return;
        }
        if entries.len() >= self.max_entries {
            self.cleanup(&mut entries);
        }
        entries.insert(
            message.id(),
            ArchivedMessage {
                parcels: message.parcels().to_vec(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Look up one parcel of an archived message for resending, verbatim.
    ///
    /// `None` when the message is unknown (expired, evicted, or never ours)
    /// or the index is out of range; the requester simply times out.
    pub fn parcel(&self, id: MessageId, index: u8) -> Option<String> {
        let entries = self.lock();
        let archived = entries.get(&id)?;
        archived.parcels.get(index as usize).cloned()
    }

    /// Whether a message is currently archived.
    pub fn contains(&self, id: MessageId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of archived messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the archive holds nothing.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn cleanup(&self, entries: &mut HashMap<MessageId, ArchivedMessage>) {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, archived| now.duration_since(archived.stored_at) <= self.retention);
        if entries.len() < before {
            debug!(expired = before - entries.len(), "archive retention pass");
        }
        if entries.len() >= self.max_entries {
            // Churn inside the retention window alone exceeds capacity.
            warn!(dropped = entries.len(), "archive over capacity, clearing all entries");
            entries.clear();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MessageId, ArchivedMessage>> {
        // A poisoned lock means another thread panicked mid-call; every
        // critical section leaves the map valid, so keep serving.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ids over the full alphanumeric alphabet, enough for > 1000 distinct
    /// messages despite the two-character field.
    fn distinct_ids(count: usize) -> Vec<MessageId> {
        let alphabet: Vec<char> = ('A'..='Z').chain('a'..='z').chain('0'..='9').collect();
        let mut ids = Vec::with_capacity(count);
        'outer: for a in &alphabet {
            for b in &alphabet {
                ids.push(MessageId::parse(&format!("{a}{b}")).unwrap());
                if ids.len() == count {
                    break 'outer;
                }
            }
        }
        ids
    }

    fn message(id: MessageId) -> OutboundMessage {
        OutboundMessage::split_with_id(id, "CR7BBQ-15", "ANY", "archived body", 40).unwrap()
    }

    #[test]
    fn test_serves_archived_parcels_verbatim() {
        let archive = RetransmissionArchive::new(10, Duration::from_secs(3600));
        let msg = message(MessageId::parse("QM").unwrap());
        archive.insert(&msg);

        assert_eq!(archive.parcel(msg.id(), 0).as_deref(), msg.parcel(0));
        assert_eq!(archive.parcel(msg.id(), 1).as_deref(), msg.parcel(1));
        // Out of range: nothing to resend.
        assert_eq!(archive.parcel(msg.id(), 5), None);
        // Unknown id: requester times out.
        assert_eq!(archive.parcel(MessageId::parse("ZZ").unwrap(), 0), None);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let archive = RetransmissionArchive::new(10, Duration::from_secs(3600));
        let msg = message(MessageId::parse("QM").unwrap());
        archive.insert(&msg);
        archive.insert(&msg);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_emergency_clear_at_capacity() {
        let archive = RetransmissionArchive::new(1000, Duration::from_secs(3600));
        let ids = distinct_ids(1001);
        for &id in &ids {
            archive.insert(&message(id));
        }

        // The 1001st insert found 1000 fresh entries: the retention pass
        // removed nothing, so the whole archive was cleared before the
        // insert went through.
        assert_eq!(archive.len(), 1);
        assert!(archive.contains(ids[1000]));
        for &id in &ids[..1000] {
            assert_eq!(archive.parcel(id, 0), None, "cleared entry must be gone");
        }
    }

    #[test]
    fn test_retention_pass_spares_fresh_entries() {
        let archive = RetransmissionArchive::new(2, Duration::from_secs(3600));
        let ids = distinct_ids(3);
        archive.insert(&message(ids[0]));
        archive.insert(&message(ids[1]));

        // Backdate the first entry past the retention window.
        let Some(expired) = Instant::now().checked_sub(Duration::from_secs(7200)) else {
            return; // platform cannot represent the past instant
        };
        archive
            .lock()
            .get_mut(&ids[0])
            .expect("entry present")
            .stored_at = expired;

        archive.insert(&message(ids[2]));
        assert_eq!(archive.len(), 2);
        assert!(!archive.contains(ids[0]), "expired entry must age out");
        assert!(archive.contains(ids[1]));
        assert!(archive.contains(ids[2]));
    }
}
