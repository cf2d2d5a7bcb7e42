//! Message splitting and reassembly.
//!
//! [`OutboundMessage::split`] turns a message body into an ordered parcel set
//! (header first). [`ReassemblyBuffer`] folds parcels received in any order
//! back into a body, tracks gaps, and reports which parcel is worth asking
//! for next.
//!
//! The wire carries no total-parcel count: the header checksum is the
//! completeness oracle. A buffer is complete once the header is known, the
//! data indices seen so far have no gaps, and the checksum over their
//! concatenation matches the header.

use std::collections::BTreeMap;

use crate::checksum::checksum;
use crate::{HeaderPayload, MessageId, Parcel, ParcelError, MAX_PARCEL_INDEX};

// ============================================================================
// Outbound: splitting
// ============================================================================

/// A message split into parcels, ready for transmission.
///
/// Immutable once built; the retransmission archive stores these so a
/// `/repeat` request can be answered with the original parcel text verbatim,
/// without recomputing the split.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    id: MessageId,
    sender: String,
    destination: String,
    body: String,
    parcels: Vec<String>,
}

impl OutboundMessage {
    /// Split a message body under a fresh random id.
    ///
    /// Emits the header parcel followed by `ceil(chars / chunk_size)` data
    /// parcels of at most `chunk_size` characters each, in order. A body
    /// shorter than one chunk still yields two parcels (header plus one data
    /// parcel).
    pub fn split(
        sender: &str,
        destination: &str,
        body: &str,
        chunk_size: usize,
    ) -> Result<OutboundMessage, ParcelError> {
        Self::split_with_id(MessageId::random(), sender, destination, body, chunk_size)
    }

    /// Split a message body under a caller-chosen id.
    pub fn split_with_id(
        id: MessageId,
        sender: &str,
        destination: &str,
        body: &str,
        chunk_size: usize,
    ) -> Result<OutboundMessage, ParcelError> {
        if body.is_empty() {
            return Err(ParcelError::EmptyBody);
        }
        if chunk_size == 0 {
            return Err(ParcelError::ZeroChunkSize);
        }
        let chunks = chunk_by_chars(body, chunk_size);
        if chunks.len() > MAX_PARCEL_INDEX as usize {
            return Err(ParcelError::TooManyParcels {
                needed: chunks.len(),
                max: MAX_PARCEL_INDEX,
            });
        }

        let header = HeaderPayload {
            sender: sender.to_string(),
            destination: destination.to_string(),
            checksum: checksum(body),
        };
        let mut parcels = Vec::with_capacity(1 + chunks.len());
        parcels.push(
            Parcel {
                message_id: id,
                index: 0,
                payload: header.encode(),
            }
            .encode(),
        );
        for (i, chunk) in chunks.into_iter().enumerate() {
            parcels.push(
                Parcel {
                    message_id: id,
                    index: (i + 1) as u8,
                    payload: chunk,
                }
                .encode(),
            );
        }

        Ok(OutboundMessage {
            id,
            sender: sender.to_string(),
            destination: destination.to_string(),
            body: body.to_string(),
            parcels,
        })
    }

    /// Identifier chosen for this message.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Originating station.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Destination station or broadcast marker.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The unsplit message body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// All parcel lines in transmission order, header first.
    pub fn parcels(&self) -> &[String] {
        &self.parcels
    }

    /// One parcel line by index (0 is the header).
    pub fn parcel(&self, index: u8) -> Option<&str> {
        self.parcels.get(index as usize).map(String::as_str)
    }

    /// Total parcel count, header included.
    pub fn total_parcels(&self) -> usize {
        self.parcels.len()
    }
}

/// Slice `body` into chunks of at most `chunk_size` characters, never
/// splitting inside a scalar value.
fn chunk_by_chars(body: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in body.chars() {
        current.push(ch);
        count += 1;
        if count == chunk_size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ============================================================================
// Inbound: reassembly
// ============================================================================

/// Receiver-side reconstruction state for one in-flight message.
///
/// Owned by the reassembly registry while the message is in flight; created
/// on the first parcel seen for an unseen id, retired once the message
/// completes. Indices already stored are never lost or displaced.
#[derive(Debug, Clone)]
pub struct ReassemblyBuffer {
    id: MessageId,
    header: Option<HeaderPayload>,
    chunks: BTreeMap<u8, String>,
    completed: Option<String>,
}

impl ReassemblyBuffer {
    /// Create an empty buffer for the given message id.
    pub fn new(id: MessageId) -> Self {
        ReassemblyBuffer {
            id,
            header: None,
            chunks: BTreeMap::new(),
            completed: None,
        }
    }

    /// Fold one parcel into the buffer.
    ///
    /// Returns whether the call changed buffer state, so callers can skip
    /// redundant downstream work on duplicates. Parcels for other message
    /// ids and parcels arriving after completion are ignored. The header is
    /// idempotent; data parcels are first-writer-wins, so a late corrupt
    /// duplicate never displaces a chunk that already arrived.
    pub fn fold(&mut self, parcel: &Parcel) -> bool {
        if parcel.message_id != self.id || self.completed.is_some() {
            return false;
        }
        let changed = if parcel.index == 0 {
            match (&self.header, HeaderPayload::parse(&parcel.payload)) {
                (None, Ok(header)) => {
                    self.header = Some(header);
                    true
                }
                _ => false,
            }
        } else if self.chunks.contains_key(&parcel.index) {
            false
        } else {
            self.chunks.insert(parcel.index, parcel.payload.clone());
            true
        };
        if changed {
            self.try_complete();
        }
        changed
    }

    /// Whether the message has fully and correctly reassembled.
    pub fn is_complete(&self) -> bool {
        self.completed.is_some()
    }

    /// The reconstructed body, once complete.
    pub fn body(&self) -> Option<&str> {
        self.completed.as_deref()
    }

    /// Consume the buffer, yielding header and body when complete.
    pub fn into_complete(self) -> Option<(HeaderPayload, String)> {
        match (self.header, self.completed) {
            (Some(header), Some(body)) => Some((header, body)),
            _ => None,
        }
    }

    /// Identifier of the message being reconstructed.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Sender from the header parcel, once it has arrived.
    pub fn sender(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.sender.as_str())
    }

    /// Destination from the header parcel, once it has arrived.
    pub fn destination(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.destination.as_str())
    }

    /// Expected body checksum, once the header has arrived.
    pub fn checksum(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.checksum.as_str())
    }

    /// Number of parcels received so far, header included.
    pub fn received(&self) -> usize {
        self.chunks.len() + usize::from(self.header.is_some())
    }

    /// Highest data index seen so far, if any data parcel has arrived.
    pub fn highest_index_seen(&self) -> Option<u8> {
        self.chunks.keys().next_back().copied()
    }

    /// Data indices missing below the highest index seen, ascending.
    ///
    /// The wire carries no total count, so the highest index seen acts as a
    /// provisional upper bound: receiving index 2 with no index 1 yet
    /// reports index 1 missing even before the header arrives. Tail parcels
    /// beyond the highest seen index are invisible here; they are discovered
    /// through [`ReassemblyBuffer::first_missing_index`] probing once
    /// everything below is filled.
    pub fn missing_indices(&self) -> Vec<u8> {
        let Some(highest) = self.highest_index_seen() else {
            return Vec::new();
        };
        (1..highest)
            .filter(|i| !self.chunks.contains_key(i))
            .collect()
    }

    /// The single parcel a receiver should ask for next, or `None` once the
    /// message is complete.
    ///
    /// Priority: the header while it is unknown, then the first data gap
    /// below the highest index seen, then the next index past the highest
    /// seen — an incomplete buffer with no interior gap must be missing tail
    /// parcels, and the wire carries no total count to say how many.
    /// Saturates at the index cap.
    pub fn first_missing_index(&self) -> Option<u8> {
        if self.completed.is_some() {
            return None;
        }
        if self.header.is_none() {
            return Some(0);
        }
        let Some(highest) = self.highest_index_seen() else {
            return Some(1);
        };
        if let Some(gap) = (1..highest).find(|i| !self.chunks.contains_key(i)) {
            return Some(gap);
        }
        Some(highest.saturating_add(1).min(MAX_PARCEL_INDEX))
    }

    fn try_complete(&mut self) {
        let Some(header) = &self.header else {
            return;
        };
        let Some((&highest, _)) = self.chunks.iter().next_back() else {
            return;
        };
        // Contiguity first: an interior gap means more parcels are coming.
        if self.chunks.len() != highest as usize {
            return;
        }
        let body: String = self.chunks.values().map(String::as_str).collect();
        if checksum(&body) == header.checksum {
            self.completed = Some(body);
        }
    }
}
