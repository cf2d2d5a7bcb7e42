//! Parcel wire format.
//!
//! Every transmission unit is a single text line:
//!
//! ```text
//! +----+-------+---+-------------------------+
//! | id | index | : | payload                 |
//! +----+-------+---+-------------------------+
//!   2      2     1   up to chunk-size chars
//! ```
//!
//! Index `00` marks the header parcel; its payload is
//! `<sender>:<destination>:<checksum>`. Every other index carries a slice of
//! the message body, taken verbatim after the first `:` — a body containing
//! `:` is never ambiguous in a data parcel.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    ParcelError, BROADCAST_DESTINATION, CHECKSUM_LEN, INDEX_DIGITS, MAX_PARCEL_INDEX,
    MESSAGE_ID_LEN,
};

// ============================================================================
// Message identifiers
// ============================================================================

/// A two-character message identifier.
///
/// Chosen by the sender at split time. The two-character space is small and
/// collisions between concurrent senders on a shared channel are an accepted
/// protocol risk; uniqueness only needs to hold while the message is in
/// flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId([u8; MESSAGE_ID_LEN]);

impl MessageId {
    /// Generate a random identifier from the uppercase alphabet.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let mut id = [0u8; MESSAGE_ID_LEN];
        for byte in &mut id {
            *byte = rng.gen_range(b'A'..=b'Z');
        }
        MessageId(id)
    }

    /// Parse an identifier from the leading characters of a tag.
    ///
    /// Other senders may draw ids from a wider alphabet than
    /// [`MessageId::random`] uses, so any ASCII alphanumeric pair is
    /// accepted.
    pub fn parse(s: &str) -> Result<Self, ParcelError> {
        let bytes = s.as_bytes();
        if bytes.len() < MESSAGE_ID_LEN {
            return Err(ParcelError::InvalidMessageId(s.to_string()));
        }
        let mut id = [0u8; MESSAGE_ID_LEN];
        id.copy_from_slice(&bytes[..MESSAGE_ID_LEN]);
        if !id.iter().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParcelError::InvalidMessageId(
                s.chars().take(MESSAGE_ID_LEN).collect(),
            ));
        }
        Ok(MessageId(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        // ASCII alphanumeric by construction.
        std::str::from_utf8(&self.0).expect("message id is ASCII")
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() != MESSAGE_ID_LEN {
            return Err(serde::de::Error::custom(ParcelError::InvalidMessageId(s)));
        }
        MessageId::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Parcels
// ============================================================================

/// One parsed transmission unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Identifier of the message this parcel belongs to.
    pub message_id: MessageId,
    /// Position within the message; 0 is the header.
    pub index: u8,
    /// Text after the first `:`, verbatim.
    pub payload: String,
}

impl Parcel {
    /// Parse a raw line into a parcel.
    ///
    /// Parsing is lenient about index padding (`AB1:` and `AB01:` are the
    /// same parcel); [`Parcel::encode`] always pads.
    pub fn parse(raw: &str) -> Result<Parcel, ParcelError> {
        let (tag, payload) = raw.split_once(':').ok_or(ParcelError::MissingSeparator)?;
        if tag.len() < MESSAGE_ID_LEN + 1 {
            return Err(ParcelError::TagTooShort {
                expected: MESSAGE_ID_LEN + 1,
                actual: tag.len(),
            });
        }
        let message_id = MessageId::parse(tag)?;
        // The id is ASCII, so slicing past it stays on a char boundary.
        let digits = &tag[MESSAGE_ID_LEN..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParcelError::InvalidIndex(digits.to_string()));
        }
        let index: usize = digits
            .parse()
            .map_err(|_| ParcelError::InvalidIndex(digits.to_string()))?;
        if index > MAX_PARCEL_INDEX as usize {
            return Err(ParcelError::IndexOutOfRange {
                index,
                max: MAX_PARCEL_INDEX,
            });
        }
        Ok(Parcel {
            message_id,
            index: index as u8,
            payload: payload.to_string(),
        })
    }

    /// Encode the parcel as a wire line.
    pub fn encode(&self) -> String {
        format!(
            "{}{:0width$}:{}",
            self.message_id,
            self.index,
            self.payload,
            width = INDEX_DIGITS
        )
    }

    /// The `<id><index>` tag that prefixes the wire line.
    pub fn tag(&self) -> String {
        format!(
            "{}{:0width$}",
            self.message_id,
            self.index,
            width = INDEX_DIGITS
        )
    }

    /// Whether this is the index-0 header parcel.
    pub fn is_header(&self) -> bool {
        self.index == 0
    }
}

// ============================================================================
// Header payload
// ============================================================================

/// Decoded payload of a header parcel: `<sender>:<destination>:<checksum>`.
///
/// Sender and destination must not themselves contain `:`; the format
/// defines no escaping, and the ambiguity is confined to the header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPayload {
    /// Identifier of the originating station.
    pub sender: String,
    /// Destination station, or the broadcast marker.
    pub destination: String,
    /// Checksum of the complete message body.
    pub checksum: String,
}

impl HeaderPayload {
    /// Parse the payload of an index-0 parcel.
    pub fn parse(payload: &str) -> Result<HeaderPayload, ParcelError> {
        let mut parts = payload.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(sender), Some(destination), Some(checksum), None) => {
                if checksum.len() != CHECKSUM_LEN {
                    return Err(ParcelError::MalformedHeader(format!(
                        "checksum must be {CHECKSUM_LEN} characters, got {}",
                        checksum.len()
                    )));
                }
                Ok(HeaderPayload {
                    sender: sender.to_string(),
                    destination: destination.to_string(),
                    checksum: checksum.to_string(),
                })
            }
            _ => Err(ParcelError::MalformedHeader(format!(
                "expected sender:destination:checksum, got {payload:?}"
            ))),
        }
    }

    /// Encode as the payload of an index-0 parcel.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.sender, self.destination, self.checksum)
    }

    /// Whether the destination is the broadcast marker.
    pub fn is_broadcast(&self) -> bool {
        self.destination.eq_ignore_ascii_case(BROADCAST_DESTINATION)
    }
}
