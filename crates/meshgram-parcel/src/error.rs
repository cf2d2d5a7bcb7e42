//! Error types for meshgram-parcel.

use thiserror::Error;

/// Errors that can occur while encoding, decoding, or splitting parcels.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParcelError {
    /// Line carries no `:` separator and cannot be a parcel.
    #[error("missing ':' separator in parcel")]
    MissingSeparator,

    /// Parcel tag is shorter than an id plus one index digit.
    #[error("parcel tag too short: expected at least {expected} characters, got {actual}")]
    TagTooShort {
        /// Minimum tag length.
        expected: usize,
        /// Actual tag length received.
        actual: usize,
    },

    /// Message identifier is not ASCII alphanumeric.
    #[error("invalid message id: {0:?}")]
    InvalidMessageId(String),

    /// Index field is empty or not a decimal number.
    #[error("invalid parcel index: {0:?}")]
    InvalidIndex(String),

    /// Index is above the two-digit field cap.
    #[error("parcel index {index} out of range (max {max})")]
    IndexOutOfRange {
        /// Index as parsed from the wire.
        index: usize,
        /// Highest addressable index.
        max: u8,
    },

    /// Header payload does not have the `sender:destination:checksum` shape.
    #[error("malformed header payload: {0}")]
    MalformedHeader(String),

    /// Message body is empty; there is nothing to split.
    #[error("empty message body")]
    EmptyBody,

    /// A chunk size of zero can never make progress.
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,

    /// Body needs more data parcels than the index field can address.
    #[error("message needs {needed} data parcels, maximum {max}")]
    TooManyParcels {
        /// Data parcels the body would need.
        needed: usize,
        /// Highest addressable index.
        max: u8,
    },
}
