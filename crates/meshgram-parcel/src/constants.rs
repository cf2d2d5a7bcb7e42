//! Protocol constants.

/// Number of characters in a message identifier.
pub const MESSAGE_ID_LEN: usize = 2;

/// Number of decimal digits in an encoded parcel index.
///
/// Indices are zero-padded (`00`..`99`) so parcel tags sort
/// lexicographically in index order.
pub const INDEX_DIGITS: usize = 2;

/// Highest parcel index representable in the two-digit index field.
pub const MAX_PARCEL_INDEX: u8 = 99;

/// Number of characters in a reassembly checksum.
pub const CHECKSUM_LEN: usize = 4;

/// Default maximum number of payload characters per data parcel.
///
/// Sized for a BLE advertisement payload; APRS-IS text frames fit the same
/// budget.
pub const DEFAULT_CHUNK_SIZE: usize = 40;

/// Destination marker for broadcast messages.
pub const BROADCAST_DESTINATION: &str = "ANY";

/// First character of a presence ping or location report line.
pub const LOCATION_PREFIX: char = '+';

/// First character of a control command line.
pub const COMMAND_PREFIX: char = '/';

/// Control command asking a peer to resend one parcel of an archived
/// message. Syntax: `/repeat AB03`.
pub const REPEAT_COMMAND: &str = "/repeat";

/// Framing marker some transports prepend to inbound lines.
pub const FRAME_MARKER: char = '>';
