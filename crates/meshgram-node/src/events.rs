//! Events emitted toward the application layer.
//!
//! Completed reconstructions are dispatched through an unbounded channel
//! rather than registered listeners; the application clones the receiver and
//! drains it from its own loop.

use meshgram_parcel::MessageId;
use serde::{Deserialize, Serialize};

/// An event produced by the node core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvent {
    /// A broadcast chat message finished reassembly.
    Chat {
        /// Id the sender chose for the message.
        message_id: MessageId,
        /// Station that originated the message.
        sender: String,
        /// Destination field from the header (the broadcast marker).
        destination: String,
        /// Reconstructed message body.
        body: String,
    },
    /// A station announced its presence, with an optional location.
    Presence {
        /// Callsign of the station.
        callsign: String,
        /// Geocode, when the station reported one.
        geocode: Option<String>,
    },
}
