//! Meshgram Parcel Protocol
//!
//! This crate implements the wire format and the pure codec for exchanging
//! short text messages over size-constrained broadcast channels (Bluetooth LE
//! advertisement payloads, APRS-IS text frames). The channel enforces a hard
//! per-packet size limit, reorders freely, and drops silently, so a message is
//! split into **parcels** — single text lines small enough for one
//! transmission — and reassembled out of order on the receiving side.
//!
//! # Wire Overview
//!
//! Every parcel is a line of the form `<id><index>:<payload>`:
//!
//! - **Header parcel** (index `00`): payload is
//!   `<sender>:<destination>:<checksum>`.
//! - **Data parcels** (index `01` and up): payload is a slice of the message
//!   body, at most one chunk long, taken verbatim after the first `:`.
//!
//! A 70-character broadcast split at 40 characters per chunk becomes three
//! lines:
//!
//! ```text
//! QM00:CR7BBQ-15:ANY:TKBA
//! QM01:The quick brown fox jumps over the lazy
//! QM02: dog and trots back home before sunset.
//! ```
//!
//! Control lines (`/repeat QM02`, `+CR7BBQ-15`) are complete one-shot
//! messages that bypass reassembly entirely.
//!
//! # Example
//!
//! ```rust
//! use meshgram_parcel::{OutboundMessage, Parcel, ReassemblyBuffer};
//!
//! let msg = OutboundMessage::split("CR7BBQ-15", "ANY", "hello mesh", 40).unwrap();
//!
//! // The receiver folds parcels in whatever order the channel delivers them.
//! let mut buffer = ReassemblyBuffer::new(msg.id());
//! for raw in msg.parcels().iter().rev() {
//!     let parcel = Parcel::parse(raw).unwrap();
//!     buffer.fold(&parcel);
//! }
//! assert_eq!(buffer.body(), Some("hello mesh"));
//! ```

mod checksum;
mod commands;
mod constants;
mod error;
mod message;
mod parcel;

pub use checksum::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use message::*;
pub use parcel::*;
