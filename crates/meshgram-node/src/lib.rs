//! Meshgram Node Core
//!
//! Glue between the pure parcel codec and an application: an inbound
//! reassembly registry that reconstructs messages from raw lines, an event
//! queue that hands completed broadcasts to the application, and a bounded
//! retransmission archive that answers `/repeat` requests from peers.
//!
//! The transport layer (BLE scanner, APRS-IS socket, ...) stays outside this
//! crate: it calls [`MeshNode::receive`] with every raw line it hears and
//! implements [`Transport`] for outbound lines. Both directions are
//! fire-and-forget; nothing here blocks on I/O.
//!
//! # Example
//!
//! ```rust
//! use meshgram_node::{MeshNode, NodeConfig, NodeEvent, Transport};
//!
//! struct Silent;
//! impl Transport for Silent {
//!     fn send_raw(&self, _line: &str) {}
//! }
//!
//! let config = NodeConfig {
//!     callsign: "CR7BBQ-15".to_string(),
//!     ..NodeConfig::default()
//! };
//! let sender = MeshNode::new(config, Silent);
//! let receiver = MeshNode::new(NodeConfig::default(), Silent);
//!
//! for parcel in sender.create_message("ANY", "hello mesh").unwrap() {
//!     receiver.receive(&parcel);
//! }
//! match receiver.events().try_recv().unwrap() {
//!     NodeEvent::Chat { sender, body, .. } => {
//!         assert_eq!(sender, "CR7BBQ-15");
//!         assert_eq!(body, "hello mesh");
//!     }
//!     other => panic!("unexpected event: {other:?}"),
//! }
//! ```

mod archive;
mod config;
mod error;
mod events;
mod node;
mod registry;

pub use archive::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use node::*;
pub use registry::*;
