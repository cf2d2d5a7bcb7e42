//! Node facade: wires the registry, the archive, the event queue, and the
//! outbound transport together.
//!
//! Inbound flow: the transport hands every raw line it hears to
//! [`MeshNode::receive`]. Control lines act immediately; parcel lines fold
//! into the registry and, on completion, broadcast messages are dispatched
//! onto the event queue. Outbound flow: [`MeshNode::create_message`] splits
//! and archives a message, handing the parcel lines back for transmission.

use crossbeam_channel::{unbounded, Receiver, Sender};
use meshgram_parcel::{
    ControlCommand, MessageId, OutboundMessage, Parcel, BROADCAST_DESTINATION, FRAME_MARKER,
    LOCATION_PREFIX,
};
use tracing::{debug, trace};

use crate::{
    CompletedMessage, FoldOutcome, NodeConfig, NodeError, NodeEvent, ReassemblyRegistry,
    RetransmissionArchive,
};

/// Outbound side of the broadcast transport.
///
/// Implementations broadcast a single raw line, fire-and-forget; the core
/// never blocks on them and never learns whether the line made it out.
pub trait Transport: Send + Sync {
    /// Broadcast one raw parcel or control line.
    fn send_raw(&self, line: &str);
}

/// The protocol core of one mesh station.
pub struct MeshNode<T: Transport> {
    config: NodeConfig,
    registry: ReassemblyRegistry,
    archive: RetransmissionArchive,
    transport: T,
    events_tx: Sender<NodeEvent>,
    events_rx: Receiver<NodeEvent>,
}

impl<T: Transport> MeshNode<T> {
    /// Create a node core over the given outbound transport.
    pub fn new(config: NodeConfig, transport: T) -> Self {
        let (events_tx, events_rx) = unbounded();
        let registry =
            ReassemblyRegistry::new(config.max_reassembling, config.reassembly_timeout());
        let archive = RetransmissionArchive::new(config.max_archived, config.retention());
        MeshNode {
            config,
            registry,
            archive,
            transport,
            events_tx,
            events_rx,
        }
    }

    /// Split a message under this station's callsign, archive it for
    /// retransmission requests, and hand the parcel lines back.
    ///
    /// The caller transmits them in any order; receivers tolerate
    /// reordering.
    pub fn create_message(
        &self,
        destination: &str,
        body: &str,
    ) -> Result<Vec<String>, NodeError> {
        let message = OutboundMessage::split(
            &self.config.callsign,
            destination,
            body,
            self.config.chunk_size,
        )?;
        self.archive.insert(&message);
        debug!(
            id = %message.id(),
            parcels = message.total_parcels(),
            "message split and archived"
        );
        Ok(message.parcels().to_vec())
    }

    /// The transport's sole inbound entry point: feed one received line.
    pub fn receive(&self, raw_line: &str) {
        let line = raw_line.trim_end_matches(|c| c == '\r' || c == '\n');
        let line = line.strip_prefix(FRAME_MARKER).unwrap_or(line);
        if line.is_empty() {
            return;
        }
        if ControlCommand::is_control_line(line) {
            self.handle_control(line);
            return;
        }
        let parcel = match Parcel::parse(line) {
            Ok(parcel) => parcel,
            Err(err) => {
                // Expected noise on a channel shared with unrelated senders.
                debug!(%err, line, "discarding unparsable line");
                return;
            }
        };
        match self.registry.fold(&parcel) {
            FoldOutcome::Completed(message) => self.dispatch(message),
            FoldOutcome::Pending {
                changed,
                first_missing,
            } => {
                trace!(
                    id = %parcel.message_id,
                    changed,
                    first_missing,
                    "message still assembling"
                );
            }
        }
    }

    /// Events produced by completed reconstructions and presence lines.
    ///
    /// The receiver can be cloned and drained from any thread.
    pub fn events(&self) -> Receiver<NodeEvent> {
        self.events_rx.clone()
    }

    /// The parcel worth requesting for a stalled message, if that message
    /// is still assembling here.
    ///
    /// When and how often to ask is the application's retry policy; the
    /// core only reports.
    pub fn first_missing(&self, id: MessageId) -> Option<u8> {
        self.registry.first_missing(id)
    }

    /// Broadcast a `/repeat` request for one parcel of a stalled message.
    pub fn request_missing(&self, id: MessageId, index: u8) {
        let request = ControlCommand::Repeat {
            message_id: id,
            index,
        }
        .encode();
        debug!(id = %id, index, "requesting missing parcel");
        self.transport.send_raw(&request);
    }

    /// The retransmission archive.
    pub fn archive(&self) -> &RetransmissionArchive {
        &self.archive
    }

    /// The inbound reassembly registry.
    pub fn registry(&self) -> &ReassemblyRegistry {
        &self.registry
    }

    fn handle_control(&self, line: &str) {
        match ControlCommand::parse(line) {
            Some(ControlCommand::Repeat { message_id, index }) => {
                match self.archive.parcel(message_id, index) {
                    Some(parcel) => {
                        debug!(id = %message_id, index, "resending requested parcel");
                        self.transport.send_raw(&parcel);
                    }
                    None => {
                        // Nothing to answer with; the requester times out.
                        debug!(id = %message_id, index, "repeat request for unknown parcel");
                    }
                }
            }
            Some(ControlCommand::Ping { callsign }) => {
                self.emit(NodeEvent::Presence {
                    callsign,
                    geocode: None,
                });
            }
            Some(ControlCommand::Location { callsign, geocode }) => {
                self.emit(NodeEvent::Presence {
                    callsign,
                    geocode: Some(geocode),
                });
            }
            None => {
                debug!(line, "control line not understood");
            }
        }
    }

    fn dispatch(&self, message: CompletedMessage) {
        if !message
            .destination
            .eq_ignore_ascii_case(BROADCAST_DESTINATION)
        {
            // Terminal outcome: addressed traffic has no local consumer.
            trace!(
                id = %message.message_id,
                destination = %message.destination,
                "dropping non-broadcast message"
            );
            return;
        }
        if message.body.starts_with(LOCATION_PREFIX) {
            match ControlCommand::parse(&message.body) {
                Some(ControlCommand::Ping { callsign }) => {
                    self.emit(NodeEvent::Presence {
                        callsign,
                        geocode: None,
                    });
                }
                Some(ControlCommand::Location { callsign, geocode }) => {
                    self.emit(NodeEvent::Presence {
                        callsign,
                        geocode: Some(geocode),
                    });
                }
                _ => {
                    debug!(id = %message.message_id, "presence body not understood");
                }
            }
            return;
        }
        self.emit(NodeEvent::Chat {
            message_id: message.message_id,
            sender: message.sender,
            destination: message.destination,
            body: message.body,
        });
    }

    fn emit(&self, event: NodeEvent) {
        // The node holds its own receiver, so the channel never disconnects.
        let _ = self.events_tx.send(event);
    }
}
