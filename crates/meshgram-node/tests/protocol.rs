//! Integration tests for the meshgram protocol core.
//!
//! These drive full send → broadcast → reassemble → dispatch flows through
//! node cores wired back to back with a recording transport.

use std::sync::{Arc, Mutex};

use meshgram_node::{MeshNode, NodeConfig, NodeEvent, Transport};
use meshgram_parcel::Parcel;

/// Transport that records every line handed to it.
#[derive(Default, Clone)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
}

impl Transport for RecordingTransport {
    fn send_raw(&self, line: &str) {
        self.sent.lock().unwrap().push(line.to_string());
    }
}

impl RecordingTransport {
    fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

fn node_with(callsign: &str) -> (MeshNode<RecordingTransport>, RecordingTransport) {
    let transport = RecordingTransport::default();
    let config = NodeConfig {
        callsign: callsign.to_string(),
        ..NodeConfig::default()
    };
    (MeshNode::new(config, transport.clone()), transport)
}

const SEVENTY_CHARS: &str =
    "The quick brown fox jumps over the lazy dog and trots back home again.";

// ============================================================================
// Reassembly and dispatch
// ============================================================================

#[test]
fn test_broadcast_roundtrip_out_of_order() {
    let (sender, _) = node_with("CR7BBQ-15");
    let (receiver, _) = node_with("KO6ZJI-10");

    let parcels = sender.create_message("ANY", SEVENTY_CHARS).unwrap();
    assert_eq!(parcels.len(), 3, "70 chars at chunk 40: header plus two");

    for index in [1usize, 0, 2] {
        receiver.receive(&parcels[index]);
    }

    match receiver.events().try_recv().expect("completed event") {
        NodeEvent::Chat { sender, body, .. } => {
            assert_eq!(sender, "CR7BBQ-15");
            assert_eq!(body, SEVENTY_CHARS);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(
        receiver.registry().is_empty(),
        "completed buffer must not linger"
    );
}

#[test]
fn test_framed_lines_are_unwrapped() {
    let (sender, _) = node_with("CR7BBQ-15");
    let (receiver, _) = node_with("KO6ZJI-10");

    for parcel in sender.create_message("ANY", "framed hello").unwrap() {
        receiver.receive(&format!(">{parcel}"));
    }
    assert!(matches!(
        receiver.events().try_recv(),
        Ok(NodeEvent::Chat { .. })
    ));
}

#[test]
fn test_noise_and_duplicates_do_not_disturb_reassembly() {
    let (sender, _) = node_with("CR7BBQ-15");
    let (receiver, _) = node_with("KO6ZJI-10");

    let parcels = sender.create_message("ANY", SEVENTY_CHARS).unwrap();
    receiver.receive(&parcels[1]);
    receiver.receive("complete garbage");
    receiver.receive(&parcels[1]);
    receiver.receive("");
    receiver.receive(&parcels[2]);
    receiver.receive(&parcels[0]);

    match receiver.events().try_recv().expect("completed event") {
        NodeEvent::Chat { body, .. } => assert_eq!(body, SEVENTY_CHARS),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(
        receiver.events().try_recv().is_err(),
        "noise must not produce extra events"
    );
}

#[test]
fn test_non_broadcast_message_is_dropped() {
    let (sender, _) = node_with("CR7BBQ-15");
    let (receiver, _) = node_with("KO6ZJI-10");

    for parcel in sender.create_message("KO6ZJI-10", "direct text").unwrap() {
        receiver.receive(&parcel);
    }
    assert!(
        receiver.events().try_recv().is_err(),
        "addressed traffic has no local consumer"
    );
    assert!(receiver.registry().is_empty(), "buffer is still retired");
}

#[test]
fn test_reassembled_presence_body_routes_as_presence() {
    let (sender, _) = node_with("CR7BBQ-15");
    let (receiver, _) = node_with("KO6ZJI-10");

    for parcel in sender.create_message("ANY", "+CR7BBQ-15@RY19-IUZS").unwrap() {
        receiver.receive(&parcel);
    }
    match receiver.events().try_recv().expect("presence event") {
        NodeEvent::Presence { callsign, geocode } => {
            assert_eq!(callsign, "CR7BBQ-15");
            assert_eq!(geocode.as_deref(), Some("RY19-IUZS"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

// ============================================================================
// Control lines
// ============================================================================

#[test]
fn test_presence_ping_line() {
    let (receiver, _) = node_with("KO6ZJI-10");
    receiver.receive("+CR7BBQ-15");
    assert_eq!(
        receiver.events().try_recv(),
        Ok(NodeEvent::Presence {
            callsign: "CR7BBQ-15".to_string(),
            geocode: None,
        })
    );
}

#[test]
fn test_location_line() {
    let (receiver, _) = node_with("KO6ZJI-10");
    receiver.receive(">+CR7BBQ-15@RY19-IUZS");
    assert_eq!(
        receiver.events().try_recv(),
        Ok(NodeEvent::Presence {
            callsign: "CR7BBQ-15".to_string(),
            geocode: Some("RY19-IUZS".to_string()),
        })
    );
}

// ============================================================================
// Retransmission
// ============================================================================

#[test]
fn test_missing_parcel_recovered_via_repeat() {
    let (sender, sender_tx) = node_with("CR7BBQ-15");
    let (receiver, receiver_tx) = node_with("KO6ZJI-10");

    let parcels = sender.create_message("ANY", SEVENTY_CHARS).unwrap();
    let id = Parcel::parse(&parcels[0]).unwrap().message_id;

    // Parcel 2 is lost on the air.
    receiver.receive(&parcels[0]);
    receiver.receive(&parcels[1]);
    assert!(receiver.events().try_recv().is_err(), "not complete yet");

    // The application notices the stall and asks for exactly the gap.
    let missing = receiver.first_missing(id).expect("stalled message");
    assert_eq!(missing, 2);
    receiver.request_missing(id, missing);
    let request = receiver_tx.drain().pop().expect("request on the air");
    assert_eq!(request, format!("/repeat {id}02"));

    // Any peer holding the message serves the parcel verbatim.
    sender.receive(&request);
    let resent = sender_tx.drain().pop().expect("resent parcel");
    assert_eq!(resent, parcels[2]);

    receiver.receive(&resent);
    match receiver.events().try_recv().expect("completed after repair") {
        NodeEvent::Chat { body, .. } => assert_eq!(body, SEVENTY_CHARS),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn test_repeat_for_unknown_message_goes_unanswered() {
    let (sender, sender_tx) = node_with("CR7BBQ-15");
    sender.receive("/repeat ZZ01");
    assert!(
        sender_tx.drain().is_empty(),
        "unknown id must not produce a resend"
    );
}

#[test]
fn test_repeat_out_of_range_goes_unanswered() {
    let (sender, sender_tx) = node_with("CR7BBQ-15");
    let parcels = sender.create_message("ANY", "tiny").unwrap();
    let id = Parcel::parse(&parcels[0]).unwrap().message_id;

    sender.receive(&format!("/repeat {id}07"));
    assert!(sender_tx.drain().is_empty());
}

#[test]
fn test_repeated_requests_cause_repeated_resends() {
    // No deduplication: resends are idempotent, so serving every request
    // is safe, just not bandwidth-optimal.
    let (sender, sender_tx) = node_with("CR7BBQ-15");
    let parcels = sender.create_message("ANY", "tiny").unwrap();
    let id = Parcel::parse(&parcels[0]).unwrap().message_id;

    sender.receive(&format!("/repeat {id}01"));
    sender.receive(&format!("/repeat {id}01"));
    let sent = sender_tx.drain();
    assert_eq!(sent, vec![parcels[1].clone(), parcels[1].clone()]);
}
