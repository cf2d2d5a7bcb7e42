//! Control lines.
//!
//! Lines whose first character is `/` or `+` are complete one-shot messages
//! that bypass reassembly: retransmission requests, presence pings, and
//! location reports. The same shapes appear as the body of a completed
//! broadcast message, where this parser drives dispatch.
//!
//! ```text
//! /repeat QM02            resend parcel 2 of message QM
//! +CR7BBQ-15              presence ping
//! +CR7BBQ-15@RY19-IUZS    location report
//! ```

use crate::{
    MessageId, COMMAND_PREFIX, INDEX_DIGITS, LOCATION_PREFIX, MAX_PARCEL_INDEX, MESSAGE_ID_LEN,
    REPEAT_COMMAND,
};

/// A one-shot control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Ask any peer holding the message in its archive to resend one
    /// parcel. Wire form: `/repeat QM02`.
    Repeat {
        /// Id of the archived message.
        message_id: MessageId,
        /// Index of the parcel to resend (0 is the header).
        index: u8,
    },
    /// Presence ping. Wire form: `+CR7BBQ-15`.
    Ping {
        /// Callsign of the station announcing itself.
        callsign: String,
    },
    /// Location report. Wire form: `+CR7BBQ-15@RY19-IUZS`.
    Location {
        /// Callsign of the reporting station.
        callsign: String,
        /// Opaque geocode, carried as transmitted.
        geocode: String,
    },
}

impl ControlCommand {
    /// Whether a raw line is a control line rather than a parcel.
    pub fn is_control_line(line: &str) -> bool {
        line.starts_with(COMMAND_PREFIX) || line.starts_with(LOCATION_PREFIX)
    }

    /// Parse a control line.
    ///
    /// Returns `None` for lines that carry a control prefix but no usable
    /// command — expected noise on a channel shared with unrelated senders.
    pub fn parse(line: &str) -> Option<ControlCommand> {
        if let Some(rest) = line.strip_prefix(LOCATION_PREFIX) {
            return Self::parse_presence(rest);
        }
        let tag = line.strip_prefix(REPEAT_COMMAND)?.strip_prefix(' ')?.trim();
        let message_id = MessageId::parse(tag).ok()?;
        let digits = tag.get(MESSAGE_ID_LEN..)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: usize = digits.parse().ok()?;
        if index > MAX_PARCEL_INDEX as usize {
            return None;
        }
        Some(ControlCommand::Repeat {
            message_id,
            index: index as u8,
        })
    }

    /// Encode for transmission.
    pub fn encode(&self) -> String {
        match self {
            ControlCommand::Repeat { message_id, index } => {
                format!(
                    "{REPEAT_COMMAND} {message_id}{index:0width$}",
                    width = INDEX_DIGITS
                )
            }
            ControlCommand::Ping { callsign } => format!("{LOCATION_PREFIX}{callsign}"),
            ControlCommand::Location { callsign, geocode } => {
                format!("{LOCATION_PREFIX}{callsign}@{geocode}")
            }
        }
    }

    fn parse_presence(rest: &str) -> Option<ControlCommand> {
        if rest.is_empty() {
            return None;
        }
        match rest.split_once('@') {
            Some((callsign, geocode)) => {
                if callsign.is_empty() || geocode.is_empty() {
                    return None;
                }
                Some(ControlCommand::Location {
                    callsign: callsign.to_string(),
                    geocode: geocode.to_string(),
                })
            }
            None => Some(ControlCommand::Ping {
                callsign: rest.to_string(),
            }),
        }
    }
}
