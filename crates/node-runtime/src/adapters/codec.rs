//! # Wire Codec
//!
//! JSON encoding of relay envelopes for networked relay adapters. The
//! decode side fails closed: anything that does not parse into the
//! tagged [`WireMessage`] union is rejected before typed code sees it.

use shared_types::RelayEnvelope;

/// Encode an envelope for the wire.
///
/// Serialization of our own well-formed types does not fail; a `None`
/// here indicates a programming error upstream and the message is
/// simply not sent.
pub fn encode_envelope(envelope: &RelayEnvelope) -> Option<String> {
    match serde_json::to_string(envelope) {
        Ok(encoded) => Some(encoded),
        Err(error) => {
            tracing::error!(%error, "failed to encode relay envelope");
            None
        }
    }
}

/// Decode an inbound payload, rejecting anything unparseable.
pub fn decode_envelope(payload: &str) -> Option<RelayEnvelope> {
    match serde_json::from_str(payload) {
        Ok(envelope) => Some(envelope),
        Err(error) => {
            tracing::debug!(%error, "dropping undecodable relay payload");
            None
        }
    }
}
