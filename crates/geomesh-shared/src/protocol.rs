//! Wire protocol frames.
//!
//! Exactly three frame shapes travel over a swarm channel, each a tagged
//! JSON object `{"type": ..., "payload": ...}`. Field names and tag values
//! are fixed by the protocol and must not change.

use serde::{Deserialize, Serialize};

use crate::types::PeerId;

/// Presence announcement carried by `ping` and `pong` frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerAnnounce {
    pub id: PeerId,
    pub name: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "h3Index")]
    pub h3_index: String,
}

/// A signed broadcast chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender-assigned token, used only for de-duplication.
    pub id: String,
    #[serde(rename = "senderId")]
    pub sender_id: PeerId,
    #[serde(rename = "senderName")]
    pub sender_name: String,
    #[serde(rename = "senderPublicKey")]
    pub sender_public_key: String,
    pub text: String,
    /// Base64 ECDSA signature over the UTF-8 bytes of `text`.
    pub signature: String,
    /// Sender wall clock, Unix epoch milliseconds. Not covered by the
    /// signature, so display ordering by it is advisory only.
    pub timestamp: i64,
    #[serde(rename = "h3Index")]
    pub h3_index: String,
    /// Session-local annotation, never transmitted.
    #[serde(skip)]
    pub is_me: bool,
    /// Session-local annotation, never transmitted.
    #[serde(skip)]
    pub is_verified: bool,
}

/// A frame on a swarm channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Frame {
    Ping(PeerAnnounce),
    Pong(PeerAnnounce),
    Chat(ChatMessage),
}

impl Frame {
    /// Serialize to the JSON wire encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from the JSON wire encoding.
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announce() -> PeerAnnounce {
        PeerAnnounce {
            id: PeerId("A1".into()),
            name: "Beacon_42".into(),
            public_key: "BASE64KEY".into(),
            h3_index: "85283473fffffff".into(),
        }
    }

    #[test]
    fn test_ping_wire_shape() {
        let frame = Frame::Ping(announce());
        let json: serde_json::Value =
            serde_json::from_slice(&frame.to_bytes().unwrap()).unwrap();

        assert_eq!(json["type"], "ping");
        assert_eq!(json["payload"]["id"], "A1");
        assert_eq!(json["payload"]["name"], "Beacon_42");
        assert_eq!(json["payload"]["publicKey"], "BASE64KEY");
        assert_eq!(json["payload"]["h3Index"], "85283473fffffff");
    }

    #[test]
    fn test_pong_tag() {
        let frame = Frame::Pong(announce());
        let json: serde_json::Value =
            serde_json::from_slice(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(json["type"], "pong");
    }

    #[test]
    fn test_chat_wire_shape_omits_local_annotations() {
        let frame = Frame::Chat(ChatMessage {
            id: "m1".into(),
            sender_id: PeerId("A1".into()),
            sender_name: "Beacon_42".into(),
            sender_public_key: "BASE64KEY".into(),
            text: "hello".into(),
            signature: "SIG".into(),
            timestamp: 1_700_000_000_000,
            h3_index: "85283473fffffff".into(),
            is_me: true,
            is_verified: true,
        });
        let json: serde_json::Value =
            serde_json::from_slice(&frame.to_bytes().unwrap()).unwrap();

        assert_eq!(json["type"], "chat");
        assert_eq!(json["payload"]["senderId"], "A1");
        assert_eq!(json["payload"]["senderName"], "Beacon_42");
        assert_eq!(json["payload"]["senderPublicKey"], "BASE64KEY");
        assert_eq!(json["payload"]["timestamp"], 1_700_000_000_000_i64);
        assert!(json["payload"].get("isMe").is_none());
        assert!(json["payload"].get("is_me").is_none());
        assert!(json["payload"].get("isVerified").is_none());
    }

    #[test]
    fn test_decodes_reference_frame() {
        // Frame shape as produced by other participants on the wire.
        let raw = br#"{
            "type": "chat",
            "payload": {
                "id": "x9",
                "senderId": "A1",
                "senderName": "Drift_7",
                "senderPublicKey": "KEY",
                "text": "hi",
                "signature": "SIG",
                "timestamp": 42,
                "h3Index": "85283473fffffff"
            }
        }"#;
        let frame = Frame::from_bytes(raw).unwrap();
        match frame {
            Frame::Chat(msg) => {
                assert_eq!(msg.sender_id, PeerId("A1".into()));
                assert_eq!(msg.text, "hi");
                // Local annotations default to unset on receipt.
                assert!(!msg.is_me);
                assert!(!msg.is_verified);
            }
            other => panic!("expected chat frame, got {other:?}"),
        }
    }

    #[test]
    fn test_roundtrip() {
        let frame = Frame::Ping(announce());
        let restored = Frame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(frame, restored);
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(Frame::from_bytes(b"not json").is_err());
        assert!(Frame::from_bytes(br#"{"type":"nope","payload":{}}"#).is_err());
        assert!(Frame::from_bytes(br#"{"type":"ping","payload":{"id":"x"}}"#).is_err());
    }
}
