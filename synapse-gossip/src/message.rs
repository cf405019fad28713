//! The gossip message envelope (C5) — a tagged sum over six variants, with
//! a single dispatch point. Unknown discriminants are counted and dropped on
//! decode, never treated as a connection-level failure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the six gossip round types this message carries, plus a
/// catch-all for any discriminant this build doesn't recognize — decoded,
/// never a decode failure, so an older/newer peer's message type is counted
/// and dropped rather than tearing down the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Push,
    Pull,
    PushPull,
    AntiEntropy,
    Heartbeat,
    Membership,
    #[serde(other)]
    Unknown,
}

/// One gossip envelope on the wire. Canonical-serialized JSON followed by a
/// newline is the wire format (§6); this type is that envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipMessage {
    pub message_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub sender_id: String,
    pub timestamp_ms: u64,
    pub round: u64,
    pub ttl: u8,
    pub payload: serde_json::Value,
    pub seen_by: BTreeSet<String>,
    pub signature: Option<String>,
}

impl GossipMessage {
    /// Build a fresh message with a unique id and an empty `seen_by`.
    pub fn new(
        message_type: MessageType,
        sender_id: impl Into<String>,
        timestamp_ms: u64,
        round: u64,
        ttl: u8,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            message_type,
            sender_id: sender_id.into(),
            timestamp_ms,
            round,
            ttl,
            payload,
            seen_by: BTreeSet::new(),
            signature: None,
        }
    }

    /// `true` if this message is older than `expiry_ms` relative to `now_ms`.
    pub fn is_expired(&self, now_ms: u64, expiry_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp_ms) > expiry_ms
    }

    /// A copy ready to forward: `ttl` decremented, `replica_id` added to
    /// `seen_by`. Caller must check `ttl > 1` before forwarding, per the
    /// receive-path contract.
    pub fn forwarded(&self, replica_id: &str) -> Self {
        let mut next = self.clone();
        next.ttl = next.ttl.saturating_sub(1);
        next.seen_by.insert(replica_id.to_string());
        next
    }
}

/// `⌈log2(peer_count + 1)⌉ + 2`, the TTL assigned to a freshly built
/// push-pull message.
pub fn initial_ttl(peer_count: usize) -> u8 {
    let n = peer_count as u64 + 1;
    let log2_ceil = if n <= 1 { 0 } else { 64 - (n - 1).leading_zeros() };
    (log2_ceil as u8).saturating_add(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_decrements_ttl_and_adds_seen_by() {
        let msg = GossipMessage::new(MessageType::Push, "r1", 0, 0, 5, serde_json::Value::Null);
        let next = msg.forwarded("r2");
        assert_eq!(next.ttl, 4);
        assert!(next.seen_by.contains("r2"));
        assert_ne!(next.message_id, Uuid::nil());
        assert_eq!(next.message_id, msg.message_id);
    }

    #[test]
    fn expiry_is_relative_to_timestamp() {
        let msg = GossipMessage::new(MessageType::Heartbeat, "r1", 1000, 0, 3, serde_json::Value::Null);
        assert!(!msg.is_expired(1000 + 59_999, 60_000));
        assert!(msg.is_expired(1000 + 60_001, 60_000));
    }

    #[test]
    fn unknown_message_type_decodes_to_the_catch_all_variant() {
        let raw = r#"{"message_id":"00000000-0000-0000-0000-000000000000","type":"unknown_kind","sender_id":"r1","timestamp_ms":0,"round":0,"ttl":3,"payload":null,"seen_by":[],"signature":null}"#;
        let message: GossipMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.message_type, MessageType::Unknown);
    }

    #[test]
    fn initial_ttl_matches_formula() {
        // peer_count=3 -> ceil(log2(4)) + 2 = 2 + 2 = 4
        assert_eq!(initial_ttl(3), 4);
        // peer_count=0 -> ceil(log2(1)) + 2 = 0 + 2 = 2
        assert_eq!(initial_ttl(0), 2);
    }
}
