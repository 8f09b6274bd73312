//! Discovery-topic derivation.
//!
//! A topic is `SHA-256(cell_id || SYSTEM_SALT)`, hex-encoded and truncated.
//! Deterministic, so every participant in a cell lands on the same topic
//! without coordination.

use sha2::{Digest, Sha256};

use crate::constants::{CHANNEL_PREFIX, SYSTEM_SALT, TOPIC_LEN};

/// Derive the opaque discovery topic for a geospatial cell id.
pub fn derive_topic(cell: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cell.as_bytes());
    hasher.update(SYSTEM_SALT.as_bytes());
    let digest = hasher.finalize();

    let mut topic = hex::encode(digest);
    topic.truncate(TOPIC_LEN);
    topic
}

/// Full broadcast channel name for a cell's topic.
pub fn channel_name(cell: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, derive_topic(cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(
            derive_topic("85283473fffffff"),
            derive_topic("85283473fffffff")
        );
    }

    #[test]
    fn test_known_vector() {
        // SHA-256("85283473fffffff" || salt), first 32 hex chars.
        assert_eq!(
            derive_topic("85283473fffffff"),
            "201b60afbb34802576bfcd354b5422ed"
        );
        assert_eq!(
            derive_topic("872830828ffffff"),
            "76c4ea123a37a3d7bc86eaea4f998678"
        );
    }

    #[test]
    fn test_distinct_cells_get_distinct_topics() {
        assert_ne!(derive_topic("85283473fffffff"), derive_topic("85283447fffffff"));
        assert_ne!(derive_topic("a"), derive_topic("b"));
    }

    #[test]
    fn test_topic_shape() {
        let topic = derive_topic("85283473fffffff");
        assert_eq!(topic.len(), TOPIC_LEN);
        assert!(topic.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_channel_name_prefix() {
        let name = channel_name("85283473fffffff");
        assert_eq!(name, "swarm_201b60afbb34802576bfcd354b5422ed");
    }
}
