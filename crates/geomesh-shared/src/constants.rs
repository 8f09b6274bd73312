/// Application name
pub const APP_NAME: &str = "GeoMesh";

/// Salt mixed into cell ids before hashing them into discovery topics.
/// Prevents trivial reverse-mapping of a topic string back to a cell id;
/// the cell space is small and public, so this is not a security boundary.
pub const SYSTEM_SALT: &str = "geomesh_v1_proximity_layer";

/// Length (hex characters) of a derived discovery topic
pub const TOPIC_LEN: usize = 32;

/// Prefix for broadcast channel names carrying swarm traffic
pub const CHANNEL_PREFIX: &str = "swarm_";

/// Milliseconds of silence after which a peer is considered gone
pub const PEER_TIMEOUT_MS: i64 = 30_000;

/// Interval between presence expiry sweeps, in milliseconds
pub const SWEEP_INTERVAL_MS: u64 = 10_000;

/// Interval between heartbeat re-publications, in milliseconds
pub const HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// Maximum number of messages retained in the session log
pub const MAX_LOG_MESSAGES: usize = 100;

/// Characters of the encoded public key used as the identity id
pub const IDENTITY_ID_LEN: usize = 16;

/// Word list for generated display names
pub const NAME_WORDS: &[&str] = &[
    "Shadow", "Beacon", "Glider", "Vortex", "Cipher", "Hex", "Drift",
];

/// Storage key for the persisted identity record
pub const STORAGE_KEY_IDENTITY: &str = "identity";

/// Storage key for the persisted chat history
pub const STORAGE_KEY_HISTORY: &str = "chat_history";

/// Geospatial cell resolution (H3), chosen so a cell spans roughly 1.2 km
pub const H3_RESOLUTION: u8 = 7;

/// Neighbor ring size around the home cell
pub const NEIGHBOR_RING: u32 = 1;
