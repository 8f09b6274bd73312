//! # geomesh-shared
//!
//! Protocol core shared by every GeoMesh component: identity material,
//! the sign/verify message codec, discovery-topic derivation, the wire
//! frame types, and the collaborator interfaces for location and
//! geospatial indexing.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod geo;
pub mod identity;
pub mod protocol;
pub mod topic;
pub mod types;

pub use error::{IdentityError, LocationError};
pub use identity::{Identity, IdentityRecord};
pub use protocol::{ChatMessage, Frame, PeerAnnounce};
pub use types::PeerId;
