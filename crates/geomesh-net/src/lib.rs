// Swarm layer: topic-scoped broadcast channels, peer presence, and the
// session actor that ties them together.

pub mod bus;
pub mod presence;
pub mod session;

pub use bus::{BusReceiver, BusSender, LocalBus};
pub use presence::{Peer, PresenceTable};
pub use session::{
    spawn_session, SessionCommand, SessionConfig, SessionNotification, SessionSnapshot,
};
