//! In-process topic-scoped broadcast medium.
//!
//! This is the transport collaborator as the session sees it: unordered,
//! best-effort fan-out to every *other* member of a named channel. A
//! publisher never receives its own frames. Closing a member (dropping
//! its sender) detaches it; channels with no remaining members are
//! garbage-collected from the registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

/// Buffered frames per member before the medium starts dropping.
const MEMBER_CAPACITY: usize = 256;

struct Member {
    id: u64,
    tx: mpsc::Sender<Vec<u8>>,
}

/// Registry of named broadcast channels shared by every participant in
/// the process group. Cheap to clone.
#[derive(Clone, Default)]
pub struct LocalBus {
    channels: Arc<Mutex<HashMap<String, Vec<Member>>>>,
    next_id: Arc<AtomicU64>,
}

/// Publishing half of a channel membership. Dropping it leaves the
/// channel.
pub struct BusSender {
    bus: LocalBus,
    name: String,
    id: u64,
}

/// Receiving half of a channel membership. Yields `None` once the
/// membership is closed.
pub struct BusReceiver {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the named channel. Frames published by other members arrive
    /// on the returned receiver; frames published on the returned sender
    /// go to everyone else.
    pub fn open(&self, name: &str) -> (BusSender, BusReceiver) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(MEMBER_CAPACITY);

        self.channels
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(Member { id, tx });

        debug!(channel = %name, member = id, "joined broadcast channel");

        (
            BusSender {
                bus: self.clone(),
                name: name.to_string(),
                id,
            },
            BusReceiver { rx },
        )
    }

    /// Number of members currently joined to `name`.
    pub fn member_count(&self, name: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(name)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    fn publish(&self, name: &str, origin: u64, data: &[u8]) {
        let guard = self.channels.lock().unwrap();
        let Some(members) = guard.get(name) else {
            return;
        };
        for member in members.iter().filter(|m| m.id != origin) {
            // Fire-and-forget: a full or closed member just misses the frame.
            if member.tx.try_send(data.to_vec()).is_err() {
                debug!(channel = %name, member = member.id, "dropped frame for slow or closed member");
            }
        }
    }

    fn leave(&self, name: &str, id: u64) {
        let mut guard = self.channels.lock().unwrap();
        if let Some(members) = guard.get_mut(name) {
            members.retain(|m| m.id != id);
            if members.is_empty() {
                guard.remove(name);
            }
        }
        debug!(channel = %name, member = id, "left broadcast channel");
    }
}

impl BusSender {
    pub fn channel(&self) -> &str {
        &self.name
    }

    /// Fire-and-forget broadcast to every other member of this channel.
    pub fn publish(&self, data: &[u8]) {
        self.bus.publish(&self.name, self.id, data);
    }
}

impl Drop for BusSender {
    fn drop(&mut self) {
        self.bus.leave(&self.name, self.id);
    }
}

impl BusReceiver {
    /// Next inbound frame, or `None` once the membership is closed.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}
