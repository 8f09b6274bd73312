//! Swarm session orchestration with the tokio mpsc command/notification
//! pattern.
//!
//! A session owns one broadcast channel per derived topic (home cell plus
//! neighbor ring), the presence table, and the message log. The event
//! loop runs in a dedicated tokio task; every state mutation happens
//! inside it, so frame handlers, timers, and commands never race. External
//! code communicates through typed command and notification channels.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use geomesh_shared::constants::{
    HEARTBEAT_INTERVAL_MS, MAX_LOG_MESSAGES, PEER_TIMEOUT_MS, SWEEP_INTERVAL_MS,
};
use geomesh_shared::crypto;
use geomesh_shared::identity::Identity;
use geomesh_shared::protocol::{ChatMessage, Frame, PeerAnnounce};
use geomesh_shared::topic::channel_name;
use geomesh_shared::types::now_ms;
use geomesh_store::{records, Store};

use crate::bus::{BusSender, LocalBus};
use crate::presence::{Peer, PresenceTable};

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Sign `text` and broadcast it on every open channel.
    SendMessage(String),
    /// Close all channels and join again under a new cell set.
    Rejoin {
        h3_index: String,
        neighbors: Vec<String>,
    },
    /// Request a read-only snapshot of peers and messages.
    GetSnapshot(oneshot::Sender<SessionSnapshot>),
    /// Wipe the message log and its persisted history.
    ClearHistory,
    /// Gracefully shut down the session.
    Shutdown,
}

/// Notifications sent *from* the session task to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    /// Channels are open for the home cell and its neighbors.
    Joined { cells: Vec<String> },
    /// A peer heartbeat was recorded (new or refreshed).
    PeerSeen(Peer),
    /// Silent peers were removed by the expiry sweep.
    PeersExpired { count: usize },
    /// A chat message entered the log.
    Message(ChatMessage),
    /// The message log was cleared.
    HistoryCleared,
    /// The session closed; no further frames will be processed.
    Closed,
}

/// Read-only view of session state for the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub active_peers: Vec<Peer>,
    /// Ordered ascending by sender timestamp.
    pub messages: Vec<ChatMessage>,
}

/// Configuration for spawning a session.
pub struct SessionConfig {
    /// Home cell id. Must be non-empty.
    pub h3_index: String,
    /// Neighbor ring around the home cell.
    pub neighbors: Vec<String>,
    /// Optional persistence for identity-adjacent records and history.
    pub store: Option<Arc<dyn Store>>,
    /// Presence sweep cadence.
    pub sweep_interval: Duration,
    /// Heartbeat re-publication cadence.
    pub heartbeat_interval: Duration,
    /// Peer liveness timeout in milliseconds.
    pub peer_timeout_ms: i64,
}

impl SessionConfig {
    pub fn new(h3_index: impl Into<String>, neighbors: Vec<String>) -> Self {
        Self {
            h3_index: h3_index.into(),
            neighbors,
            store: None,
            sweep_interval: Duration::from_millis(SWEEP_INTERVAL_MS),
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
            peer_timeout_ms: PEER_TIMEOUT_MS,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

/// Spawn a swarm session in a background tokio task.
///
/// Opens one channel per derived topic for the home cell and each
/// neighbor, announces the local identity on each, and starts the expiry
/// sweep and heartbeat timers. Returns channels for sending commands and
/// receiving notifications.
pub async fn spawn_session(
    identity: Identity,
    bus: LocalBus,
    config: SessionConfig,
) -> anyhow::Result<(
    mpsc::Sender<SessionCommand>,
    mpsc::Receiver<SessionNotification>,
)> {
    if config.h3_index.is_empty() {
        anyhow::bail!("session requires a non-empty home cell id");
    }

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<SessionCommand>(256);
    let (notif_tx, notif_rx) = mpsc::channel::<SessionNotification>(256);

    let SessionConfig {
        h3_index,
        neighbors,
        store,
        sweep_interval,
        heartbeat_interval,
        peer_timeout_ms,
    } = config;

    let mut session = Session {
        identity,
        bus,
        store,
        peer_timeout_ms,
        h3_index: String::new(),
        channels: HashMap::new(),
        forwarders: Vec::new(),
        inbound_tx: None,
        presence: PresenceTable::new(),
        messages: Vec::new(),
        notif_tx,
        state: SessionState::Idle,
    };
    session.load_history();

    info!(id = %session.identity.id(), cell = %h3_index, "starting swarm session");

    tokio::spawn(async move {
        let mut inbound_rx = session.join(h3_index, neighbors).await;

        let mut sweep = interval_at(Instant::now() + sweep_interval, sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut beacon = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
        beacon.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = cmd_rx.recv() => {
                    match command {
                        Some(SessionCommand::SendMessage(text)) => {
                            session.send_chat(&text).await;
                        }
                        Some(SessionCommand::Rejoin { h3_index, neighbors }) => {
                            if h3_index.is_empty() {
                                warn!("ignoring rejoin with an empty home cell id");
                            } else {
                                inbound_rx = session.rejoin(h3_index, neighbors).await;
                            }
                        }
                        Some(SessionCommand::GetSnapshot(reply)) => {
                            let _ = reply.send(session.snapshot());
                        }
                        Some(SessionCommand::ClearHistory) => {
                            session.clear_history().await;
                        }
                        Some(SessionCommand::Shutdown) => {
                            info!("session shutdown requested");
                            break;
                        }
                        None => {
                            // All command senders dropped.
                            info!("command channel closed, shutting down session");
                            break;
                        }
                    }
                }

                Some((cell, data)) = inbound_rx.recv() => {
                    session.handle_frame(&cell, &data).await;
                }

                _ = sweep.tick() => session.sweep().await,

                _ = beacon.tick() => session.beacon(),
            }
        }

        session.teardown().await;
        info!("session event loop terminated");
    });

    Ok((cmd_tx, notif_rx))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Joining,
    Joined,
    Closed,
}

/// Frames forwarded from channel receivers into the event loop, tagged
/// with the source cell.
type Inbound = (String, Vec<u8>);

struct Session {
    identity: Identity,
    bus: LocalBus,
    store: Option<Arc<dyn Store>>,
    peer_timeout_ms: i64,
    /// Home cell for the current join.
    h3_index: String,
    /// Open channels, keyed by source cell id.
    channels: HashMap<String, BusSender>,
    /// Tasks pumping channel receivers into the inbound queue.
    forwarders: Vec<JoinHandle<()>>,
    /// Kept so the inbound queue never reads as closed between frames.
    inbound_tx: Option<mpsc::Sender<Inbound>>,
    presence: PresenceTable,
    messages: Vec<ChatMessage>,
    notif_tx: mpsc::Sender<SessionNotification>,
    state: SessionState,
}

impl Session {
    // -- join / rejoin / teardown -------------------------------------------

    /// Open one channel per derived topic for `h3_index` and each
    /// neighbor, announce on each, and return the merged inbound queue.
    async fn join(&mut self, h3_index: String, neighbors: Vec<String>) -> mpsc::Receiver<Inbound> {
        self.state = SessionState::Joining;
        self.h3_index = h3_index;

        let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(256);
        self.inbound_tx = Some(inbound_tx.clone());

        let announce = self.local_announce();
        let cells: Vec<String> = std::iter::once(self.h3_index.clone())
            .chain(neighbors)
            .collect();

        for cell in &cells {
            // The neighbor ring may include the home cell; one channel each.
            if self.channels.contains_key(cell) {
                continue;
            }

            let name = channel_name(cell);
            let (sender, mut receiver) = self.bus.open(&name);

            let forward_tx = inbound_tx.clone();
            let source_cell = cell.clone();
            self.forwarders.push(tokio::spawn(async move {
                while let Some(data) = receiver.recv().await {
                    if forward_tx.send((source_cell.clone(), data)).await.is_err() {
                        break;
                    }
                }
            }));

            publish_frame(&sender, &Frame::Ping(announce.clone()));
            debug!(cell = %cell, channel = %name, "opened swarm channel");
            self.channels.insert(cell.clone(), sender);
        }

        self.state = SessionState::Joined;
        let joined: Vec<String> = self.channels.keys().cloned().collect();
        self.notify(SessionNotification::Joined { cells: joined }).await;

        inbound_rx
    }

    /// Close every channel and join again under a new cell set. Presence
    /// is cleared, not migrated; the message log is kept.
    async fn rejoin(
        &mut self,
        h3_index: String,
        neighbors: Vec<String>,
    ) -> mpsc::Receiver<Inbound> {
        info!(cell = %h3_index, "rejoining swarm under new cell set");
        self.close_channels();
        self.presence.clear();
        self.join(h3_index, neighbors).await
    }

    fn close_channels(&mut self) {
        // Dropping the senders detaches every membership.
        self.channels.clear();
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        self.inbound_tx = None;
    }

    async fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.close_channels();
        self.presence.clear();
        self.state = SessionState::Closed;
        self.notify(SessionNotification::Closed).await;
    }

    // -- frame handling ------------------------------------------------------

    async fn handle_frame(&mut self, cell: &str, data: &[u8]) {
        let frame = match Frame::from_bytes(data) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(cell = %cell, error = %e, "dropping malformed frame");
                return;
            }
        };

        match frame {
            Frame::Ping(announce) => {
                let peer = self.presence.record_heartbeat(&announce, now_ms());
                self.notify(SessionNotification::PeerSeen(peer)).await;

                // Answer on the channel the ping arrived on, so the new
                // participant learns about us without waiting for the next
                // beacon. Pongs are never answered, preventing loops.
                let reply = Frame::Pong(self.local_announce());
                if let Some(channel) = self.channels.get(cell) {
                    publish_frame(channel, &reply);
                }
            }
            Frame::Pong(announce) => {
                let peer = self.presence.record_heartbeat(&announce, now_ms());
                self.notify(SessionNotification::PeerSeen(peer)).await;
            }
            Frame::Chat(message) => self.handle_chat(message).await,
        }
    }

    async fn handle_chat(&mut self, mut message: ChatMessage) {
        // First-seen wins; the same message arrives once per shared topic.
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!(id = %message.id, "dropping duplicate message");
            return;
        }

        message.is_verified = crypto::verify(
            &message.text,
            &message.signature,
            &message.sender_public_key,
        );
        message.is_me = message.sender_id == *self.identity.id();

        if !message.is_verified {
            // Kept and flagged, never suppressed.
            warn!(sender = %message.sender_id, id = %message.id, "message failed signature verification");
        }

        self.insert_message(message.clone());
        self.notify(SessionNotification::Message(message)).await;
    }

    // -- chat send -----------------------------------------------------------

    async fn send_chat(&mut self, text: &str) {
        let signature = crypto::sign(text, self.identity.signing_key());
        let message = ChatMessage {
            id: Uuid::new_v4().simple().to_string(),
            sender_id: self.identity.id().clone(),
            sender_name: self.identity.name().to_string(),
            sender_public_key: self.identity.public_key().to_string(),
            text: text.to_string(),
            signature,
            timestamp: now_ms(),
            h3_index: self.h3_index.clone(),
            is_me: true,
            is_verified: true,
        };

        // Optimistic local echo before any publish.
        self.insert_message(message.clone());

        // Broadcast on every joined topic, not just the home cell, so
        // neighbor-cell listeners receive it too.
        let frame = Frame::Chat(message.clone());
        for channel in self.channels.values() {
            publish_frame(channel, &frame);
        }

        self.notify(SessionNotification::Message(message)).await;
    }

    // -- timers --------------------------------------------------------------

    async fn sweep(&mut self) {
        let removed = self.presence.sweep_expired(now_ms(), self.peer_timeout_ms);
        if removed > 0 {
            self.notify(SessionNotification::PeersExpired { count: removed })
                .await;
        }
    }

    /// Periodic heartbeat so peers outlive the liveness timeout while we
    /// stay in the cell.
    fn beacon(&self) {
        let frame = Frame::Ping(self.local_announce());
        for channel in self.channels.values() {
            publish_frame(channel, &frame);
        }
    }

    // -- state helpers -------------------------------------------------------

    fn local_announce(&self) -> PeerAnnounce {
        PeerAnnounce {
            id: self.identity.id().clone(),
            name: self.identity.name().to_string(),
            public_key: self.identity.public_key().to_string(),
            h3_index: self.h3_index.clone(),
        }
    }

    /// Insert, keep ascending timestamp order, bound the log, persist.
    fn insert_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.messages.sort_by_key(|m| m.timestamp);
        if self.messages.len() > MAX_LOG_MESSAGES {
            let excess = self.messages.len() - MAX_LOG_MESSAGES;
            self.messages.drain(..excess);
        }
        self.persist_history();
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_peers: self.presence.active_peers(),
            messages: self.messages.clone(),
        }
    }

    async fn clear_history(&mut self) {
        self.messages.clear();
        if let Some(store) = &self.store {
            if let Err(e) = records::clear_history(store.as_ref()) {
                warn!(error = %e, "failed to clear persisted history");
            }
        }
        self.notify(SessionNotification::HistoryCleared).await;
    }

    fn load_history(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match records::load_history(store.as_ref()) {
            Ok(mut messages) => {
                // Annotations are session-local: recompute them on load.
                // Verification runs against the key embedded in each
                // message, so entries from prior sessions still verify
                // even after the local keypair rotates.
                for message in &mut messages {
                    message.is_me = message.sender_id == *self.identity.id();
                    message.is_verified = crypto::verify(
                        &message.text,
                        &message.signature,
                        &message.sender_public_key,
                    );
                }
                messages.sort_by_key(|m| m.timestamp);
                debug!(count = messages.len(), "loaded chat history");
                self.messages = messages;
            }
            Err(e) => warn!(error = %e, "failed to load chat history"),
        }
    }

    fn persist_history(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = records::save_history(store.as_ref(), &self.messages) {
                warn!(error = %e, "failed to persist chat history");
            }
        }
    }

    async fn notify(&self, notification: SessionNotification) {
        let _ = self.notif_tx.send(notification).await;
    }
}

fn publish_frame(channel: &BusSender, frame: &Frame) {
    match frame.to_bytes() {
        Ok(bytes) => channel.publish(&bytes),
        Err(e) => warn!(error = %e, "failed to encode frame"),
    }
}
