//! Typed records layered over the opaque byte store.
//!
//! Two records exist: the identity record (id, name, public key, never
//! the private key) and the chat history. Both are JSON.

use geomesh_shared::constants::{
    MAX_LOG_MESSAGES, STORAGE_KEY_HISTORY, STORAGE_KEY_IDENTITY,
};
use geomesh_shared::identity::{Identity, IdentityRecord};
use geomesh_shared::protocol::ChatMessage;

use crate::error::Result;
use crate::Store;

pub fn load_identity_record(store: &dyn Store) -> Result<Option<IdentityRecord>> {
    match store.load(STORAGE_KEY_IDENTITY)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub fn save_identity_record(store: &dyn Store, record: &IdentityRecord) -> Result<()> {
    store.save(STORAGE_KEY_IDENTITY, &serde_json::to_vec(record)?)
}

/// Load the persisted identity if present, or create a new one.
///
/// A fresh signing keypair is generated either way: the persisted record
/// keeps its `id` and `name`, only the public key is refreshed. The
/// updated record is written back before returning.
pub fn load_or_create_identity(store: &dyn Store) -> Result<Identity> {
    let identity = match load_identity_record(store)? {
        Some(record) => {
            tracing::debug!(id = %record.id, "rebuilding persisted identity with a fresh keypair");
            Identity::with_record(record)?
        }
        None => {
            let identity = Identity::generate()?;
            tracing::info!(id = %identity.id(), name = %identity.name(), "created new identity");
            identity
        }
    };
    save_identity_record(store, identity.record())?;
    Ok(identity)
}

/// Load the persisted chat history, truncated to the most recent
/// `MAX_LOG_MESSAGES` entries. Local annotations (`is_me`, `is_verified`)
/// come back unset; the session recomputes them.
pub fn load_history(store: &dyn Store) -> Result<Vec<ChatMessage>> {
    match store.load(STORAGE_KEY_HISTORY)? {
        Some(bytes) => {
            let mut messages: Vec<ChatMessage> = serde_json::from_slice(&bytes)?;
            if messages.len() > MAX_LOG_MESSAGES {
                let excess = messages.len() - MAX_LOG_MESSAGES;
                messages.drain(..excess);
            }
            Ok(messages)
        }
        None => Ok(Vec::new()),
    }
}

pub fn save_history(store: &dyn Store, messages: &[ChatMessage]) -> Result<()> {
    store.save(STORAGE_KEY_HISTORY, &serde_json::to_vec(messages)?)
}

pub fn clear_history(store: &dyn Store) -> Result<()> {
    store.remove(STORAGE_KEY_HISTORY)
}
