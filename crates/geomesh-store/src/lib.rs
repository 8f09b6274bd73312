//! # geomesh-store
//!
//! Local persistence collaborator for GeoMesh: an opaque key/value byte
//! store plus typed helpers for the two records the mesh persists, the
//! identity record and the chat history. Storage is not required for
//! protocol correctness; sessions run fine without one.

pub mod file;
pub mod memory;
pub mod records;

mod error;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Opaque key/value persistence. `load` of an absent key is `Ok(None)`,
/// not an error.
pub trait Store: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
