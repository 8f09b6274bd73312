//! In-memory store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;
use crate::Store;

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());

        store.save("k", b"value").unwrap();
        assert_eq!(store.load("k").unwrap().unwrap(), b"value");

        store.remove("k").unwrap();
        assert!(store.load("k").unwrap().is_none());
    }
}
