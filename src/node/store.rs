// src/node/store.rs
use dashmap::DashMap;

/// Key/value storage backing a node's local lookups.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: &str);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the bucket the entries live in.
    fn bucket(&self) -> &str;

    /// Seed the store, overwriting keys that already exist.
    fn fill(&self, entries: &[(&str, &str)]) {
        for (key, value) in entries {
            self.put(key, value);
        }
        tracing::debug!(bucket = %self.bucket(), entries = self.len(), "store filled");
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            entries: DashMap::new(),
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn put(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
