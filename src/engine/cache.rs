use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::RwLock;

/// Process-lifetime memo map for generated records. Populated lazily on
/// first successful computation, never evicted or invalidated.
///
/// Values are inserted only after full construction and validation
/// (populate-then-publish), so concurrent readers never observe a partial
/// value. There is no single-flight de-duplication: two callers racing on
/// the same key may both compute, and the last writer wins.
pub struct MemoCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries.write().await.insert(key, value);
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
