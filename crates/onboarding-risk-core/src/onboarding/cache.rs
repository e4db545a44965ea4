use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::field_mapping::EntityArchetype;
use super::rule_index::RuleIndex;

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexCacheKey {
    pub archetype: EntityArchetype,
    pub include_shareholders: bool,
}

#[derive(Debug, Clone)]
struct CachedIndex {
    index: Arc<RuleIndex>,
    expires_at: DateTime<Utc>,
}

/// Built rule indexes keyed by archetype, each valid until its expiry.
///
/// Entries are immutable `Arc` snapshots: a rebuild replaces the entry
/// wholesale, and readers holding the previous snapshot are unaffected.
pub struct RuleIndexCache {
    entries: RwLock<HashMap<IndexCacheKey, CachedIndex>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RuleIndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleIndexCache")
            .field("entries", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for RuleIndexCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RuleIndexCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Live snapshot for `key`; expired entries read as a miss.
    pub fn get(&self, key: &IndexCacheKey) -> Option<Arc<RuleIndex>> {
        let now = self.clock.now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| Arc::clone(&entry.index))
    }

    pub fn put(&self, key: IndexCacheKey, index: Arc<RuleIndex>, expires_at: DateTime<Utc>) {
        self.entries
            .write()
            .insert(key, CachedIndex { index, expires_at });
    }

    pub fn invalidate(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
