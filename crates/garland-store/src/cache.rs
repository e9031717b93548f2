//! Bounded LRU of decoded tree rows plus their built level structure.
//!
//! Entries are content-addressed by root and therefore immutable; only
//! capacity eviction is needed, no TTL. Writers insert on create
//! (write-through), readers populate on first load.

use std::num::NonZeroUsize;
use std::sync::Arc;

use garland_merkle::Tree;
use garland_types::encode_hex;
use lru::LruCache;
use parking_lot::Mutex;

use crate::store::{StoreError, TreeRow, TreeStore};

/// Default number of trees held when a configured capacity is zero.
const DEFAULT_CAPACITY: usize = 512;

/// A tree row together with its materialized level structure.
#[derive(Debug)]
pub struct CachedTree {
    pub row: TreeRow,
    pub tree: Tree,
}

impl CachedTree {
    /// Rebuild the tree from a stored row, checking that it still hashes
    /// to its own root.
    pub fn from_row(row: TreeRow) -> Result<Self, StoreError> {
        let tree = Tree::build(&row.unhashed_leaves)?;
        if tree.root()[..] != row.root[..] {
            return Err(StoreError::RootMismatch {
                root: encode_hex(&row.root),
            });
        }
        Ok(Self { row, tree })
    }
}

/// Shared, bounded tree cache keyed by root.
pub struct TreeCache {
    inner: Mutex<LruCache<Vec<u8>, Arc<CachedTree>>>,
}

impl TreeCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY).expect("nonzero default"));
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cache-only lookup.
    pub fn get(&self, root: &[u8]) -> Option<Arc<CachedTree>> {
        self.inner.lock().get(root).cloned()
    }

    /// Insert an entry, evicting the least recently used if full.
    pub fn put(&self, entry: Arc<CachedTree>) {
        self.inner.lock().put(entry.row.root.clone(), entry);
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a tree by root, loading and building it from the store on
    /// a miss. Duplicate concurrent misses may load twice; the loads are
    /// idempotent so no coalescing is done.
    pub async fn get_or_load(
        &self,
        store: &TreeStore,
        root: &[u8],
    ) -> Result<Option<Arc<CachedTree>>, StoreError> {
        if let Some(hit) = self.get(root) {
            return Ok(Some(hit));
        }
        let Some(row) = store.tree_by_root(root).await? else {
            return Ok(None);
        };
        let entry = Arc::new(CachedTree::from_row(row)?);
        self.put(Arc::clone(&entry));
        Ok(Some(entry))
    }
}
