//! Background repair of the proof-hash index.
//!
//! New writes commit their index rows with the tree, so this task only
//! matters for trees whose rows predate the index or whose insert was
//! interrupted. It wakes on a short interval, rebuilds each orphaned
//! tree from its stored leaves, validates every regenerated proof, and
//! bulk-inserts the hashes. Failures are logged and retried on the next
//! tick; nothing here is load-bearing for new writes.

use std::time::Duration;

use garland_merkle::{proof_hash, validate, Tree};
use garland_types::encode_hex;
use tracing::{error, info, warn};

use crate::store::{StoreError, TreeRow, TreeStore};

/// Trees repaired per tick; keeps a single tick's work bounded.
const BATCH_LIMIT: i64 = 100;

/// Run the backfill loop forever. Spawn as a background task.
pub async fn run(store: TreeStore, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match sync_once(&store).await {
            Ok(0) => {}
            Ok(rows) => info!(rows, "synced proof index"),
            Err(err) => error!(error = %err, "failed to sync proof index"),
        }
    }
}

/// One backfill pass. Returns how many index rows were written.
pub async fn sync_once(store: &TreeStore) -> Result<u64, StoreError> {
    let orphaned = store.trees_missing_proof_hashes(BATCH_LIMIT).await?;
    let mut written = 0u64;
    for row in orphaned {
        let root = encode_hex(&row.root);
        match rebuild_proof_hashes(&row) {
            Ok(hashes) => {
                store.insert_proof_hashes(&row.root, &hashes).await?;
                written += hashes.len() as u64;
            }
            Err(err) => {
                // A tree that cannot be rebuilt is skipped, not fatal to
                // the pass; the operator sees it every tick until fixed.
                warn!(root = %root, error = %err, "skipping unrepairable tree");
            }
        }
    }
    Ok(written)
}

/// Rebuild a stored tree and produce one validated proof hash per leaf,
/// in leaf order.
pub fn rebuild_proof_hashes(row: &TreeRow) -> Result<Vec<Vec<u8>>, StoreError> {
    let tree = Tree::build(&row.unhashed_leaves)?;
    if tree.root()[..] != row.root[..] {
        return Err(StoreError::RootMismatch {
            root: encode_hex(&row.root),
        });
    }
    let root = tree.root();
    let mut hashes = Vec::with_capacity(row.unhashed_leaves.len());
    for (index, leaf) in row.unhashed_leaves.iter().enumerate() {
        let proof = tree.proof(index);
        if !validate(&root, &proof, leaf) {
            return Err(StoreError::InvalidProof { index });
        }
        hashes.push(proof_hash(&proof).to_vec());
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(leaves: &[&str]) -> TreeRow {
        let leaves: Vec<Vec<u8>> = leaves.iter().map(|l| l.as_bytes().to_vec()).collect();
        let tree = Tree::build(&leaves).unwrap();
        TreeRow {
            root: tree.root().to_vec(),
            unhashed_leaves: leaves,
            ltd: Vec::new(),
            packed: false,
        }
    }

    #[test]
    fn rebuilds_one_hash_per_leaf() {
        let r = row(&["a", "b", "c", "d", "e"]);
        let hashes = rebuild_proof_hashes(&r).unwrap();
        assert_eq!(hashes.len(), 5);

        let tree = Tree::build(&r.unhashed_leaves).unwrap();
        for (i, h) in hashes.iter().enumerate() {
            assert_eq!(h[..], proof_hash(&tree.proof(i))[..]);
        }
    }

    #[test]
    fn rejects_root_mismatch() {
        let mut r = row(&["a", "b"]);
        r.root = vec![0u8; 32];
        assert!(matches!(
            rebuild_proof_hashes(&r),
            Err(StoreError::RootMismatch { .. })
        ));
    }
}
