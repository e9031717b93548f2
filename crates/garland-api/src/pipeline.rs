//! The create-tree pipeline: build once, prove every leaf in parallel,
//! self-validate each proof before anything is persisted.
//!
//! The tree is immutable after build, so proof generation fans out
//! across cores freely; the only shared-mutable state is the hash
//! accumulator behind a mutex. Cancellation is cooperative: the token
//! is checked between leaves, so a dropped request stops burning CPU.

use std::sync::Arc;

use garland_merkle::{proof_hash, validate, MerkleError, Tree};
use parking_lot::Mutex;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

/// Pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// A freshly generated proof did not validate against the root.
    #[error("generated proof for leaf {index} failed validation")]
    InvalidProof { index: usize },

    #[error("request cancelled")]
    Cancelled,

    #[error("proof generation task failed")]
    Join,
}

/// Build a tree off the async runtime's threads.
pub async fn build_tree(leaves: Vec<Vec<u8>>) -> Result<Arc<Tree>, PipelineError> {
    let tree = tokio::task::spawn_blocking(move || Tree::build(&leaves))
        .await
        .map_err(|_| PipelineError::Join)??;
    Ok(Arc::new(tree))
}

/// Generate, self-validate, and hash the proof for every leaf, in
/// parallel across the available cores. Returns one proof hash per leaf
/// in original leaf order.
pub async fn prove_all(
    tree: Arc<Tree>,
    leaves: Arc<Vec<Vec<u8>>>,
    cancel: CancellationToken,
) -> Result<Vec<Vec<u8>>, PipelineError> {
    tokio::task::spawn_blocking(move || {
        let root = tree.root();
        let collected: Mutex<Vec<(usize, Vec<u8>)>> = Mutex::new(Vec::with_capacity(leaves.len()));

        leaves.par_iter().enumerate().try_for_each(|(index, leaf)| {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let proof = tree.proof(index);
            if !validate(&root, &proof, leaf) {
                return Err(PipelineError::InvalidProof { index });
            }
            collected.lock().push((index, proof_hash(&proof).to_vec()));
            Ok(())
        })?;

        let mut pairs = collected.into_inner();
        pairs.sort_unstable_by_key(|(index, _)| *index);
        Ok(pairs.into_iter().map(|(_, hash)| hash).collect())
    })
    .await
    .map_err(|_| PipelineError::Join)?
}
