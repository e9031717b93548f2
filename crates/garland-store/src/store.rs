//! Queries over the `trees` and `proofs_hashes` tables.
//!
//! Trees are keyed by their root and written exactly once; the proof-hash
//! index rows for a tree are committed in the same transaction as the
//! tree row.

use garland_merkle::MerkleError;
use sqlx::PgPool;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// A stored tree no longer rebuilds to its own root. Content
    /// addressing makes this impossible without row corruption.
    #[error("stored tree for root {root} rebuilds to a different root")]
    RootMismatch { root: String },

    /// A freshly generated proof failed self-validation.
    #[error("proof self-validation failed for leaf {index}")]
    InvalidProof { index: usize },

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// A persisted tree row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TreeRow {
    /// 32-byte root, the primary key.
    pub root: Vec<u8>,
    /// Original leaves, in input order.
    pub unhashed_leaves: Vec<Vec<u8>>,
    /// ABI type names describing each leaf's layout; empty for bare
    /// address leaves.
    pub ltd: Vec<String>,
    /// Packed vs. standard ABI encoding for the leaf decoder.
    pub packed: bool,
}

/// Handle over the connection pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct TreeStore {
    pool: PgPool,
}

impl TreeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for callers that need their own queries
    /// (migrations, health checks).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Persist a tree and its proof-hash index rows in one transaction.
    ///
    /// The tree insert is `ON CONFLICT (root) DO NOTHING`, so a
    /// concurrent writer losing the race still commits its identical
    /// proof-hash rows unless the `hash` primary key objects. A
    /// duplicate hash from a different tree is surfaced as an error
    /// and rolls everything back.
    pub async fn insert_tree(
        &self,
        root: &[u8],
        leaves: &[Vec<u8>],
        ltd: &[String],
        packed: bool,
        proof_hashes: &[Vec<u8>],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO trees (root, unhashed_leaves, ltd, packed)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (root) DO NOTHING",
        )
        .bind(root)
        .bind(leaves)
        .bind(ltd)
        .bind(packed)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO proofs_hashes (hash, root)
             SELECT h, $2 FROM UNNEST($1::bytea[]) AS h",
        )
        .bind(proof_hashes)
        .bind(root)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a tree row by root.
    pub async fn tree_by_root(&self, root: &[u8]) -> Result<Option<TreeRow>, StoreError> {
        let row = sqlx::query_as::<_, TreeRow>(
            "SELECT root, unhashed_leaves, ltd, packed FROM trees WHERE root = $1",
        )
        .bind(root)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Whether a tree with this root has been published.
    pub async fn tree_exists(&self, root: &[u8]) -> Result<bool, StoreError> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM trees WHERE root = $1")
            .bind(root)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// All roots whose proof-hash index contains `hash`. Multiple roots
    /// are possible for short proofs from small trees.
    pub async fn roots_for_proof_hash(&self, hash: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let roots = sqlx::query_scalar("SELECT root FROM proofs_hashes WHERE hash = $1")
            .bind(hash)
            .fetch_all(&self.pool)
            .await?;
        Ok(roots)
    }

    /// Trees with no proof-hash index rows yet, for the backfill task.
    pub async fn trees_missing_proof_hashes(
        &self,
        limit: i64,
    ) -> Result<Vec<TreeRow>, StoreError> {
        let rows = sqlx::query_as::<_, TreeRow>(
            "SELECT root, unhashed_leaves, ltd, packed
             FROM trees
             WHERE root NOT IN (SELECT root FROM proofs_hashes)
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert proof-hash rows for an existing tree (backfill path).
    pub async fn insert_proof_hashes(
        &self,
        root: &[u8],
        proof_hashes: &[Vec<u8>],
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO proofs_hashes (hash, root)
             SELECT h, $2 FROM UNNEST($1::bytea[]) AS h",
        )
        .bind(proof_hashes)
        .bind(root)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
