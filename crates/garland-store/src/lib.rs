//! # Tree Store
//!
//! Content-addressed persistence for Merkle trees over Postgres.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `store` | `trees` / `proofs_hashes` queries and the insert-tree transaction |
//! | `cache` | bounded LRU of decoded rows plus their built trees |
//! | `backfill` | background proof-hash index repair |
//! | `migrations` | the embedded schema migration list |

pub mod backfill;
pub mod cache;
pub mod migrations;
pub mod store;

pub use cache::{CachedTree, TreeCache};
pub use migrations::MIGRATIONS;
pub use store::{StoreError, TreeRow, TreeStore};
