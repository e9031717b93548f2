//! Request handlers for the `/api/v1` surface.

pub mod proof;
pub mod root;
pub mod tree;

/// Published trees are immutable, so reads cache for a day.
pub(crate) const CACHE_TREE_OK: &str = "public, max-age=86400";
/// Negative answers may flip to positive on the next publish.
pub(crate) const CACHE_NOT_FOUND: &str = "public, max-age=60";
/// A proof for an exact leaf of an immutable tree never changes.
pub(crate) const CACHE_PROOF_LEAF: &str = "public, max-age=31536000";
/// Address lookup depends on decoder behavior, cached briefly.
pub(crate) const CACHE_PROOF_ADDRESS: &str = "public, max-age=60";
/// Reverse lookups gain rows only when colliding trees are published.
pub(crate) const CACHE_ROOT_OK: &str = "public, max-age=3600";
