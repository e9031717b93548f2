//! # HTTP API
//!
//! The public face of Garland: publish a Merkle tree, read it back by
//! root, fetch an inclusion proof by leaf or by address, and reverse-look
//! up the root(s) a proof path belongs to.
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/v1/tree` | Publish a tree, returning its root |
//! | GET | `/api/v1/tree?root=` | Read back a published tree |
//! | GET | `/api/v1/proof?root=&unhashedLeaf=` | Proof for an exact leaf |
//! | GET | `/api/v1/proof?root=&address=` | Proof for the leaf embedding an address |
//! | GET | `/api/v1/root?proof=` | Root for a proof path (deprecated single form) |
//! | GET | `/api/v1/roots?proof=` | All roots for a proof path |
//! | GET | `/health` | Build identifier |
//!
//! Every byte-carrying field is lenient `0x` hex in and lowercase `0x`
//! hex out. Errors are `{"error": true, "message": "..."}` with internal
//! detail kept to the logs.

pub mod error;
pub mod handlers;
pub mod ipfs;
pub mod pipeline;
pub mod router;
pub mod settings;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::router;
pub use settings::Settings;
pub use state::ApiState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
