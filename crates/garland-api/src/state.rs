//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use garland_store::{TreeCache, TreeStore};

use crate::settings::Settings;

/// Trees held in the shared LRU.
const TREE_CACHE_CAPACITY: usize = 512;

/// State cloned into every handler.
#[derive(Clone)]
pub struct ApiState {
    pub store: TreeStore,
    pub cache: Arc<TreeCache>,
    pub settings: Arc<Settings>,
    /// Client for the IPFS pinning side-channel.
    pub http: reqwest::Client,
}

impl ApiState {
    pub fn new(store: TreeStore, settings: Settings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            store,
            cache: Arc::new(TreeCache::new(TREE_CACHE_CAPACITY)),
            settings: Arc::new(settings),
            http,
        }
    }
}
