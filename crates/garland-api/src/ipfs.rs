//! Best-effort IPFS pinning of published trees.
//!
//! When a pinning service is configured, every successful create posts
//! the tree JSON to it in the background. Failures are logged and never
//! affect the create response.

use std::sync::Arc;

use garland_store::CachedTree;
use garland_types::encode_hex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::ApiState;

#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("pinning request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pinning service returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinPayload {
    root: String,
    unhashed_leaves: Vec<String>,
    leaf_type_descriptor: Vec<String>,
    packed_encoding: bool,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Spawn a background pin of a freshly created tree. No-op when the
/// pinning service is not configured.
pub fn spawn_pin(state: &ApiState, entry: Arc<CachedTree>) {
    let Some(url) = state.settings.ipfs_pinning_service_url.clone() else {
        return;
    };
    let secret = state.settings.ipfs_pinning_secret.clone().unwrap_or_default();
    let client = state.http.clone();
    let root = encode_hex(&entry.row.root);

    tokio::spawn(async move {
        match pin_tree(&client, &url, &secret, &entry).await {
            Ok(hash) => info!(root = %root, ipfs_hash = %hash, "pinned tree"),
            Err(err) => warn!(root = %root, error = %err, "failed to pin tree"),
        }
    });
}

async fn pin_tree(
    client: &reqwest::Client,
    url: &str,
    secret: &str,
    entry: &CachedTree,
) -> Result<String, PinError> {
    let payload = PinPayload {
        root: encode_hex(&entry.row.root),
        unhashed_leaves: entry
            .row
            .unhashed_leaves
            .iter()
            .map(|l| encode_hex(l))
            .collect(),
        leaf_type_descriptor: entry.row.ltd.clone(),
        packed_encoding: entry.row.packed,
    };

    let response = client
        .post(url)
        .bearer_auth(secret)
        .json(&payload)
        .send()
        .await?;

    if response.status().is_client_error() || response.status().is_server_error() {
        return Err(PinError::Status(response.status()));
    }

    let body: PinResponse = response.json().await?;
    Ok(body.ipfs_hash)
}
