//! Publishing trees and reading them back.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garland_store::{CachedTree, TreeRow};
use garland_types::{decode_hex, encode_hex, HexBytes};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{CACHE_NOT_FOUND, CACHE_TREE_OK};
use crate::state::ApiState;
use crate::{ipfs, pipeline};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreeRequest {
    #[serde(default)]
    pub unhashed_leaves: Vec<HexBytes>,
    #[serde(default)]
    pub leaf_type_descriptor: Option<Vec<String>>,
    #[serde(default)]
    pub packed_encoding: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreeResponse {
    pub merkle_root: String,
}

/// POST /api/v1/tree
///
/// Builds the tree, self-validates a proof for every leaf in parallel,
/// and commits the tree row together with its proof-hash index. A
/// republish of identical leaves is a no-op that returns the existing
/// root.
pub async fn create_tree(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTreeRequest>, JsonRejection>,
) -> ApiResult<Json<CreateTreeResponse>> {
    let Json(req) = payload
        .map_err(|_| ApiError::bad_request("unhashedLeaves must be a list of hex strings"))?;

    match req.unhashed_leaves.len() {
        0 => return Err(ApiError::bad_request("No leaves provided")),
        1 => return Err(ApiError::bad_request("You must provide at least two values")),
        _ => {}
    }

    let leaves: Vec<Vec<u8>> = req
        .unhashed_leaves
        .into_iter()
        .map(HexBytes::into_vec)
        .collect();
    let ltd = req.leaf_type_descriptor.unwrap_or_default();
    let packed = req.packed_encoding.unwrap_or(false);

    let tree = pipeline::build_tree(leaves.clone()).await?;
    let root = tree.root();

    // Identical leaves hash to the same root, so a republish needs no
    // proof work and no writes.
    if state.store.tree_exists(&root).await? {
        return Ok(Json(CreateTreeResponse {
            merkle_root: encode_hex(&root),
        }));
    }

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let leaves = Arc::new(leaves);
    let proof_hashes =
        pipeline::prove_all(Arc::clone(&tree), Arc::clone(&leaves), cancel).await?;

    state
        .store
        .insert_tree(&root, &leaves, &ltd, packed, &proof_hashes)
        .await?;

    let row = TreeRow {
        root: root.to_vec(),
        unhashed_leaves: Arc::try_unwrap(leaves).unwrap_or_else(|shared| (*shared).clone()),
        ltd,
        packed,
    };
    let built = Arc::try_unwrap(tree).unwrap_or_else(|shared| (*shared).clone());
    let entry = Arc::new(CachedTree { row, tree: built });
    state.cache.put(Arc::clone(&entry));

    ipfs::spawn_pin(&state, entry);

    Ok(Json(CreateTreeResponse {
        merkle_root: encode_hex(&root),
    }))
}

#[derive(Debug, Deserialize)]
pub struct GetTreeQuery {
    pub root: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTreeResponse {
    pub unhashed_leaves: Vec<HexBytes>,
    pub leaf_count: usize,
    pub leaf_type_descriptor: Vec<String>,
    pub packed_encoding: bool,
}

/// GET /api/v1/tree?root=0x…
pub async fn get_tree(
    State(state): State<ApiState>,
    Query(query): Query<GetTreeQuery>,
) -> ApiResult<Response> {
    let root_hex = query
        .root
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing root"))?;
    let root = decode_hex(&root_hex).map_err(|_| ApiError::bad_request("invalid root"))?;

    let Some(entry) = state.cache.get_or_load(&state.store, &root).await? else {
        return Err(
            ApiError::not_found("tree not found for root").with_cache_control(CACHE_NOT_FOUND)
        );
    };

    let body = GetTreeResponse {
        unhashed_leaves: entry
            .row
            .unhashed_leaves
            .iter()
            .map(|l| HexBytes::from(l.as_slice()))
            .collect(),
        leaf_count: entry.row.unhashed_leaves.len(),
        leaf_type_descriptor: entry.row.ltd.clone(),
        packed_encoding: entry.row.packed,
    };
    Ok(([(header::CACHE_CONTROL, CACHE_TREE_OK)], Json(body)).into_response())
}
