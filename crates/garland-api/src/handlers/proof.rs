//! Inclusion proofs, keyed by exact leaf or by embedded address.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garland_merkle::leaf_address;
use garland_types::{decode_hex, encode_hex, Address, HexBytes};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{CACHE_NOT_FOUND, CACHE_PROOF_ADDRESS, CACHE_PROOF_LEAF};
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProofQuery {
    pub root: Option<String>,
    pub unhashed_leaf: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProofResponse {
    pub unhashed_leaf: String,
    pub proof: Vec<HexBytes>,
}

/// GET /api/v1/proof?root=0x…&unhashedLeaf=0x… (or &address=0x…)
///
/// The leaf form returns the proof for that exact byte string. The
/// address form scans the tree's leaves, decodes each one with the
/// tree's stored type descriptor, and returns the first leaf whose
/// embedded address matches.
pub async fn get_proof(
    State(state): State<ApiState>,
    Query(query): Query<GetProofQuery>,
) -> ApiResult<Response> {
    let root_hex = query
        .root
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing root"))?;
    let leaf_param = query.unhashed_leaf.filter(|l| !l.is_empty());
    let addr_param = query.address.filter(|a| !a.is_empty());
    if leaf_param.is_none() && addr_param.is_none() {
        return Err(ApiError::bad_request("missing leaf"));
    }

    let root = decode_hex(&root_hex).map_err(|_| ApiError::bad_request("invalid root"))?;
    let Some(entry) = state.cache.get_or_load(&state.store, &root).await? else {
        return Err(ApiError::not_found("tree not found").with_cache_control(CACHE_NOT_FOUND));
    };

    if let Some(leaf_hex) = leaf_param {
        let leaf = decode_hex(&leaf_hex).map_err(|_| ApiError::bad_request("invalid leaf"))?;
        let proof = entry.tree.proof_for_leaf(&leaf);
        // A multi-leaf tree never has an empty proof, so empty means the
        // leaf is not a member.
        if proof.is_empty() && entry.tree.leaf_count() > 1 {
            return Err(
                ApiError::not_found("leaf not found in tree").with_cache_control(CACHE_NOT_FOUND)
            );
        }
        return Ok(proof_response(&leaf, &proof, CACHE_PROOF_LEAF));
    }

    // Address lookup; non-empty by the check above.
    let addr_hex = addr_param.unwrap_or_default();
    let address: Address = addr_hex
        .parse()
        .map_err(|_| ApiError::bad_request("invalid address"))?;

    let row = &entry.row;
    for (index, leaf) in row.unhashed_leaves.iter().enumerate() {
        if leaf_address(leaf, &row.ltd, row.packed) == Some(address) {
            let proof = entry.tree.proof(index);
            return Ok(proof_response(leaf, &proof, CACHE_PROOF_ADDRESS));
        }
    }

    Err(ApiError::not_found("proof not found for address").with_cache_control(CACHE_NOT_FOUND))
}

fn proof_response(leaf: &[u8], proof: &[garland_merkle::Hash], cache_control: &'static str) -> Response {
    let body = GetProofResponse {
        unhashed_leaf: encode_hex(leaf),
        proof: proof.iter().map(|h| HexBytes::from(h.as_slice())).collect(),
    };
    ([(header::CACHE_CONTROL, cache_control)], Json(body)).into_response()
}
