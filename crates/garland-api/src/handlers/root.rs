//! Reverse lookup: which root(s) produced a proof path.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garland_merkle::keccak256_concat;
use garland_types::{decode_hex, HexBytes};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{CACHE_NOT_FOUND, CACHE_ROOT_OK};
use crate::state::ApiState;

const DEPRECATION_NOTE: &str = "This endpoint is deprecated. For smaller trees, there are often \
     collisions with the same root for different proofs. Please use the /api/v1/roots endpoint \
     instead.";

#[derive(Debug, Deserialize)]
pub struct GetRootQuery {
    pub proof: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetRootResponse {
    pub root: HexBytes,
    pub note: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GetRootsResponse {
    pub roots: Vec<HexBytes>,
}

/// GET /api/v1/root?proof=0x…,0x…
///
/// Deprecated single-root form: returns the first match with a note.
pub async fn get_root(
    State(state): State<ApiState>,
    Query(query): Query<GetRootQuery>,
) -> ApiResult<Response> {
    let roots = lookup_roots(&state, query.proof.as_deref()).await?;
    let first = roots
        .into_iter()
        .next()
        .unwrap_or_default();
    let body = GetRootResponse {
        root: HexBytes(first),
        note: DEPRECATION_NOTE,
    };
    Ok(([(header::CACHE_CONTROL, CACHE_ROOT_OK)], Json(body)).into_response())
}

/// GET /api/v1/roots?proof=0x…,0x…
///
/// Returns every root whose proof-hash index contains this path.
pub async fn get_roots(
    State(state): State<ApiState>,
    Query(query): Query<GetRootQuery>,
) -> ApiResult<Response> {
    let roots = lookup_roots(&state, query.proof.as_deref()).await?;
    let body = GetRootsResponse {
        roots: roots.into_iter().map(HexBytes).collect(),
    };
    Ok(([(header::CACHE_CONTROL, CACHE_ROOT_OK)], Json(body)).into_response())
}

/// Shared parse → hash → query path. A zero-row result is the 404.
async fn lookup_roots(
    state: &ApiState,
    proof_param: Option<&str>,
) -> Result<Vec<Vec<u8>>, ApiError> {
    let nodes = parse_proof_param(proof_param)?;
    let parts: Vec<&[u8]> = nodes.iter().map(Vec::as_slice).collect();
    let hash = keccak256_concat(&parts);

    let roots = state.store.roots_for_proof_hash(&hash).await?;
    if roots.is_empty() {
        return Err(
            ApiError::not_found("root not found for proofs").with_cache_control(CACHE_NOT_FOUND)
        );
    }
    Ok(roots)
}

/// Parse a comma-separated list of hex proof nodes.
fn parse_proof_param(param: Option<&str>) -> Result<Vec<Vec<u8>>, ApiError> {
    let malformed = || ApiError::bad_request("missing or malformed list of proofs");

    let raw = param.unwrap_or_default();
    if raw.is_empty() {
        return Err(malformed());
    }
    let mut nodes = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() || part == "0x" {
            return Err(malformed());
        }
        nodes.push(decode_hex(part).map_err(|_| malformed())?);
    }
    Ok(nodes)
}
