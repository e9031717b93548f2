//! End-to-end API tests against a real Postgres.
//!
//! Ignored by default; run with a scratch database:
//!
//! ```sh
//! DATABASE_URL=postgres:///garland_test cargo test -p garland-api -- --ignored
//! ```

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use garland_api::{ApiState, Settings};
use garland_merkle::validate;
use garland_store::TreeStore;
use garland_types::decode_hex;
use serde_json::{json, Value};
use tower::ServiceExt;

const FIVE_ADDRESS_ROOT: &str =
    "0xa7a6b1cb6d12308ec4818baac3413fafa9e8b52cdcd79252fa9e29c9a2f8aff1";

fn five_addresses() -> Vec<String> {
    (1..=5)
        .map(|i| format!("0x{:040x}", i))
        .collect()
}

async fn test_router() -> Router {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres:///garland_test".to_string());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("test database");
    garland_migrate::run(&pool, garland_store::MIGRATIONS)
        .await
        .expect("migrations");
    // Running the migrator again must be a no-op.
    garland_migrate::run(&pool, garland_store::MIGRATIONS)
        .await
        .expect("migrations are idempotent");

    let settings = Settings {
        env: "dev".into(),
        listen: "127.0.0.1:0".parse().unwrap(),
        database_url: url,
        git_sha: "test-sha".into(),
        ipfs_pinning_service_url: None,
        ipfs_pinning_secret: None,
    };
    garland_api::router(ApiState::new(TreeStore::new(pool), settings))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn post_tree(router: &Router, body: Value) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::post("/api/v1/tree")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(router: &Router, uri: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a scratch postgres"]
async fn publish_read_prove_and_reverse_lookup() {
    let router = test_router().await;

    // Publish the five-address tree.
    let response = post_tree(&router, json!({ "unhashedLeaves": five_addresses() })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["merkleRoot"], FIVE_ADDRESS_ROOT);

    // Republish is idempotent and returns the same root.
    let response = post_tree(&router, json!({ "unhashedLeaves": five_addresses() })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["merkleRoot"], FIVE_ADDRESS_ROOT);

    // Read the tree back in original order.
    let response = get(&router, &format!("/api/v1/tree?root={FIVE_ADDRESS_ROOT}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=86400"
    );
    let body = json_body(response).await;
    assert_eq!(body["leafCount"], 5);
    let leaves: Vec<String> = body["unhashedLeaves"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(leaves, five_addresses());

    // Proof for the third leaf validates against the root.
    let leaf = &five_addresses()[2];
    let response = get(
        &router,
        &format!("/api/v1/proof?root={FIVE_ADDRESS_ROOT}&unhashedLeaf={leaf}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=31536000"
    );
    let body = json_body(response).await;
    assert_eq!(body["unhashedLeaf"], *leaf);
    let proof_hex: Vec<String> = body["proof"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let proof: Vec<[u8; 32]> = proof_hex
        .iter()
        .map(|p| decode_hex(p).unwrap().try_into().unwrap())
        .collect();
    let root: [u8; 32] = decode_hex(FIVE_ADDRESS_ROOT).unwrap().try_into().unwrap();
    assert!(validate(&root, &proof, &decode_hex(leaf).unwrap()));

    // Address-keyed lookup finds the same leaf.
    let response = get(
        &router,
        &format!(
            "/api/v1/proof?root={FIVE_ADDRESS_ROOT}&address=0x0000000000000000000000000000000000000003"
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["unhashedLeaf"], *leaf);

    // Reverse lookup: the proof path maps back to the root.
    let joined = proof_hex.join(",");
    let response = get(&router, &format!("/api/v1/roots?proof={joined}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let roots: Vec<String> = body["roots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(roots.contains(&FIVE_ADDRESS_ROOT.to_string()));

    // Deprecated single-root form still answers, with a note.
    let response = get(&router, &format!("/api/v1/root?proof={joined}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["note"].as_str().unwrap().contains("deprecated"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a scratch postgres"]
async fn unknown_lookups_are_cacheable_404s() {
    let router = test_router().await;

    let response = get(
        &router,
        "/api/v1/tree?root=0x00000000000000000000000000000000000000000000000000000000000000aa",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=60"
    );

    let response = get(&router, "/api/v1/roots?proof=0x01020304").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=60"
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a scratch postgres"]
async fn health_reports_build_sha() {
    let router = test_router().await;
    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("server-version").unwrap(),
        "test-sha"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"test-sha");
}
