use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use korpus::{Explorer, KorpusConfig, StubBackend};
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BASELINE: &str = "og,9000\ni,8000\nhavet,120\nfjellet,90\nbyen,300\nkongen,80\n";

fn app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    for name in ["generell.csv", "avis.csv", "bok.csv"] {
        fs::write(dir.path().join(name), BASELINE).unwrap();
    }
    let mut cfg = KorpusConfig::default();
    cfg.explore.reference_dir = Some(dir.path().to_path_buf());

    let explorer = Explorer::new(StubBackend::generated(20), &cfg).unwrap();
    let state = ServerState::with_explorer(ServerConfig::default(), explorer);
    (build_router(Arc::new(state)), dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn newspaper_handle(app: &Router) -> Value {
    let (status, body) = post_json(
        app,
        "/api/v1/corpus",
        json!({ "doc_type_selection": "digavis", "num_docs": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["handle"].clone()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (app, _dir) = app();
    let (status, bytes) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn metrics_expose_cache_counters() {
    let (app, _dir) = app();
    newspaper_handle(&app).await;
    newspaper_handle(&app).await;

    let (status, bytes) = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["corpus_cache"]["metadata"]["misses"], 1);
    assert_eq!(body["corpus_cache"]["metadata"]["hits"], 1);
}

#[tokio::test]
async fn build_corpus_returns_handle_and_table() {
    let (app, _dir) = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/corpus",
        json!({ "doc_type_selection": "digavis", "num_docs": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handle"]["kind"], "query");
    assert_eq!(body["table"]["timeformat"], "%Y-%m-%d");
    let rows = body["table"]["rows"].as_array().unwrap();
    assert!(!rows.is_empty() && rows.len() <= 5);
}

#[tokio::test]
async fn invalid_parameters_are_json_bad_requests() {
    let (app, _dir) = app();
    let (status, body) =
        post_json(&app, "/api/v1/corpus", json!({ "doc_type_selection": "digavis", "from_year": "ukjent" }))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = post_json(&app, "/api/v1/corpus", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("doc_type_selection"));
}

#[tokio::test]
async fn malformed_json_uses_error_format() {
    let (app, _dir) = app();
    let request = Request::post("/api/v1/concordances")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _dir) = app();
    let (status, bytes) = send(&app, Request::get("/api/v1/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn concordances_over_a_returned_handle() {
    let (app, _dir) = app();
    let handle = newspaper_handle(&app).await;
    let (status, body) = post_json(
        &app,
        "/api/v1/concordances",
        json!({ "corpus": handle, "query": "havet", "limit": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["rows"].as_array().unwrap().len() <= 10);
}

#[tokio::test]
async fn concordance_limit_above_maximum_is_rejected() {
    let (app, _dir) = app();
    let handle = newspaper_handle(&app).await;
    let (status, body) = post_json(
        &app,
        "/api/v1/concordances",
        json!({ "corpus": handle, "query": "havet", "limit": 5001 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "LIMIT_EXCEEDED");
}

#[tokio::test]
async fn collocations_are_ranked_by_requested_column() {
    let (app, _dir) = app();
    let handle = newspaper_handle(&app).await;
    let (status, body) = post_json(
        &app,
        "/api/v1/collocations",
        json!({ "corpus": handle, "words": "havet", "max_results": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["sort_by"], "relevance");
    assert!(body["rows"].as_array().unwrap().len() <= 3);
}

#[tokio::test]
async fn unknown_reference_is_rejected() {
    let (app, _dir) = app();
    let handle = newspaper_handle(&app).await;
    let (status, body) = post_json(
        &app,
        "/api/v1/collocations",
        json!({ "corpus": handle, "words": "havet", "reference": "nynorsk" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_REFERENCE");
}

#[tokio::test]
async fn upload_returns_identifier_handle() {
    let (app, _dir) = app();
    let boundary = "korpusgrense";
    let csv = "urn\nURN:NBN:no-nb_digibok_000001\nURN:NBN:no-nb_digibok_000002\n";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"spreadsheet\"; filename=\"liste.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::post("/api/v1/corpus/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["handle"]["kind"], "identifiers");
    assert_eq!(body["handle"]["urns"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_without_spreadsheet_field_is_bad_request() {
    let (app, _dir) = app();
    let boundary = "korpusgrense";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"annet\"\r\n\r\n\
         x\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::post("/api/v1/corpus/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exports_are_zip_archives() {
    let (app, _dir) = app();
    let handle = newspaper_handle(&app).await;

    for (uri, body) in [
        ("/api/v1/export/corpus", json!({ "corpus": handle })),
        (
            "/api/v1/export/concordances",
            json!({ "corpus": handle, "query": "havet" }),
        ),
        (
            "/api/v1/export/collocations",
            json!({ "corpus": handle, "words": "havet" }),
        ),
    ] {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..2], b"PK", "{uri}");
    }
}
