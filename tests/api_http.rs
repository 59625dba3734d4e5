// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /api/batch  (report shape, threshold override, view modes, errors)
// - POST /api/predict (verdict shape, validation)
// - GET /debug/model

mod common;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

const BODY_LIMIT: usize = 4 * 1024 * 1024; // 4MB, safe for tests

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json")
}

fn csv_request(uri: &str, csv: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/csv")
        .body(Body::from(csv.to_string()))
        .expect("build request")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = common::test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_batch_returns_report_with_consistent_counts() {
    let app = common::test_router();
    let csv = common::sample_csv(4, 3);

    let resp = app
        .oneshot(csv_request("/api/batch?threshold=0.5", &csv))
        .await
        .expect("oneshot /api/batch");
    assert!(
        resp.status().is_success(),
        "POST /api/batch should be 2xx, got {}",
        resp.status()
    );
    let v = read_json(resp).await;

    // Contract checks for UI consumers
    let counts = &v["counts"];
    let pos = counts["positive"].as_u64().unwrap();
    let neg = counts["negative"].as_u64().unwrap();
    assert_eq!(pos + neg, 7, "counts must sum to batch size");
    assert_eq!(counts["total"], json!(7));

    let rows = v["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 7, "one row projection per record");

    let threshold = v["threshold"]["value"].as_f64().unwrap();
    for row in rows {
        let p = row["probability"].as_f64().expect("probability");
        assert!((0.0..=1.0).contains(&p));
        let expected = u64::from(p >= threshold);
        assert_eq!(row["decision"], json!(expected), "decision must be prob >= threshold");
    }

    // Numeric feature columns get comparisons; the text column does not.
    let features: Vec<&str> = v["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["feature"].as_str().unwrap())
        .collect();
    assert!(features.contains(&"MntWines"));
    assert!(!features.contains(&"Education"));
}

#[tokio::test]
async fn api_batch_free_text_overrides_slider() {
    let app = common::test_router();
    let csv = common::sample_csv(2, 2);

    let resp = app
        .oneshot(csv_request(
            "/api/batch?threshold=0.3&threshold_text=usar%2070%25",
            &csv,
        ))
        .await
        .expect("oneshot");
    let v = read_json(resp).await;
    assert_eq!(v["threshold"]["value"], json!(0.7));
    assert_eq!(v["threshold"]["source"], json!("free_text"));
}

#[tokio::test]
async fn api_batch_out_of_range_text_keeps_slider() {
    let app = common::test_router();
    let csv = common::sample_csv(2, 2);

    let resp = app
        .oneshot(csv_request(
            "/api/batch?threshold=0.3&threshold_text=120%25",
            &csv,
        ))
        .await
        .expect("oneshot");
    let v = read_json(resp).await;
    assert_eq!(v["threshold"]["value"], json!(0.3));
    assert_eq!(v["threshold"]["source"], json!("slider"));
}

#[tokio::test]
async fn api_batch_predictions_only_view_reduces_rows() {
    let app = common::test_router();
    let csv = common::sample_csv(1, 1);

    let resp = app
        .oneshot(csv_request("/api/batch?view=predictions_only", &csv))
        .await
        .expect("oneshot");
    let v = read_json(resp).await;
    for row in v["rows"].as_array().unwrap() {
        let obj = row.as_object().unwrap();
        assert_eq!(obj.len(), 2, "predictions-only rows carry 2 fields: {obj:?}");
        assert!(obj.contains_key("probability"));
        assert!(obj.contains_key("decision"));
    }
}

#[tokio::test]
async fn api_batch_empty_file_degenerates() {
    let app = common::test_router();
    let header_only = common::sample_csv(0, 0);

    let resp = app
        .oneshot(csv_request("/api/batch", &header_only))
        .await
        .expect("oneshot");
    assert!(resp.status().is_success(), "empty batch must not fail");
    let v = read_json(resp).await;
    assert_eq!(v["counts"]["positive"], json!(0));
    assert_eq!(v["counts"]["negative"], json!(0));
    assert_eq!(v["rows"], json!([]));
}

#[tokio::test]
async fn api_batch_rejects_malformed_csv() {
    let app = common::test_router();

    let resp = app
        .oneshot(csv_request("/api/batch", "a,b\n1,2\n3\n"))
        .await
        .expect("oneshot");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn api_batch_rejects_missing_model_columns() {
    let app = common::test_router();

    let resp = app
        .oneshot(csv_request("/api/batch", "Income,Recency\n100,5\n"))
        .await
        .expect("oneshot");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let msg = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(msg.contains("missing model feature"), "got: {msg}");
}

fn predict_body(threshold_text: Option<&str>) -> Json {
    let mut body = json!({
        "record": {
            "Income": 75000,
            "Recency": 5,
            "Kidhome": 0,
            "Teenhome": 0,
            "MntWines": 650,
            "MntFruits": 60,
            "MntGoldProds": 150
        },
        "threshold": 0.5
    });
    if let Some(t) = threshold_text {
        body["threshold_text"] = json!(t);
    }
    body
}

fn json_request(uri: &str, body: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

#[tokio::test]
async fn api_predict_returns_verdict_shape() {
    let app = common::test_router();

    let resp = app
        .oneshot(json_request("/api/predict", &predict_body(None)))
        .await
        .expect("oneshot /api/predict");
    assert!(resp.status().is_success());
    let v = read_json(resp).await;

    let p = v["verdict"]["probability"].as_f64().expect("probability");
    assert!((0.0..=1.0).contains(&p));
    let d = v["verdict"]["decision"].as_u64().expect("decision");
    assert_eq!(d, u64::from(p >= 0.5));
    assert!(v["message"].as_str().unwrap().contains("probabilidade de compra"));
    assert_eq!(v["threshold"]["source"], json!("slider"));
}

#[tokio::test]
async fn api_predict_zero_percent_text_forces_positive() {
    // threshold "usar 0%" resolves to 0.0 and every probability is >= 0.
    let app = common::test_router();

    let resp = app
        .oneshot(json_request("/api/predict", &predict_body(Some("usar 0%"))))
        .await
        .expect("oneshot");
    let v = read_json(resp).await;
    assert_eq!(v["threshold"]["value"], json!(0.0));
    assert_eq!(v["threshold"]["source"], json!("free_text"));
    assert_eq!(v["verdict"]["decision"], json!(1));
}

#[tokio::test]
async fn api_predict_validates_field_ranges() {
    let app = common::test_router();

    let mut body = predict_body(None);
    body["record"]["Recency"] = json!(200);
    let resp = app
        .oneshot(json_request("/api/predict", &body))
        .await
        .expect("oneshot");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let msg = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(msg.contains("Recency"), "got: {msg}");
}

#[tokio::test]
async fn api_debug_model_lists_schema() {
    let app = common::test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/debug/model")
        .body(Body::empty())
        .expect("build GET /debug/model");
    let resp = app.oneshot(req).await.expect("oneshot /debug/model");
    assert!(resp.status().is_success());
    let v = read_json(resp).await;

    let features: Vec<&str> = v["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(features, common::FEATURES.to_vec());
    assert_eq!(v["default_threshold"], json!(0.5));
}
