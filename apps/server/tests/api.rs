use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use donmoa_server::{api::app_router, build_state, config::Config, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "integration-secret-integration-00";

struct TestApp {
    router: Router,
    _state: Arc<AppState>,
    _dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: db_path.to_string_lossy().into_owned(),
        jwt_secret: SECRET.to_string(),
        jwt_audience: None,
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(30),
        idempotency_ttl: Duration::from_secs(3600),
        idempotency_max_entries: 100,
    };
    let state = build_state(&config).await.unwrap();
    TestApp {
        router: app_router(state.clone(), &config),
        _state: state,
        _dir: dir,
    }
}

fn token_for(user_id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;
    encode(
        &Header::default(),
        &json!({ "sub": user_id, "exp": exp }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, user: &str) -> Response {
        self.send(Method::GET, uri, Some(user), None, &[]).await
    }

    async fn commit(&self, user: &str, body: Value) -> Response {
        self.send(Method::POST, "/api/v1/snapshots/commit", Some(user), Some(body), &[])
            .await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_commit(date: &str) -> Value {
    json!({
        "snapshot_date": date,
        "source": "cli",
        "cash": [
            { "account_external_id": "acc1", "currency": "KRW", "amount": 1000000 }
        ],
        "positions": [
            { "account_external_id": "acc1", "symbol": "AAPL", "currency": "USD", "qty": 10, "avg_cost": 150.5 }
        ],
        "transactions": [
            {
                "account_external_id": "acc1",
                "type": "buy",
                "symbol": "AAPL",
                "trade_datetime": "2024-03-30T09:15:00Z",
                "qty": 10,
                "price": 150.5,
                "amount": 1505,
                "currency": "USD"
            }
        ]
    })
}

#[tokio::test]
async fn test_healthz_is_public() {
    let app = spawn_app().await;
    let response = app
        .send(Method::GET, "/api/v1/healthz", None, None, &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = spawn_app().await;
    let response = app
        .send(Method::GET, "/api/v1/snapshots", None, None, &[])
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let response = app
        .send(
            Method::GET,
            "/api/v1/accounts",
            None,
            None,
            &[("authorization", "Bearer not-a-jwt")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_commit_then_read_back() {
    let app = spawn_app().await;

    let response = app.commit("user-1", sample_commit("2024-03-31")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = json_body(response).await;
    let snapshot_id = result["snapshot_id"].as_i64().unwrap();
    assert_eq!(result["date"], "2024-03-31");
    assert_eq!(
        result["lines"],
        json!({ "cash": 1, "positions": 1, "transactions": 1 })
    );
    assert_eq!(result["errors"], json!([]));
    assert!(!result["warnings"].as_array().unwrap().is_empty());

    let list = json_body(app.get("/api/v1/snapshots", "user-1").await).await;
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64(), Some(snapshot_id));
    assert_eq!(items[0]["line_counts"]["positions"], 1);

    let response = app.commit("user-1", sample_commit("2024-02-29")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(app.get("/api/v1/snapshots?limit=1", "user-1").await).await;
    assert_eq!(page["items"][0]["date"], "2024-03-31");
    let cursor = page["next_cursor"].as_str().unwrap().to_string();
    assert_eq!(cursor, format!("2024-03-31_{}", snapshot_id));
    let next = json_body(
        app.get(&format!("/api/v1/snapshots?limit=1&cursor={}", cursor), "user-1")
            .await,
    )
    .await;
    assert_eq!(next["items"][0]["date"], "2024-02-29");
    assert!(next["next_cursor"].is_null());

    let response = app.get("/api/v1/snapshots?cursor=42", "user-1").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let detail = app
        .get(&format!("/api/v1/snapshots/{}", snapshot_id), "user-1")
        .await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(json_body(detail).await["source"], "cli");

    let lines = json_body(
        app.get(&format!("/api/v1/snapshots/{}/lines", snapshot_id), "user-1")
            .await,
    )
    .await;
    assert_eq!(lines["cash"][0]["amount_minor"], "1000000");
    assert_eq!(lines["positions"][0]["qty_nano"], "10000000000");
    assert_eq!(lines["transactions"][0]["amount_minor"], "150500");

    let accounts = json_body(app.get("/api/v1/accounts", "user-1").await).await;
    assert_eq!(accounts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recommit_same_date_replaces_or_conflicts() {
    let app = spawn_app().await;
    let first = json_body(app.commit("user-1", sample_commit("2024-03-31")).await).await;

    let replaced = json_body(app.commit("user-1", sample_commit("2024-03-31")).await).await;
    assert_ne!(replaced["snapshot_id"], first["snapshot_id"]);

    let mut no_replace = sample_commit("2024-03-31");
    no_replace["options"] = json!({ "replace_same_date": false });
    let response = app.commit("user-1", no_replace).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"]["code"], "CONFLICT");

    // Re-committing reused the account created by the first commit.
    let accounts = json_body(app.get("/api/v1/accounts", "user-1").await).await;
    assert_eq!(accounts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_requests_are_unprocessable() {
    let app = spawn_app().await;

    let mut bad_currency = sample_commit("2024-03-31");
    bad_currency["cash"][0]["currency"] = json!("KRWX");
    let response = app.commit("user-1", bad_currency).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");

    let response = app
        .commit("user-1", json!({ "snapshot_date": "31/03/2024", "source": "cli" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.get("/api/v1/snapshots/not-a-number", "user-1").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_idempotency_key_replays_the_first_result() {
    let app = spawn_app().await;
    let headers = [("idempotency-key", "commit-2024-03-31")];

    let first = app
        .send(
            Method::POST,
            "/api/v1/snapshots/commit",
            Some("user-1"),
            Some(sample_commit("2024-03-31")),
            &headers,
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(!first.headers().contains_key("idempotent-replay"));
    let first = json_body(first).await;

    let replay = app
        .send(
            Method::POST,
            "/api/v1/snapshots/commit",
            Some("user-1"),
            Some(sample_commit("2024-03-31")),
            &headers,
        )
        .await;
    assert_eq!(replay.status(), StatusCode::OK);
    assert_eq!(replay.headers()["idempotent-replay"], "true");
    assert_eq!(json_body(replay).await, first);

    // The key is scoped to the caller.
    let other = app
        .send(
            Method::POST,
            "/api/v1/snapshots/commit",
            Some("user-2"),
            Some(sample_commit("2024-03-31")),
            &headers,
        )
        .await;
    assert!(!other.headers().contains_key("idempotent-replay"));

    let list = json_body(app.get("/api/v1/snapshots", "user-1").await).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_snapshots_are_private_to_their_owner() {
    let app = spawn_app().await;
    let result = json_body(app.commit("user-1", sample_commit("2024-03-31")).await).await;
    let snapshot_id = result["snapshot_id"].as_i64().unwrap();

    let response = app
        .get(&format!("/api/v1/snapshots/{}", snapshot_id), "user-2")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get(&format!("/api/v1/snapshots/{}/lines", snapshot_id), "user-2")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list = json_body(app.get("/api/v1/snapshots", "user-2").await).await;
    assert!(list["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dividend_and_line_edits() {
    let app = spawn_app().await;
    let result = json_body(app.commit("user-1", sample_commit("2024-03-31")).await).await;
    let snapshot_id = result["snapshot_id"].as_i64().unwrap();
    let lines = json_body(
        app.get(&format!("/api/v1/snapshots/{}/lines", snapshot_id), "user-1")
            .await,
    )
    .await;
    let account_id = lines["positions"][0]["account_id"].as_i64().unwrap();
    let instrument_id = lines["positions"][0]["instrument_id"].as_i64().unwrap();

    let response = app
        .send(
            Method::POST,
            "/api/v1/portfolio/dividends",
            Some("user-1"),
            Some(json!({
                "account_id": account_id,
                "instrument_id": instrument_id,
                "pay_date": "2024-04-15",
                "amount": 12.34,
                "currency": "USD"
            })),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let dividend = json_body(response).await;
    assert_eq!(dividend["type"], "dividend");
    assert_eq!(dividend["snapshot_id"].as_i64(), Some(snapshot_id));
    assert_eq!(dividend["amount_minor"], "1234");

    let cash_id = lines["cash"][0]["id"].as_i64().unwrap();
    let response = app
        .send(
            Method::PATCH,
            &format!("/api/v1/portfolio/cash/{}", cash_id),
            Some("user-1"),
            Some(json!({ "amount": 2500000 })),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["amount_minor"], "2500000");

    let position_id = lines["positions"][0]["id"].as_i64().unwrap();
    let response = app
        .send(
            Method::PATCH,
            &format!("/api/v1/portfolio/positions/{}", position_id),
            Some("user-2"),
            Some(json!({ "qty": 1 })),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let txn_id = lines["transactions"][0]["id"].as_i64().unwrap();
    let response = app
        .send(
            Method::PATCH,
            &format!("/api/v1/portfolio/transactions/{}", txn_id),
            Some("user-1"),
            Some(json!({})),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
