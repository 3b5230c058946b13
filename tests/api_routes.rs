use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use indexer::api::{self, AdminAuth, AppState};
use indexer::error::SyncResult;
use indexer::models::{ListingEntry, TokenDetail};
use indexer::store::{MemoryStore, TokenStore};
use indexer::sync::{SyncOrchestrator, merge};
use indexer::upstream::TokenSource;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct OneTokenSource;

fn foo_listing() -> ListingEntry {
    ListingEntry {
        name: "FOO".to_string(),
        token_id: "0x1".to_string(),
        index: 7,
    }
}

fn foo_detail() -> TokenDetail {
    TokenDetail {
        name: Some("FOO".to_string()),
        mark_px: Some("1.5".to_string()),
        deploy_time: Some("2024-01-01T00:00:00Z".to_string()),
        seeded_usdc: Some("100".to_string()),
        circulating_supply: Some("1000".to_string()),
    }
}

#[async_trait]
impl TokenSource for OneTokenSource {
    async fn fetch_spot_listing(&self) -> SyncResult<Vec<ListingEntry>> {
        Ok(vec![foo_listing()])
    }

    async fn fetch_deploy_listing(&self) -> SyncResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn fetch_token_detail(&self, _token_id: &str) -> SyncResult<TokenDetail> {
        Ok(foo_detail())
    }
}

async fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store
        .put_token(merge(&foo_listing(), &foo_detail(), None, Some("1.0")))
        .await;
    let hash = bcrypt::hash("hunter2", 4).unwrap();
    store.insert_admin("admin", &hash).await.unwrap();

    let orchestrator = Arc::new(SyncOrchestrator::new(
        store.clone(),
        Arc::new(OneTokenSource),
        5,
        None,
    ));

    let state = AppState {
        store: store.clone(),
        orchestrator,
        auth: Arc::new(AdminAuth::new("test-secret".to_string())),
        cron_secret: Some("cron-secret".to_string()),
    };

    (api::router(state, None), store)
}

fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({ "username": "admin", "password": "hunter2" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_public_token_list() {
    let (app, _) = app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app
        .oneshot(Request::get("/api/tokens").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let tokens = body_json(response).await;
    assert_eq!(tokens[0]["tokenIndex"], 7);
    assert_eq!(tokens[0]["launchMarketCap"], "1000.00");
    assert_eq!(tokens[0]["comment"], "");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (app, _) = app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({ "username": "admin", "password": "nope" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_edit_requires_admin_cookie() {
    let (app, store) = app().await;

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/tokens/7", json!({ "comment": "x" }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/tokens/7",
            json!({ "comment": "x" }),
            Some("token=garbage"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = store.get_token(7).await.unwrap().unwrap();
    assert_eq!(token.curated.comment, "");
}

#[tokio::test]
async fn test_admin_edit_updates_curated_fields() {
    let (app, store) = app().await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/tokens/7",
            json!({ "comment": "watch", "devReputation": true, "teamAllocation": 20 }),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Token updated successfully");
    assert_eq!(body["token"]["comment"], "watch");
    assert!(!body["token"]["lastUpdated"].is_null());

    let token = store.get_token(7).await.unwrap().unwrap();
    assert!(token.curated.dev_reputation);
    assert_eq!(token.curated.team_allocation.as_deref(), Some("20"));
    assert_eq!(token.mark_px.as_deref(), Some("1.5"));

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/tokens/7",
            json!({ "teamAllocation": null }),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["token"]["teamAllocation"].is_null());

    let token = store.get_token(7).await.unwrap().unwrap();
    assert!(token.curated.team_allocation.is_none());
    assert_eq!(token.curated.comment, "watch");
}

#[tokio::test]
async fn test_edit_bad_index_and_unknown_token() {
    let (app, _) = app().await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/tokens/abc", json!({ "comment": "x" }), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid token index");

    let response = app
        .oneshot(json_request("PUT", "/api/tokens/99", json!({ "comment": "x" }), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_auth_and_manual_update() {
    let (app, _) = app().await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/check-auth")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["authenticated"], true);

    let response = app
        .oneshot(
            Request::post("/api/update")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Update completed");
    assert_eq!(body["report"]["updated"], 1);
}

#[tokio::test]
async fn test_cron_requires_bearer_secret() {
    let (app, _) = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/cron")
                .header(AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::post("/api/cron")
                .header(AUTHORIZATION, "Bearer cron-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
