//! In-process tests for the HTTP endpoints, driven through
//! `tower::ServiceExt::oneshot` without binding a socket.

mod common;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use player_api::db::{PlayerStore, SqliteStore};
use player_api::error::StoreError;
use player_api::models::Player;
use player_api::routes::{self, AppState};
use tower::ServiceExt;

use common::{player, store};

async fn seeded_store(count: usize) -> SqliteStore {
    let store = store().await;
    for i in 0..count {
        store.insert(&player(&format!("p{i:03}"))).await.unwrap();
    }
    store
}

async fn get<S: PlayerStore + Clone + 'static>(store: &S, uri: &str) -> (StatusCode, Bytes) {
    let app = routes::router(AppState::new(store.clone()));
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).expect("body is not valid JSON")
}

#[tokio::test]
async fn get_player_returns_camel_case_json() {
    let store = seeded_store(1).await;

    let (status, body) = get(&store, "/api/players/p000").await;

    assert_eq!(status, StatusCode::OK);
    let json = json(&body);
    assert_eq!(json["playerID"], "p000");
    assert_eq!(json["birthYear"], 1950);
    assert_eq!(json["birthCity"], "Brooklyn");
    assert_eq!(json["deathMonth"], 0);
    assert_eq!(json["nameGiven"], "Test Player");
    assert_eq!(json["debut"], "1970-04-01");
    assert_eq!(json["finalGame"], "1985-09-30");
    assert_eq!(json["retroID"], "p000-r");
    assert_eq!(json["bbrefID"], "p000-b");
}

#[tokio::test]
async fn unknown_player_is_404_with_empty_body() {
    let store = seeded_store(1).await;

    let (status, body) = get(&store, "/api/players/nonexistent-id").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn list_without_paging_returns_everything() {
    let store = seeded_store(300).await;

    let (status, body) = get(&store, "/api/players").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 300);
}

#[tokio::test]
async fn second_page_of_ten() {
    let store = seeded_store(35).await;

    let (status, body) = get(&store, "/api/players?page=2&page_size=10").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = json(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["playerID"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (10..20).map(|i| format!("p{i:03}")).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn page_uses_default_page_size() {
    let store = seeded_store(300).await;

    let (status, body) = get(&store, "/api/players?page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 250);
}

#[tokio::test]
async fn oversized_page_size_is_417_without_players() {
    let store = seeded_store(3).await;

    let (status, body) = get(&store, "/api/players?page=1&page_size=5000").await;

    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    let json = json(&body);
    assert_eq!(json["error"], "invalid value for page_size: 5000");
    assert!(!json.is_array());
}

#[tokio::test]
async fn non_numeric_page_is_417() {
    let store = seeded_store(3).await;

    let (status, body) = get(&store, "/api/players?page=abc").await;

    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(json(&body)["error"], "page must be an integer: 'abc'");
}

#[tokio::test]
async fn reads_during_bulk_reload_are_503() {
    let store = seeded_store(3).await;
    store.set_available(false);

    let (status, body) = get(&store, "/api/players/p000").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json(&body)["error"].as_str().unwrap().contains("offline"));

    let (status, _) = get(&store, "/api/players").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    store.set_available(true);
    let (status, _) = get(&store, "/api/players/p000").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn database_failure_is_500_with_error_message() {
    let store = seeded_store(1).await;
    sqlx::query("DROP TABLE players")
        .execute(store.pool())
        .await
        .unwrap();

    let (status, body) = get(&store, "/api/players/p000").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("no such table"));
}

#[tokio::test]
async fn health_reports_availability_and_count() {
    let store = seeded_store(4).await;

    let (status, body) = get(&store, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health = json(&body);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["available"], true);
    assert_eq!(health["players"], 4);

    store.set_available(false);
    let (_, body) = get(&store, "/health").await;
    let health = json(&body);
    assert_eq!(health["available"], false);
    assert!(health["players"].is_null());
}

/// Store whose pool has gone away: every query times out.
#[derive(Clone)]
struct UnreachableStore;

fn timed_out<T>() -> Result<T, StoreError> {
    Err(StoreError::Database(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl PlayerStore for UnreachableStore {
    async fn fetch_by_id(&self, _player_id: &str) -> Result<Option<Player>, StoreError> {
        timed_out()
    }

    async fn fetch_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Player>, StoreError> {
        timed_out()
    }

    async fn exists(&self, _player_id: &str) -> Result<bool, StoreError> {
        timed_out()
    }

    async fn insert(&self, _player: &Player) -> Result<(), StoreError> {
        timed_out()
    }

    async fn update(&self, _player: &Player) -> Result<(), StoreError> {
        timed_out()
    }

    async fn delete_by_id(&self, _player_id: &str) -> Result<(), StoreError> {
        timed_out()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        timed_out()
    }

    async fn replace_all(&self, _players: &[Player]) -> Result<(), StoreError> {
        timed_out()
    }

    async fn config_hash(&self) -> Result<String, StoreError> {
        timed_out()
    }

    async fn set_config_hash(&self, _hash: &str) -> Result<(), StoreError> {
        timed_out()
    }

    fn set_available(&self, _available: bool) {}

    fn is_available(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn router_serves_any_player_store() {
    let store = UnreachableStore;

    let (status, body) = get(&store, "/api/players/p000").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("pool timed out"));

    let (status, _) = get(&store, "/api/players?page=1&page_size=10").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = get(&store, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health = json(&body);
    assert_eq!(health["available"], true);
    assert!(health["players"].is_null());
}
