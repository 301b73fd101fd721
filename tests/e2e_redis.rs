//! End-to-end tests for the Redis store.
//!
//! These tests require a running Redis server.
//! Run with: `cargo test --features redis --test e2e_redis`
//!
//! The server is taken from `REDIS_URL`, defaulting to `redis://127.0.0.1/`.
//! Each test writes under its own key prefix.

#![cfg(feature = "redis")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use enclave_session::{
    KeyFormat, RedisStore, RequestContext, RequestCookies, ResponseCookies, SessionConfig,
    SessionError, SessionId, SessionManager, SessionStore, StoreConfig,
};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

async fn connect() -> ConnectionManager {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_owned());
    let client = redis::Client::open(url).expect("Invalid redis url");
    ConnectionManager::new(client)
        .await
        .expect("Failed to connect to redis")
}

fn test_prefix() -> String {
    format!("enclave_session_test:{:016x}:", rand::random::<u64>())
}

async fn setup_store(ttl: Option<chrono::Duration>) -> (RedisStore, ConnectionManager, String) {
    let connection = connect().await;
    let prefix = test_prefix();
    let store = RedisStore::with_config(
        connection.clone(),
        StoreConfig {
            key_format: KeyFormat::Prefixed(prefix.clone()),
            ttl,
            ..Default::default()
        },
    );
    (store, connection, prefix)
}

async fn pttl(connection: &mut ConnectionManager, key: &str) -> i64 {
    redis::cmd("PTTL")
        .arg(key)
        .query_async(connection)
        .await
        .unwrap()
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Counter {
    counter: i64,
}

#[tokio::test]
async fn test_store_crud() {
    let (store, _, _) = setup_store(Some(chrono::Duration::minutes(5))).await;
    let id = SessionId::from_client("abc");

    assert_eq!(store.load(&id).await.unwrap_err(), SessionError::NotFound);

    store.save(&id, b"{\"counter\":0}").await.unwrap();
    assert_eq!(store.load(&id).await.unwrap(), b"{\"counter\":0}");

    store.save(&id, b"{\"counter\":1}").await.unwrap();
    assert_eq!(store.load(&id).await.unwrap(), b"{\"counter\":1}");

    store.delete(&id).await.unwrap();
    store.delete(&id).await.unwrap();
    assert_eq!(store.load(&id).await.unwrap_err(), SessionError::NotFound);
}

#[tokio::test]
async fn test_save_sets_and_resets_ttl() {
    let (store, mut connection, prefix) = setup_store(Some(chrono::Duration::seconds(2))).await;
    let id = SessionId::from_client("abc");
    let key = format!("{prefix}abc");

    store.save(&id, b"1").await.unwrap();
    let first = pttl(&mut connection, &key).await;
    assert!(first > 0 && first <= 2000, "unexpected ttl {first}");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(pttl(&mut connection, &key).await <= 1500);

    store.save(&id, b"2").await.unwrap();
    assert!(pttl(&mut connection, &key).await > 1500);

    store.delete(&id).await.unwrap();
}

#[tokio::test]
async fn test_expired_record_is_not_found() {
    let (store, _, _) = setup_store(Some(chrono::Duration::milliseconds(50))).await;
    let id = SessionId::from_client("short-lived");

    store.save(&id, b"1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(store.load(&id).await.unwrap_err(), SessionError::NotFound);
    assert_eq!(store.prune_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_ttl_writes_persistent_key() {
    let (store, mut connection, prefix) = setup_store(None).await;
    let id = SessionId::from_client("forever");

    store.save(&id, b"1").await.unwrap();
    assert_eq!(pttl(&mut connection, &format!("{prefix}forever")).await, -1);

    store.delete(&id).await.unwrap();
}

#[tokio::test]
async fn test_manager_round_trip() {
    let mut config = SessionConfig::new("sid");
    config.store.key_format = KeyFormat::Prefixed(test_prefix());
    let connection = connect().await;
    let manager =
        SessionManager::from_config(&config, RedisStore::with_config(connection, config.store.clone()))
            .unwrap();
    let ctx = RequestContext::new();

    let mut response = ResponseCookies::new();
    let session = manager
        .load_or_new::<Counter, _, _>(&ctx, &RequestCookies::new(), &mut response)
        .await
        .unwrap();
    manager
        .save(&ctx, &mut response, &session.id, &Counter { counter: 5 })
        .await
        .unwrap();

    let sid = response.get("sid").unwrap().value().to_owned();
    let reloaded = manager
        .load_or_new::<Counter, _, _>(
            &ctx,
            &RequestCookies::new().with("sid", sid),
            &mut ResponseCookies::new(),
        )
        .await
        .unwrap();
    assert_eq!(reloaded.data, Some(Counter { counter: 5 }));

    manager.delete(&ctx, &mut ResponseCookies::new(), &reloaded.id).await.unwrap();
}
