//! Tests against a live Redis.
//!
//! Run with `REDIS_URL=redis://localhost:6379/15 cargo test -- --ignored`.
//! Keys are namespaced per test and removed afterwards.

use quota_shortener::domain::entities::ConsumeOutcome;
use quota_shortener::domain::repositories::{MappingRepository, QuotaRepository};
use quota_shortener::infrastructure::store::RedisStore;
use std::time::Duration;

async fn connect() -> RedisStore {
    let url = std::env::var("REDIS_URL").expect("REDIS_URL must be set for Redis tests");
    RedisStore::connect(&url, Duration::from_secs(2))
        .await
        .expect("Redis must be reachable")
}

fn key(name: &str) -> String {
    format!("quota-shortener-test:{}:{}", name, std::process::id())
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_consume_counts_down_and_stops() {
    let store = connect().await;
    let client = key("consume");
    store.reset(&client).await.unwrap();

    for expected in (0..3).rev() {
        match store
            .consume(&client, 3, Duration::from_secs(60))
            .await
            .unwrap()
        {
            ConsumeOutcome::Granted(status) => {
                assert_eq!(status.remaining, expected);
                assert!(status.reset_in <= Duration::from_secs(60));
            }
            other => panic!("expected Granted, got {:?}", other),
        }
    }

    let outcome = store
        .consume(&client, 3, Duration::from_secs(60))
        .await
        .unwrap();
    assert!(matches!(outcome, ConsumeOutcome::Exhausted(_)));

    let status = store.peek(&client).await.unwrap().unwrap();
    assert_eq!(status.remaining, 0);

    assert!(store.reset(&client).await.unwrap());
    assert!(store.peek(&client).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_concurrent_consume_never_overspends() {
    let store = std::sync::Arc::new(connect().await);
    let client = key("concurrent");
    store.reset(&client).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            store.consume(&client, 5, Duration::from_secs(60)).await
        }));
    }

    let mut granted = 0;
    for task in tasks {
        if let ConsumeOutcome::Granted(_) = task.await.unwrap().unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, 5);
    store.reset(&client).await.unwrap();
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_mapping_insert_get_and_ttl() {
    let store = connect().await;
    let link = key("mapping");

    assert!(
        store
            .insert(&link, "https://example.com/a", Duration::from_secs(60), true)
            .await
            .unwrap()
    );
    assert_eq!(
        store.get(&link).await.unwrap().as_deref(),
        Some("https://example.com/a")
    );

    let ttl = store.ttl(&link).await.unwrap().unwrap();
    assert!(ttl <= Duration::from_secs(60) && ttl > Duration::from_secs(55));

    // NX write leaves the existing mapping alone.
    assert!(
        !store
            .insert(&link, "https://example.com/b", Duration::from_secs(60), false)
            .await
            .unwrap()
    );
    assert_eq!(
        store.get(&link).await.unwrap().as_deref(),
        Some("https://example.com/a")
    );

    // Overwrite replaces it.
    assert!(
        store
            .insert(&link, "https://example.com/c", Duration::from_secs(60), true)
            .await
            .unwrap()
    );
    assert_eq!(
        store.get(&link).await.unwrap().as_deref(),
        Some("https://example.com/c")
    );

    store.reset(&link).await.unwrap();
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_mapping_expires() {
    let store = connect().await;
    let link = key("expiring");

    store
        .insert(&link, "https://example.com", Duration::from_millis(200), true)
        .await
        .unwrap();
    assert!(store.get(&link).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(store.get(&link).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_health_check() {
    let store = connect().await;
    assert!(store.health_check().await);
}
