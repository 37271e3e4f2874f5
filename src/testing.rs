//! Shared fixtures for unit tests.

use axum::response::Response;
use erudio_kernel::settings::DatabaseSettings;
use erudio_kernel::Migration;
use http_body_util::BodyExt;
use sqlx::SqlitePool;

/// Fresh in-memory database with `migrations` applied.
pub async fn memory_pool(migrations: Vec<Migration>) -> SqlitePool {
    let pool = erudio_db::connect(&DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .unwrap();

    let migrations: Vec<(String, Migration)> = migrations
        .into_iter()
        .map(|migration| ("test".to_string(), migration))
        .collect();
    erudio_db::migrate(&pool, &migrations).await.unwrap();

    pool
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
