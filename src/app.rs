//! Application bootstrap shared by the server binary and the CLI.

use anyhow::Context;
use axum::Router;
use erudio_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// A wired application: settings, database pool and registered modules.
pub struct App {
    settings: Settings,
    db: SqlitePool,
    registry: ModuleRegistry,
}

impl App {
    /// Connect to the database and register every module.
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        let db = erudio_db::connect(&settings.database).await?;
        Ok(Self::with_pool(settings, db))
    }

    /// Register every module over an existing pool.
    pub fn with_pool(settings: Settings, db: SqlitePool) -> Self {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db, &settings);
        Self {
            settings,
            db,
            registry,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Apply pending module migrations; returns how many ran.
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let migrations = self.registry.collect_migrations();
        let applied = erudio_db::migrate(&self.db, &migrations)
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, total = migrations.len(), "migrations complete");
        Ok(applied)
    }

    /// Migrate, then initialize every module.
    pub async fn prepare(&self) -> anyhow::Result<()> {
        self.migrate().await?;
        self.registry.init_modules(&self.ctx()).await
    }

    pub fn router(&self) -> Router {
        erudio_http::build_router(&self.registry, &self.settings)
    }

    pub fn openapi(&self) -> serde_json::Value {
        erudio_http::router::openapi_document(&self.registry)
    }

    /// Prepare, start modules and serve HTTP until shutdown.
    pub async fn serve(self) -> anyhow::Result<()> {
        self.prepare().await?;

        let ctx = self.ctx();
        self.registry.start_modules(&ctx).await?;

        let served = erudio_http::start_server(&self.registry, &self.settings).await;

        self.registry.stop_modules().await?;
        self.db.close().await;
        served
    }

    fn ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
            db: &self.db,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_json, body_text};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use erudio_kernel::settings::DatabaseSettings;
    use tower::ServiceExt;

    async fn app(dir: &tempfile::TempDir) -> App {
        let mut settings = Settings::default();
        settings.database = DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };
        settings.storage.upload_dir = dir.path().join("uploads").display().to_string();

        let app = App::connect(settings).await.unwrap();
        app.prepare().await.unwrap();
        app
    }

    #[tokio::test]
    async fn every_module_is_registered() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let names: Vec<_> = app.registry().modules().map(|m| m.name()).collect();
        assert_eq!(names, vec!["person", "book", "file", "math"]);
        assert!(dir.path().join("uploads").is_dir());
    }

    #[tokio::test]
    async fn migrations_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        assert_eq!(app.migrate().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn full_router_serves_modules_and_docs() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(&dir).await.router();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "ok");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/person/v1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await["page"]["totalElements"], 0);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let doc = body_json(response).await;
        for path in [
            "/api/person/v1/{id}",
            "/api/book/v1",
            "/api/file/v1/uploadFile",
            "/api/math/squareRoot/{n}",
        ] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
    }
}
