//! SQLite pool factory and migration runner.

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use erudio_kernel::settings::DatabaseSettings;
use erudio_kernel::Migration;

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _module_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool for the configured database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    tracing::info!(target: "erudio-db", url = %settings.url, "opening database pool");

    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .foreign_keys(true);

    // An in-memory database lives and dies with its connection.
    let max_connections = if settings.url.contains(":memory:") {
        1
    } else {
        settings.max_connections
    };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| "failed to connect to database")
}

/// Pool that opens no connection until first used.
pub fn connect_lazy(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?;

    Ok(SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_lazy_with(options))
}

/// Apply module migrations that have not been recorded yet.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row, so a failed migration leaves no trace. Returns the number applied.
pub async fn migrate(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .with_context(|| "failed to create migrations table")?;

    let mut applied = 0;

    for (module, migration) in migrations {
        let already: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _module_migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;

        if already.is_some() {
            tracing::debug!(
                target: "erudio-db",
                %module,
                id = migration.id,
                "migration already applied"
            );
            continue;
        }

        tracing::info!(target: "erudio-db", %module, id = migration.id, "applying migration");

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO _module_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> DatabaseSettings {
        DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "person".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE person (id INTEGER PRIMARY KEY, first_name TEXT NOT NULL);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_are_applied_once() {
        let pool = connect(&memory_settings()).await.unwrap();

        assert_eq!(migrate(&pool, &migrations()).await.unwrap(), 1);
        assert_eq!(migrate(&pool, &migrations()).await.unwrap(), 0);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM person")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn lazy_pool_connects_on_first_query() {
        let pool = connect_lazy(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .unwrap();

        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn failing_migration_is_not_recorded() {
        let pool = connect(&memory_settings()).await.unwrap();
        let broken = vec![(
            "book".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE oops (",
            },
        )];

        assert!(migrate(&pool, &broken).await.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _module_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
