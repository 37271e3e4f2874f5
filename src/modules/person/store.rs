use async_trait::async_trait;
use erudio_http::paging::Pageable;
use sqlx::{SqliteConnection, SqlitePool};

use super::models::Person;
use crate::error::ServiceError;
use crate::store::{total_from, Slice};

const COLUMNS: &str = "id, first_name, last_name, address, gender, enabled";

/// Persistence boundary of the person service.
#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, ServiceError>;

    /// One page ordered by first name in the requested direction.
    async fn find_all(&self, pageable: &Pageable) -> Result<Slice<Person>, ServiceError>;

    /// Like `find_all`, restricted to first names containing `first_name`,
    /// ignoring case.
    async fn find_by_name(
        &self,
        first_name: &str,
        pageable: &Pageable,
    ) -> Result<Slice<Person>, ServiceError>;

    /// Insert when `id` is `None`, otherwise overwrite the stored row.
    async fn save(&self, person: Person) -> Result<Person, ServiceError>;

    /// Insert every person or none of them.
    async fn save_all(&self, people: Vec<Person>) -> Result<Vec<Person>, ServiceError>;

    /// Clear the enabled flag in place and return the updated row, or `None`
    /// when the id is unknown.
    async fn disable(&self, id: i64) -> Result<Option<Person>, ServiceError>;

    /// `false` when nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct SqlitePersonStore {
    pool: SqlitePool,
}

impl SqlitePersonStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert(conn: &mut SqliteConnection, person: &Person) -> Result<Person, sqlx::Error> {
    sqlx::query_as::<_, Person>(&format!(
        "INSERT INTO person (first_name, last_name, address, gender, enabled) \
         VALUES (?, ?, ?, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(&person.first_name)
    .bind(&person.last_name)
    .bind(&person.address)
    .bind(&person.gender)
    .bind(person.enabled)
    .fetch_one(conn)
    .await
}

async fn select_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>(&format!("SELECT {COLUMNS} FROM person WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

#[async_trait]
impl PersonStore for SqlitePersonStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(select_by_id(&mut conn, id).await?)
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Slice<Person>, ServiceError> {
        tracing::debug!(
            page = pageable.page(),
            size = pageable.size(),
            direction = %pageable.direction(),
            "querying people"
        );

        let items = sqlx::query_as::<_, Person>(&format!(
            "SELECT {COLUMNS} FROM person ORDER BY first_name {}, id ASC LIMIT ? OFFSET ?",
            pageable.direction().as_sql()
        ))
        .bind(pageable.limit())
        .bind(pageable.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM person")
            .fetch_one(&self.pool)
            .await?;

        Ok(Slice {
            items,
            total: total_from(total),
        })
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        pageable: &Pageable,
    ) -> Result<Slice<Person>, ServiceError> {
        tracing::debug!(first_name, page = pageable.page(), "querying people by name");
        let pattern = contains_pattern(first_name);

        let items = sqlx::query_as::<_, Person>(&format!(
            "SELECT {COLUMNS} FROM person \
             WHERE LOWER(first_name) LIKE LOWER(?) ESCAPE '\\' \
             ORDER BY first_name {}, id ASC LIMIT ? OFFSET ?",
            pageable.direction().as_sql()
        ))
        .bind(&pattern)
        .bind(pageable.limit())
        .bind(pageable.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM person WHERE LOWER(first_name) LIKE LOWER(?) ESCAPE '\\'",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(Slice {
            items,
            total: total_from(total),
        })
    }

    async fn save(&self, person: Person) -> Result<Person, ServiceError> {
        let mut conn = self.pool.acquire().await?;

        let Some(id) = person.id else {
            return Ok(insert(&mut conn, &person).await?);
        };

        sqlx::query_as::<_, Person>(&format!(
            "UPDATE person SET first_name = ?, last_name = ?, address = ?, gender = ?, enabled = ? \
             WHERE id = ? RETURNING {COLUMNS}"
        ))
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(&person.address)
        .bind(&person.gender)
        .bind(person.enabled)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(ServiceError::not_found)
    }

    async fn save_all(&self, people: Vec<Person>) -> Result<Vec<Person>, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(people.len());

        for person in &people {
            saved.push(insert(&mut tx, person).await?);
        }

        tx.commit().await?;
        tracing::debug!(count = saved.len(), "inserted people");
        Ok(saved)
    }

    async fn disable(&self, id: i64) -> Result<Option<Person>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        if select_by_id(&mut tx, id).await?.is_none() {
            return Ok(None);
        }

        sqlx::query("UPDATE person SET enabled = FALSE WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let person = select_by_id(&mut tx, id).await?;
        tx.commit().await?;
        Ok(person)
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM person WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// `LIKE` pattern matching `term` anywhere, with `%`, `_` and `\` taken
/// literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
