use async_trait::async_trait;
use erudio_http::paging::Pageable;
use sqlx::SqlitePool;

use super::models::Book;
use crate::error::ServiceError;
use crate::store::{total_from, Slice};

const COLUMNS: &str = "id, author, launch_date, price, title";

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, ServiceError>;

    /// One page ordered by title.
    async fn find_all(&self, pageable: &Pageable) -> Result<Slice<Book>, ServiceError>;

    /// Insert when `id` is `None`, otherwise overwrite the stored row.
    async fn save(&self, book: Book) -> Result<Book, ServiceError>;

    async fn delete(&self, id: i64) -> Result<bool, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, ServiceError> {
        Ok(
            sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM book WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Slice<Book>, ServiceError> {
        tracing::debug!(page = pageable.page(), size = pageable.size(), "querying books");

        let items = sqlx::query_as::<_, Book>(&format!(
            "SELECT {COLUMNS} FROM book ORDER BY title {}, id ASC LIMIT ? OFFSET ?",
            pageable.direction().as_sql()
        ))
        .bind(pageable.limit())
        .bind(pageable.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(&self.pool)
            .await?;

        Ok(Slice {
            items,
            total: total_from(total),
        })
    }

    async fn save(&self, book: Book) -> Result<Book, ServiceError> {
        let saved = match book.id {
            None => {
                sqlx::query_as::<_, Book>(&format!(
                    "INSERT INTO book (author, launch_date, price, title) \
                     VALUES (?, ?, ?, ?) RETURNING {COLUMNS}"
                ))
                .bind(&book.author)
                .bind(book.launch_date)
                .bind(book.price)
                .bind(&book.title)
                .fetch_optional(&self.pool)
                .await?
            }
            Some(id) => {
                sqlx::query_as::<_, Book>(&format!(
                    "UPDATE book SET author = ?, launch_date = ?, price = ?, title = ? \
                     WHERE id = ? RETURNING {COLUMNS}"
                ))
                .bind(&book.author)
                .bind(book.launch_date)
                .bind(book.price)
                .bind(&book.title)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        saved.ok_or_else(ServiceError::not_found)
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_pool;
    use erudio_http::paging::Direction;
    use time::macros::datetime;

    fn book(title: &str) -> Book {
        Book {
            id: None,
            author: "Kent Beck".to_string(),
            launch_date: Some(datetime!(2002-11-08 00:00 UTC)),
            price: 39.9,
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn books_round_trip_through_sqlite() {
        let store = SqliteBookStore::new(memory_pool(super::super::migrations()).await);

        let saved = store.save(book("Test Driven Development")).await.unwrap();
        let found = store.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.launch_date, Some(datetime!(2002-11-08 00:00 UTC)));
    }

    #[tokio::test]
    async fn pages_are_sorted_by_title() {
        let store = SqliteBookStore::new(memory_pool(super::super::migrations()).await);
        for title in ["Refactoring", "Clean Code", "Domain Driven Design"] {
            store.save(book(title)).await.unwrap();
        }

        let pageable = Pageable::new(0, 2, Direction::Desc).unwrap();
        let slice = store.find_all(&pageable).await.unwrap();
        let titles: Vec<_> = slice.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Refactoring", "Domain Driven Design"]);
        assert_eq!(slice.total, 3);
    }

    #[tokio::test]
    async fn updating_a_missing_book_is_not_found() {
        let store = SqliteBookStore::new(memory_pool(super::super::migrations()).await);
        let mut missing = book("Ghost");
        missing.id = Some(41);
        assert!(matches!(
            store.save(missing).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
