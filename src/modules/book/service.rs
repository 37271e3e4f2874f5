use std::sync::Arc;

use erudio_http::hateoas::{Link, PagedModel};
use erudio_http::paging::Pageable;

use super::links::BookLinks;
use super::models::{Book, BookDto};
use super::store::BookStore;
use crate::error::ServiceError;
use crate::links::LinkBuilder;

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
    links: BookLinks,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, links: BookLinks) -> Self {
        Self { store, links }
    }

    fn to_dto(&self, book: &Book) -> BookDto {
        let mut dto = BookDto::from(book);
        self.links.attach(&mut dto);
        dto
    }

    pub async fn find_all(&self, pageable: Pageable) -> Result<PagedModel<BookDto>, ServiceError> {
        tracing::info!(page = pageable.page(), size = pageable.size(), "finding all books");

        let slice = self.store.find_all(&pageable).await?;
        let total = slice.total;
        let content = slice.map(|book| self.to_dto(&book)).items;

        Ok(PagedModel::assemble(
            content,
            &pageable,
            total,
            Link::nav("self", self.links.find_all_href(&pageable)),
            |p| self.links.find_all_href(p),
        ))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<BookDto, ServiceError> {
        tracing::info!(id, "finding one book");

        let book = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(ServiceError::not_found)?;
        Ok(self.to_dto(&book))
    }

    pub async fn create(&self, book: Option<BookDto>) -> Result<BookDto, ServiceError> {
        let dto = book.ok_or(ServiceError::NullArgument)?;
        tracing::info!("creating one book");

        let entity = Book {
            id: None,
            ..Book::from(dto)
        };
        let saved = self.store.save(entity).await?;
        Ok(self.to_dto(&saved))
    }

    pub async fn update(&self, book: Option<BookDto>) -> Result<BookDto, ServiceError> {
        let dto = book.ok_or(ServiceError::NullArgument)?;
        tracing::info!(id = dto.id, "updating one book");

        let mut entity = self
            .store
            .find_by_id(dto.id)
            .await?
            .ok_or_else(ServiceError::not_found)?;

        entity.author = dto.author;
        entity.launch_date = dto.launch_date;
        entity.price = dto.price;
        entity.title = dto.title;

        let saved = self.store.save(entity).await?;
        Ok(self.to_dto(&saved))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        tracing::info!(id, "deleting one book");

        if !self.store.delete(id).await? {
            return Err(ServiceError::not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::Linked;
    use crate::modules::book::store::SqliteBookStore;
    use crate::testing::memory_pool;

    async fn service() -> BookService {
        let pool = memory_pool(super::super::migrations()).await;
        BookService::new(
            Arc::new(SqliteBookStore::new(pool)),
            BookLinks::new("http://localhost:8080"),
        )
    }

    fn dto(title: &str, price: f64) -> BookDto {
        BookDto {
            id: 0,
            author: "Eric Evans".into(),
            launch_date: None,
            price,
            title: title.into(),
            links: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_update_delete_lifecycle() {
        let service = service().await;

        let created = service.create(Some(dto("DDD", 80.0))).await.unwrap();
        assert_eq!(created.links().len(), 5);

        let mut changed = dto("Domain-Driven Design", 92.5);
        changed.id = created.id;
        let updated = service.update(Some(changed)).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Domain-Driven Design");
        assert_eq!(updated.price, 92.5);

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.find_by_id(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn absent_payloads_are_rejected() {
        let service = service().await;
        assert!(matches!(service.create(None).await, Err(ServiceError::NullArgument)));
        assert!(matches!(service.update(None).await, Err(ServiceError::NullArgument)));
    }

    #[tokio::test]
    async fn listing_wraps_books_in_a_page() {
        let service = service().await;
        for title in ["B", "A", "C"] {
            service.create(Some(dto(title, 1.0))).await.unwrap();
        }

        let page = service.find_all(Pageable::default()).await.unwrap();
        let titles: Vec<_> = page.content.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(page.page.total_pages, 1);
        assert_eq!(
            page.link("self").unwrap().href,
            "http://localhost:8080/api/book/v1?page=0&size=12&direction=asc"
        );
    }
}
