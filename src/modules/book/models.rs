use erudio_http::hateoas::Link;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use time::OffsetDateTime;

use crate::links::Linked;

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Option<i64>,
    pub author: String,
    pub launch_date: Option<OffsetDateTime>,
    pub price: f64,
    pub title: String,
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            author: row.try_get("author")?,
            launch_date: row.try_get("launch_date")?,
            price: row.try_get("price")?,
            title: row.try_get("title")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub launch_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_deserializing)]
    pub links: Vec<Link>,
}

impl Linked for BookDto {
    fn id(&self) -> i64 {
        self.id
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn set_links(&mut self, links: Vec<Link>) {
        self.links = links;
    }
}

impl From<&Book> for BookDto {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.unwrap_or_default(),
            author: book.author.clone(),
            launch_date: book.launch_date,
            price: book.price,
            title: book.title.clone(),
            links: Vec::new(),
        }
    }
}

impl From<BookDto> for Book {
    fn from(dto: BookDto) -> Self {
        Self {
            id: (dto.id > 0).then_some(dto.id),
            author: dto.author,
            launch_date: dto.launch_date,
            price: dto.price,
            title: dto.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn launch_date_uses_rfc3339() {
        let dto: BookDto = serde_json::from_str(
            r#"{"author":"Ralph Johnson","launchDate":"2017-11-29T13:50:05Z","price":49.0,"title":"Design Patterns"}"#,
        )
        .unwrap();
        assert_eq!(dto.launch_date, Some(datetime!(2017-11-29 13:50:05 UTC)));

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["launchDate"], "2017-11-29T13:50:05Z");
    }

    #[test]
    fn entity_conversion_keeps_fields() {
        let book = Book {
            id: Some(2),
            author: "Martin Fowler".into(),
            launch_date: None,
            price: 25.5,
            title: "Refactoring".into(),
        };
        assert_eq!(Book::from(BookDto::from(&book)), book);
    }
}
