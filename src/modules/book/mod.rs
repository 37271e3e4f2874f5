pub mod links;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use erudio_kernel::{settings::Settings, InitCtx, Migration, Module};
use serde_json::json;
use sqlx::SqlitePool;

use links::BookLinks;
use service::BookService;
use store::SqliteBookStore;

pub(crate) fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS book (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                author      TEXT NOT NULL,
                launch_date TEXT,
                price       REAL NOT NULL,
                title       TEXT NOT NULL
            );
            "#,
    }]
}

/// Books resource: paged listing and CRUD.
pub struct BookModule {
    service: BookService,
}

impl BookModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BookModule {
    fn name(&self) -> &'static str {
        "book"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "description": "Error",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });
        let book = json!({
            "description": "Book with action links",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/BookDTO" } },
                "application/xml": { "schema": { "$ref": "#/components/schemas/BookDTO" } },
                "application/yaml": { "schema": { "$ref": "#/components/schemas/BookDTO" } }
            }
        });
        let body = json!({
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/BookDTO" } },
                "application/xml": { "schema": { "$ref": "#/components/schemas/BookDTO" } },
                "application/yaml": { "schema": { "$ref": "#/components/schemas/BookDTO" } }
            }
        });
        let id = json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } });

        Some(json!({
            "paths": {
                "/v1": {
                    "get": {
                        "summary": "Finds all books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "integer", "default": 0 } },
                            { "name": "size", "in": "query", "schema": { "type": "integer", "default": 12 } },
                            { "name": "direction", "in": "query", "schema": { "type": "string", "enum": ["asc", "desc"] } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Page of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "content": { "type": "array", "items": { "$ref": "#/components/schemas/BookDTO" } },
                                                "page": { "$ref": "#/components/schemas/PageMetadata" },
                                                "links": { "type": "array", "items": { "$ref": "#/components/schemas/Link" } }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": error
                        }
                    },
                    "post": {
                        "summary": "Adds a new book",
                        "tags": ["Books"],
                        "requestBody": body,
                        "responses": { "200": book, "400": error }
                    },
                    "put": {
                        "summary": "Updates a book",
                        "tags": ["Books"],
                        "requestBody": body,
                        "responses": { "200": book, "400": error, "404": error }
                    }
                },
                "/v1/{id}": {
                    "get": {
                        "summary": "Finds a book",
                        "tags": ["Books"],
                        "parameters": [id],
                        "responses": { "200": book, "404": error }
                    },
                    "delete": {
                        "summary": "Deletes a book",
                        "tags": ["Books"],
                        "parameters": [id],
                        "responses": { "204": { "description": "No content" }, "404": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookDTO": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "author": { "type": "string" },
                            "launchDate": { "type": "string", "format": "date-time" },
                            "price": { "type": "number", "format": "double" },
                            "title": { "type": "string" },
                            "links": { "type": "array", "readOnly": true, "items": { "$ref": "#/components/schemas/Link" } }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }
}

pub fn create_module(db: &SqlitePool, settings: &Settings) -> Arc<dyn Module> {
    let service = BookService::new(
        Arc::new(SqliteBookStore::new(db.clone())),
        BookLinks::new(&settings.server.public_url),
    );
    Arc::new(BookModule::new(service))
}
