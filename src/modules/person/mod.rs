pub mod links;
pub mod mapper;
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

use crate::codec::FormatRegistry;
use links::PersonLinks;
use mapper::PersonMapper;
use service::PersonService;
use store::SqlitePersonStore;

pub(crate) fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS person (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT    NOT NULL,
                last_name  TEXT    NOT NULL,
                address    TEXT    NOT NULL,
                gender     TEXT    NOT NULL,
                enabled    BOOLEAN NOT NULL DEFAULT TRUE
            );
            CREATE INDEX IF NOT EXISTS person_first_name ON person (first_name);
            "#,
    }]
}

/// People resource: CRUD, search, disable and CSV/XLSX import/export.
pub struct PersonModule {
    service: PersonService,
}

impl PersonModule {
    pub fn new(service: PersonService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &PersonService {
        &self.service
    }
}

#[async_trait]
impl Module for PersonModule {
    fn name(&self) -> &'static str {
        "person"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "person module initialized"
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
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let person = json!({
            "description": "Person with action links",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/PersonDTO" } },
                "application/xml": { "schema": { "$ref": "#/components/schemas/PersonDTO" } },
                "application/yaml": { "schema": { "$ref": "#/components/schemas/PersonDTO" } }
            }
        });
        let person_body = json!({
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/PersonDTO" } },
                "application/xml": { "schema": { "$ref": "#/components/schemas/PersonDTO" } },
                "application/yaml": { "schema": { "$ref": "#/components/schemas/PersonDTO" } }
            }
        });
        let paging = json!([
            { "name": "page", "in": "query", "schema": { "type": "integer", "default": 0 } },
            { "name": "size", "in": "query", "schema": { "type": "integer", "default": 12 } },
            { "name": "direction", "in": "query", "schema": { "type": "string", "enum": ["asc", "desc"], "default": "asc" } }
        ]);
        let id = json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } });
        let page = json!({
            "description": "Page of people",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/PagedPersonDTO" } }
            }
        });

        Some(json!({
            "paths": {
                "/v1": {
                    "get": {
                        "summary": "Finds all people",
                        "tags": ["People"],
                        "parameters": paging,
                        "responses": { "200": page, "400": error }
                    },
                    "post": {
                        "summary": "Adds a new person",
                        "tags": ["People"],
                        "requestBody": person_body,
                        "responses": { "200": person, "400": error, "415": error }
                    },
                    "put": {
                        "summary": "Updates a person",
                        "tags": ["People"],
                        "requestBody": person_body,
                        "responses": { "200": person, "400": error, "404": error }
                    }
                },
                "/v1/v2": {
                    "post": {
                        "summary": "Adds a new person (v2)",
                        "tags": ["People"],
                        "requestBody": {
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/PersonDTOV2" } }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Created person",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/PersonDTOV2" } }
                                }
                            },
                            "400": error
                        }
                    }
                },
                "/v1/massCreation": {
                    "post": {
                        "summary": "Imports people from a CSV or XLSX file",
                        "tags": ["People"],
                        "requestBody": {
                            "content": {
                                "multipart/form-data": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "file": { "type": "string", "format": "binary" } }
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Created people",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/PersonDTO" } }
                                    }
                                }
                            },
                            "400": error,
                            "415": error,
                            "500": error
                        }
                    }
                },
                "/v1/exportPage": {
                    "get": {
                        "summary": "Exports a page of people",
                        "tags": ["People"],
                        "parameters": paging,
                        "responses": {
                            "200": {
                                "description": "Exported file",
                                "content": {
                                    "text/csv": { "schema": { "type": "string", "format": "binary" } },
                                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet": {
                                        "schema": { "type": "string", "format": "binary" }
                                    }
                                }
                            },
                            "415": error,
                            "500": error
                        }
                    }
                },
                "/v1/findPeopleByName/{firstName}": {
                    "get": {
                        "summary": "Finds people whose first name contains the given text",
                        "tags": ["People"],
                        "parameters": [
                            { "name": "firstName", "in": "path", "required": true, "schema": { "type": "string" } },
                            paging[0], paging[1], paging[2]
                        ],
                        "responses": { "200": page, "400": error }
                    }
                },
                "/v1/{id}": {
                    "get": {
                        "summary": "Finds a person",
                        "tags": ["People"],
                        "parameters": [id],
                        "responses": { "200": person, "404": error }
                    },
                    "patch": {
                        "summary": "Disables a person",
                        "tags": ["People"],
                        "parameters": [id],
                        "responses": { "200": person, "404": error }
                    },
                    "delete": {
                        "summary": "Deletes a person",
                        "tags": ["People"],
                        "parameters": [id],
                        "responses": { "204": { "description": "No content" }, "404": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "PersonDTO": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" },
                            "address": { "type": "string" },
                            "gender": { "type": "string" },
                            "enabled": { "type": "boolean" },
                            "links": { "type": "array", "readOnly": true, "items": { "$ref": "#/components/schemas/Link" } }
                        }
                    },
                    "PersonDTOV2": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" },
                            "birthDay": { "type": "string", "format": "date-time" },
                            "address": { "type": "string" },
                            "gender": { "type": "string" }
                        }
                    },
                    "PagedPersonDTO": {
                        "type": "object",
                        "properties": {
                            "content": { "type": "array", "items": { "$ref": "#/components/schemas/PersonDTO" } },
                            "page": { "$ref": "#/components/schemas/PageMetadata" },
                            "links": { "type": "array", "items": { "$ref": "#/components/schemas/Link" } }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "person module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "person module stopped");
        Ok(())
    }
}

/// Create the person module backed by `db`.
pub fn create_module(db: &SqlitePool, settings: &Settings) -> Arc<dyn Module> {
    let service = PersonService::new(
        Arc::new(SqlitePersonStore::new(db.clone())),
        PersonLinks::new(&settings.server.public_url),
        FormatRegistry::with_defaults(),
        PersonMapper,
    );
    Arc::new(PersonModule::new(service))
}
