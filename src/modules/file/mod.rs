//! Plain file upload and download, stored on the local filesystem.

pub mod storage;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use erudio_http::error::AppError;
use erudio_http::negotiate::{Accepts, Negotiated};
use erudio_kernel::{settings::Settings, InitCtx, Module};
use serde_json::json;

use crate::links::resource_root;
use storage::{content_type_for, FileStorage, UploadFileResponse};

pub const ROUTE: &str = "/api/file/v1";

const ROOT: &str = "UploadFileResponseDTO";

pub struct FileModule {
    storage: FileStorage,
}

impl FileModule {
    pub fn new(storage: FileStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Module for FileModule {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.storage.prepare().await?;
        tracing::info!(
            module = self.name(),
            upload_dir = %self.storage.root().display(),
            "file module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        router(self.storage.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "description": "Error",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });

        Some(json!({
            "paths": {
                "/v1/uploadFile": {
                    "post": {
                        "summary": "Uploads one file",
                        "tags": ["File Endpoint"],
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
                                "description": "Stored file",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/UploadFileResponseDTO" } }
                                }
                            },
                            "400": error,
                            "500": error
                        }
                    }
                },
                "/v1/uploadMultipleFiles": {
                    "post": {
                        "summary": "Uploads several files",
                        "tags": ["File Endpoint"],
                        "requestBody": {
                            "content": {
                                "multipart/form-data": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "files": { "type": "array", "items": { "type": "string", "format": "binary" } }
                                        }
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Stored files",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/UploadFileResponseDTO" } }
                                    }
                                }
                            },
                            "400": error,
                            "500": error
                        }
                    }
                },
                "/v1/downloadFile/{fileName}": {
                    "get": {
                        "summary": "Downloads a stored file",
                        "tags": ["File Endpoint"],
                        "parameters": [
                            { "name": "fileName", "in": "path", "required": true, "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "File content",
                                "content": {
                                    "application/octet-stream": { "schema": { "type": "string", "format": "binary" } }
                                }
                            },
                            "404": error
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "UploadFileResponseDTO": {
                        "type": "object",
                        "properties": {
                            "fileName": { "type": "string" },
                            "fileDownloadUri": { "type": "string" },
                            "fileType": { "type": "string" },
                            "fileSize": { "type": "integer", "format": "int64" }
                        }
                    }
                }
            }
        }))
    }
}

pub fn create_module(settings: &Settings) -> Arc<dyn Module> {
    let download_root = format!(
        "{}/downloadFile",
        resource_root(&settings.server.public_url, ROUTE)
    );
    Arc::new(FileModule::new(FileStorage::new(
        &settings.storage.upload_dir,
        download_root,
    )))
}

pub fn router(storage: FileStorage) -> Router {
    Router::new()
        .route("/v1/uploadFile", post(upload_file))
        .route("/v1/uploadMultipleFiles", post(upload_multiple_files))
        .route("/v1/downloadFile/{file_name}", get(download_file))
        .with_state(storage)
}

async fn store_field(
    storage: &FileStorage,
    field: Field<'_>,
) -> Result<UploadFileResponse, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?;

    Ok(storage
        .store(file_name.as_deref(), content_type.as_deref(), &bytes)
        .await?)
}

async fn upload_file(
    State(storage): State<FileStorage>,
    Accepts(format): Accepts,
    mut multipart: Multipart,
) -> Result<Negotiated<UploadFileResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() == Some("file") {
            let stored = store_field(&storage, field).await?;
            return Ok(Negotiated::new(format, ROOT, stored));
        }
    }

    Err(AppError::bad_request("multipart field 'file' is required"))
}

async fn upload_multiple_files(
    State(storage): State<FileStorage>,
    Accepts(format): Accepts,
    mut multipart: Multipart,
) -> Result<Negotiated<Vec<UploadFileResponse>>, AppError> {
    let mut stored = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() == Some("files") {
            stored.push(store_field(&storage, field).await?);
        }
    }

    Ok(Negotiated::new(format, ROOT, stored))
}

async fn download_file(
    State(storage): State<FileStorage>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let bytes = storage.load(&file_name).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&file_name).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}
