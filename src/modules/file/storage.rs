use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codec::{APPLICATION_OCTET_STREAM, APPLICATION_XLSX, TEXT_CSV};
use crate::error::ServiceError;

/// Answer to a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    pub file_name: String,
    pub file_download_uri: String,
    pub file_type: String,
    pub file_size: u64,
}

/// Flat directory of uploaded files, addressed by file name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    download_root: String,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, download_root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            download_root: download_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it is missing.
    pub async fn prepare(&self) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(ServiceError::file_processing)
    }

    fn resolve(&self, file_name: &str) -> Result<PathBuf, ServiceError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "File Name cannot be null".to_string(),
            ));
        }
        if file_name.contains("..") || file_name.contains(['/', '\\']) {
            return Err(ServiceError::InvalidInput(format!(
                "Sorry! Filename contains invalid path sequence {}",
                file_name
            )));
        }
        Ok(self.root.join(file_name))
    }

    /// Write `bytes` under `file_name`, replacing any earlier upload.
    pub async fn store(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadFileResponse, ServiceError> {
        let file_name = file_name.unwrap_or_default().trim();
        let path = self.resolve(file_name)?;

        self.prepare().await?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(ServiceError::file_processing)?;

        tracing::info!(file_name, size = bytes.len(), "stored uploaded file");

        let file_type = content_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| content_type_for(file_name));

        Ok(UploadFileResponse {
            file_name: file_name.to_string(),
            file_download_uri: format!("{}/{}", self.download_root, file_name),
            file_type: file_type.to_string(),
            file_size: bytes.len() as u64,
        })
    }

    pub async fn load(&self, file_name: &str) -> Result<Vec<u8>, ServiceError> {
        let path = self.resolve(file_name)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServiceError::NotFound(
                format!("File not found {}", file_name),
            )),
            Err(e) => Err(ServiceError::file_processing(e)),
        }
    }
}

/// Media type guessed from the file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => TEXT_CSV,
        "xlsx" => APPLICATION_XLSX,
        "txt" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => APPLICATION_OCTET_STREAM,
    }
}
