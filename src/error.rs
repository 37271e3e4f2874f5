//! Domain error taxonomy shared by every service.

use erudio_http::error::AppError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const NO_RECORDS_FOUND: &str = "No records found for this ID!";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Referenced id (or file) does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("It is not allowed to persist a null object!")]
    NullArgument,

    #[error("{0}")]
    InvalidInput(String),

    /// Unknown content type or file extension.
    #[error("{0}")]
    UnsupportedFormat(String),

    /// A stored value could not be converted into its field type.
    #[error("cannot map column '{column}': {message}")]
    Mapping { column: String, message: String },

    #[error("Error Processing the File!")]
    FileProcessing(#[source] BoxError),

    #[error("Error during file export!")]
    Export(#[source] BoxError),

    #[error("record store failure")]
    Store(#[source] sqlx::Error),
}

impl ServiceError {
    pub fn not_found() -> Self {
        ServiceError::NotFound(NO_RECORDS_FOUND.to_string())
    }

    pub fn file_processing(source: impl Into<BoxError>) -> Self {
        ServiceError::FileProcessing(source.into())
    }

    pub fn export(source: impl Into<BoxError>) -> Self {
        ServiceError::Export(source.into())
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::ColumnDecode { index, source } => ServiceError::Mapping {
                column: index,
                message: source.to_string(),
            },
            sqlx::Error::ColumnNotFound(column) => ServiceError::Mapping {
                column,
                message: "column not present in result".to_string(),
            },
            sqlx::Error::Decode(source) => ServiceError::Mapping {
                column: "?".to_string(),
                message: source.to_string(),
            },
            other => ServiceError::Store(other),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound(message) => AppError::not_found(message),
            ServiceError::NullArgument => {
                AppError::bad_request(ServiceError::NullArgument.to_string())
            }
            ServiceError::InvalidInput(message) => AppError::bad_request(message),
            ServiceError::UnsupportedFormat(message) => AppError::unsupported_media_type(message),
            other => AppError::internal(other),
        }
    }
}
