//! File codecs for bulk person import and export, selected by media type
//! (export) or file extension (import).

use std::sync::Arc;

use thiserror::Error;

use crate::error::ServiceError;
use crate::modules::person::models::PersonDto;

pub mod csv;
pub mod xlsx;

pub const TEXT_CSV: &str = "text/csv";
pub const APPLICATION_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Column titles shared by every tabular format.
pub const HEADERS: [&str; 4] = ["First Name", "Last Name", "Address", "Gender"];

const INVALID_FORMAT: &str = "Invalid File Format!";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("csv: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("xlsx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xlsx markup: {0}")]
    Xml(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes people into a downloadable binary format.
pub trait FileExporter: Send + Sync {
    fn content_type(&self) -> &'static str;

    /// Extension of produced files, without the dot.
    fn extension(&self) -> &'static str;

    fn export(&self, people: &[PersonDto]) -> Result<Vec<u8>, CodecError>;
}

/// Parses an uploaded file into people, in file order.
pub trait FileImporter: Send + Sync {
    fn import(&self, bytes: &[u8]) -> Result<Vec<PersonDto>, CodecError>;
}

/// A finished export, ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Keyed lookup of the available codecs.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    exporters: Vec<Arc<dyn FileExporter>>,
    importers: Vec<(&'static str, Arc<dyn FileImporter>)>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// CSV and XLSX in both directions.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_exporter(Arc::new(csv::CsvExporter))
            .with_exporter(Arc::new(xlsx::XlsxExporter))
            .with_importer("csv", Arc::new(csv::CsvImporter))
            .with_importer("xlsx", Arc::new(xlsx::XlsxImporter))
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn FileExporter>) -> Self {
        self.exporters.push(exporter);
        self
    }

    pub fn with_importer(
        mut self,
        extension: &'static str,
        importer: Arc<dyn FileImporter>,
    ) -> Self {
        self.importers.push((extension, importer));
        self
    }

    /// Exporter whose media type equals the `Accept` header value.
    ///
    /// Matching ignores case and media type parameters. A missing header is
    /// not a match.
    pub fn exporter(&self, accept: Option<&str>) -> Result<Arc<dyn FileExporter>, ServiceError> {
        let requested = accept
            .map(|value| value.split(';').next().unwrap_or_default().trim())
            .unwrap_or_default();

        self.exporters
            .iter()
            .find(|exporter| exporter.content_type().eq_ignore_ascii_case(requested))
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(accept = requested, "no exporter for requested media type");
                ServiceError::UnsupportedFormat(INVALID_FORMAT.to_string())
            })
    }

    /// Importer registered for the extension of `file_name`.
    pub fn importer(&self, file_name: &str) -> Result<Arc<dyn FileImporter>, ServiceError> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "File Name cannot be null".to_string(),
            ));
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, extension)| extension)
            .unwrap_or_default();

        self.importers
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(extension))
            .map(|(_, importer)| importer.clone())
            .ok_or_else(|| {
                tracing::warn!(file_name, "no importer for file extension");
                ServiceError::UnsupportedFormat(INVALID_FORMAT.to_string())
            })
    }
}

/// Cell text for an exported person, in `HEADERS` order.
pub(crate) fn columns(person: &PersonDto) -> [&str; 4] {
    [
        &person.first_name,
        &person.last_name,
        &person.address,
        &person.gender,
    ]
}

/// Person from the first four cells of a data row; `None` when the first
/// name is blank.
pub(crate) fn person_from_cells<S: AsRef<str>>(cells: &[S]) -> Option<PersonDto> {
    let cell = |index: usize| {
        cells
            .get(index)
            .map(|value| value.as_ref().trim().to_string())
            .unwrap_or_default()
    };

    let first_name = cell(0);
    if first_name.is_empty() {
        return None;
    }

    Some(PersonDto::new(first_name, cell(1), cell(2), cell(3)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_matches_media_type_case_insensitively() {
        let registry = FormatRegistry::with_defaults();

        let exporter = registry.exporter(Some("TEXT/CSV")).unwrap();
        assert_eq!(exporter.extension(), "csv");

        let exporter = registry
            .exporter(Some(&format!("{}; q=1", APPLICATION_XLSX)))
            .unwrap();
        assert_eq!(exporter.extension(), "xlsx");
    }

    #[test]
    fn unknown_or_missing_accept_header_is_unsupported() {
        let registry = FormatRegistry::with_defaults();

        for accept in [Some("application/json"), Some(""), None] {
            assert!(matches!(
                registry.exporter(accept),
                Err(ServiceError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn importer_is_chosen_by_extension() {
        let registry = FormatRegistry::with_defaults();

        assert!(registry.importer("people.CSV").is_ok());
        assert!(registry.importer("archive.2024.xlsx").is_ok());
        assert!(matches!(
            registry.importer("people.pdf"),
            Err(ServiceError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            registry.importer("people"),
            Err(ServiceError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            registry.importer("  "),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_registry_supports_nothing() {
        let registry = FormatRegistry::new();
        assert!(registry.exporter(Some(TEXT_CSV)).is_err());
        assert!(registry.importer("a.csv").is_err());
    }

    #[test]
    fn blank_first_name_rows_are_skipped() {
        assert!(person_from_cells(&["  ", "Silva"]).is_none());

        let person = person_from_cells(&["Ana", "Silva"]).unwrap();
        assert_eq!(person.last_name, "Silva");
        assert!(person.address.is_empty());
        assert!(person.enabled);
    }
}
