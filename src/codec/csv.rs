use csv::{ReaderBuilder, Trim, WriterBuilder};

use super::{columns, person_from_cells, CodecError, FileExporter, FileImporter, HEADERS, TEXT_CSV};
use crate::modules::person::models::PersonDto;

/// Comma separated values with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl FileExporter for CsvExporter {
    fn content_type(&self) -> &'static str {
        TEXT_CSV
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn export(&self, people: &[PersonDto]) -> Result<Vec<u8>, CodecError> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());

        writer.write_record(HEADERS)?;
        for person in people {
            writer.write_record(columns(person))?;
        }

        writer
            .into_inner()
            .map_err(|e| CodecError::Io(e.into_error()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvImporter;

impl FileImporter for CsvImporter {
    fn import(&self, bytes: &[u8]) -> Result<Vec<PersonDto>, CodecError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(bytes);

        let mut people = Vec::new();
        for record in reader.records() {
            let record = record?;
            let cells: Vec<&str> = record.iter().collect();
            if let Some(person) = person_from_cells(&cells) {
                people.push(person);
            }
        }

        tracing::debug!(count = people.len(), "parsed csv upload");
        Ok(people)
    }
}
