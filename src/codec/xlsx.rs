//! Minimal SpreadsheetML workbooks: one worksheet of inline strings on the
//! way out, shared or inline strings on the way in.

use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{
    columns, person_from_cells, CodecError, FileExporter, FileImporter, APPLICATION_XLSX, HEADERS,
};
use crate::modules::person::models::PersonDto;

const SHEET_NAME: &str = "People";
const SHEET_PATH: &str = "xl/worksheets/sheet1.xml";
/// Column count of a worksheet (`A` to `XFD`).
const MAX_COLUMNS: usize = 16_384;
const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{SPREADSHEET_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn xml_error(error: impl std::fmt::Display) -> CodecError {
    CodecError::Xml(error.to_string())
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Zero-based column of a cell reference such as `C12`; `None` when the
/// reference has no column letters.
///
/// Columns past `XFD`, the last one a worksheet can hold, are rejected.
fn column_index(reference: &str) -> Result<Option<usize>, CodecError> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return Ok(None);
    }

    let number = letters
        .iter()
        .try_fold(0usize, |acc, b| {
            acc.checked_mul(26)?
                .checked_add(usize::from(b - b'A' + 1))
                .filter(|n| *n <= MAX_COLUMNS)
        })
        .ok_or_else(|| {
            CodecError::Xml(format!("cell reference '{}' is out of range", reference))
        })?;

    Ok(Some(number - 1))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxExporter;

impl XlsxExporter {
    fn sheet_xml(&self, people: &[PersonDto]) -> Result<Vec<u8>, CodecError> {
        let mut writer = Writer::new(Vec::new());

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)]),
            ))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Start(BytesStart::new("sheetData")))
            .map_err(xml_error)?;

        let rows = std::iter::once(HEADERS).chain(people.iter().map(columns));
        for (row_index, cells) in rows.enumerate() {
            let row_number = (row_index + 1).to_string();
            writer
                .write_event(Event::Start(
                    BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
                ))
                .map_err(xml_error)?;

            for (column, value) in cells.iter().enumerate() {
                let reference = format!("{}{}", column_name(column), row_number);
                writer
                    .write_event(Event::Start(BytesStart::new("c").with_attributes([
                        ("r", reference.as_str()),
                        ("t", "inlineStr"),
                    ])))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::Start(BytesStart::new("is")))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::Start(BytesStart::new("t")))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::Text(BytesText::new(value)))
                    .map_err(xml_error)?;
                for tag in ["t", "is", "c"] {
                    writer
                        .write_event(Event::End(BytesEnd::new(tag)))
                        .map_err(xml_error)?;
                }
            }

            writer
                .write_event(Event::End(BytesEnd::new("row")))
                .map_err(xml_error)?;
        }

        for tag in ["sheetData", "worksheet"] {
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(xml_error)?;
        }

        Ok(writer.into_inner())
    }
}

impl FileExporter for XlsxExporter {
    fn content_type(&self) -> &'static str {
        APPLICATION_XLSX
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn export(&self, people: &[PersonDto]) -> Result<Vec<u8>, CodecError> {
        let sheet = self.sheet_xml(people)?;
        let workbook = workbook_xml();
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", ROOT_RELS.as_bytes()),
            ("xl/workbook.xml", workbook.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
            (SHEET_PATH, &sheet),
        ];
        for (name, content) in parts {
            archive.start_file(name, options)?;
            archive.write_all(content)?;
        }

        Ok(archive.finish()?.into_inner())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxImporter;

impl XlsxImporter {
    fn read_part<R: Read + std::io::Seek>(
        archive: &mut ZipArchive<R>,
        name: &str,
    ) -> Result<Option<String>, CodecError> {
        let mut file = match archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(Some(content))
    }

    /// Archive path of the first worksheet listed in the workbook.
    fn first_sheet_path<R: Read + std::io::Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<String, CodecError> {
        let workbook = Self::read_part(archive, "xl/workbook.xml")?;
        let rels = Self::read_part(archive, "xl/_rels/workbook.xml.rels")?;

        let (Some(workbook), Some(rels)) = (workbook, rels) else {
            return Ok(SHEET_PATH.to_string());
        };

        let Some(rel_id) = first_attribute(&workbook, b"sheet", b"r:id")? else {
            return Ok(SHEET_PATH.to_string());
        };

        let mut reader = Reader::from_str(&rels);
        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    if attribute(&e, b"Id")?.as_deref() == Some(rel_id.as_str()) {
                        if let Some(target) = attribute(&e, b"Target")? {
                            return Ok(match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            });
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(SHEET_PATH.to_string())
    }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, CodecError> {
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn first_attribute(xml: &str, element: &[u8], key: &[u8]) -> Result<Option<String>, CodecError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == element => {
                return attribute(&e, key);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Text of every `<si>` entry, rich text runs concatenated.
fn shared_strings(xml: &str) -> Result<Vec<String>, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Text(text) if in_text => {
                current.push_str(&text.unescape().map_err(xml_error)?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// Rows of the worksheet as dense cell vectors, gaps filled with "".
fn sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut column = 0usize;
    let mut cell_type: Option<String> = None;
    let mut value = String::new();
    let mut in_value = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = Vec::new();
                    column = 0;
                }
                b"c" => {
                    column = match attribute(&e, b"r")? {
                        Some(reference) => column_index(&reference)?.unwrap_or(row.len()),
                        None => row.len(),
                    };
                    cell_type = attribute(&e, b"t")?;
                    value.clear();
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::Text(text) if in_value => {
                value.push_str(&text.unescape().map_err(xml_error)?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let resolved = match cell_type.as_deref() {
                        Some("s") => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|index| shared.get(index))
                            .cloned()
                            .unwrap_or_default(),
                        _ => std::mem::take(&mut value),
                    };
                    if row.len() <= column {
                        row.resize(column + 1, String::new());
                    }
                    row[column] = resolved;
                    value.clear();
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"row" => rows.push(Vec::new()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

impl FileImporter for XlsxImporter {
    fn import(&self, bytes: &[u8]) -> Result<Vec<PersonDto>, CodecError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let shared = match Self::read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => shared_strings(&xml)?,
            None => Vec::new(),
        };

        let sheet_path = Self::first_sheet_path(&mut archive)?;
        let sheet = Self::read_part(&mut archive, &sheet_path)?
            .ok_or(CodecError::Zip(ZipError::FileNotFound))?;

        let people: Vec<PersonDto> = sheet_rows(&sheet, &shared)?
            .iter()
            .skip(1)
            .filter_map(|cells| person_from_cells(cells))
            .collect();

        tracing::debug!(count = people.len(), sheet = %sheet_path, "parsed xlsx upload");
        Ok(people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Vec<PersonDto> {
        vec![
            PersonDto::new("Ana", "Silva", "Rua A & B", "F"),
            PersonDto::new("Bruno", "Costa", "Rua <B>", "M"),
        ]
    }

    #[test]
    fn column_names_and_indexes_agree() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_index("A1").unwrap(), Some(0));
        assert_eq!(column_index("AA10").unwrap(), Some(26));
        assert_eq!(column_index("XFD3").unwrap(), Some(16_383));
        assert_eq!(column_index("12").unwrap(), None);
    }

    #[test]
    fn export_produces_a_zip_workbook() {
        let bytes = XlsxExporter.export(&people()).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let sheet = XlsxImporter::read_part(&mut archive, SHEET_PATH)
            .unwrap()
            .unwrap();
        assert!(sheet.contains("<t>First Name</t>"));
        assert!(sheet.contains("Rua A &amp; B"));
    }

    #[test]
    fn exported_workbook_imports_back() {
        let bytes = XlsxExporter.export(&people()).unwrap();
        assert_eq!(XlsxImporter.import(&bytes).unwrap(), people());
    }

    #[test]
    fn shared_strings_and_sparse_cells_are_resolved() {
        let shared = shared_strings(
            r#"<sst xmlns="x"><si><t>Name</t></si><si><t>Ana</t></si><si><r><t>Sil</t></r><r><t>va</t></r></si></sst>"#,
        )
        .unwrap();
        assert_eq!(shared, vec!["Name", "Ana", "Silva"]);

        let rows = sheet_rows(
            r#"<worksheet><sheetData>
                 <row r="1"><c r="A1" t="s"><v>0</v></c></row>
                 <row r="2"><c r="A2" t="s"><v>1</v></c><c r="C2" t="str"><v>Rua A</v></c><c r="B2" t="s"><v>2</v></c></row>
               </sheetData></worksheet>"#,
            &shared,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Ana", "Silva", "Rua A"]);
    }

    #[test]
    fn garbage_is_a_codec_error() {
        assert!(matches!(
            XlsxImporter.import(b"not a zip"),
            Err(CodecError::Zip(_))
        ));
    }

    #[test]
    fn oversized_cell_reference_is_a_codec_error() {
        assert!(matches!(column_index("XFE1"), Err(CodecError::Xml(_))));

        let sheet = r#"<worksheet><sheetData>
                 <row r="1"><c r="A1" t="inlineStr"><is><t>First Name</t></is></c></row>
                 <row r="2"><c r="ZZZZZZZZZZZZZZZ2" t="inlineStr"><is><t>Ana</t></is></c></row>
               </sheetData></worksheet>"#;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(SHEET_PATH, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(sheet.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            XlsxImporter.import(&bytes),
            Err(CodecError::Xml(_))
        ));
    }
}
