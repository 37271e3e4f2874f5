use erudio_http::hateoas::Link;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use time::OffsetDateTime;

use crate::links::Linked;

/// Stored person row. `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub gender: String,
    pub enabled: bool,
}

impl<'r> FromRow<'r, SqliteRow> for Person {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            address: row.try_get("address")?,
            gender: row.try_get("gender")?,
            enabled: row.try_get("enabled")?,
        })
    }
}

/// Version 1 transport shape, carrying hypermedia links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_deserializing)]
    pub links: Vec<Link>,
}

fn enabled_by_default() -> bool {
    true
}

impl PersonDto {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: impl Into<String>,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: address.into(),
            gender: gender.into(),
            enabled: true,
            links: Vec::new(),
        }
    }
}

impl Linked for PersonDto {
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

impl From<&Person> for PersonDto {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.unwrap_or_default(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            address: person.address.clone(),
            gender: person.gender.clone(),
            enabled: person.enabled,
            links: Vec::new(),
        }
    }
}

impl From<PersonDto> for Person {
    fn from(dto: PersonDto) -> Self {
        Self {
            id: (dto.id > 0).then_some(dto.id),
            first_name: dto.first_name,
            last_name: dto.last_name,
            address: dto.address,
            gender: dto.gender,
            enabled: dto.enabled,
        }
    }
}

/// Version 2 transport shape: adds a birth date the store does not keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDtoV2 {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub birth_day: Option<OffsetDateTime>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gender: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dto_round_trip_keeps_every_stored_field() {
        let person = Person {
            id: Some(7),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            address: "Rua A".into(),
            gender: "F".into(),
            enabled: false,
        };

        let dto = PersonDto::from(&person);
        assert_eq!(dto.id, 7);
        assert!(dto.links.is_empty());
        assert_eq!(Person::from(dto), person);
    }

    #[test]
    fn unsaved_dto_maps_to_entity_without_id() {
        let entity = Person::from(PersonDto::new("Ana", "Silva", "Rua A", "F"));
        assert_eq!(entity.id, None);
        assert!(entity.enabled);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dto: PersonDto = serde_json::from_str(r#"{"firstName":"Ana"}"#).unwrap();
        assert_eq!(dto.first_name, "Ana");
        assert_eq!(dto.id, 0);
        assert!(dto.enabled);
        assert!(dto.last_name.is_empty());
    }

    #[test]
    fn incoming_links_are_ignored() {
        let dto: PersonDto = serde_json::from_str(
            r#"{"id":3,"firstName":"Ana","links":[{"rel":"self","href":"x"}]}"#,
        )
        .unwrap();
        assert!(dto.links.is_empty());
    }
}
