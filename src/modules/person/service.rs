use std::sync::Arc;

use erudio_http::hateoas::{Link, PagedModel};
use erudio_http::paging::Pageable;

use super::links::PersonLinks;
use super::mapper::PersonMapper;
use super::models::{Person, PersonDto, PersonDtoV2};
use super::store::PersonStore;
use crate::codec::{ExportedFile, FormatRegistry};
use crate::error::ServiceError;
use crate::links::LinkBuilder;
use crate::store::Slice;

const EXPORT_FILE_STEM: &str = "people_exported";

/// An uploaded file as received from a multipart request.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Person use cases: lookups, paging, bulk import/export and writes.
#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn PersonStore>,
    links: PersonLinks,
    codecs: FormatRegistry,
    mapper: PersonMapper,
}

impl PersonService {
    pub fn new(
        store: Arc<dyn PersonStore>,
        links: PersonLinks,
        codecs: FormatRegistry,
        mapper: PersonMapper,
    ) -> Self {
        Self {
            store,
            links,
            codecs,
            mapper,
        }
    }

    fn to_dto(&self, person: &Person) -> PersonDto {
        let mut dto = PersonDto::from(person);
        self.links.attach(&mut dto);
        dto
    }

    fn to_page(
        &self,
        slice: Slice<Person>,
        pageable: &Pageable,
        href_for: impl Fn(&Pageable) -> String,
    ) -> PagedModel<PersonDto> {
        let total = slice.total;
        let content = slice.map(|person| self.to_dto(&person)).items;
        let self_link = Link::nav("self", self.links.find_all_href(pageable));
        PagedModel::assemble(content, pageable, total, self_link, href_for)
    }

    pub async fn find_all(
        &self,
        pageable: Pageable,
    ) -> Result<PagedModel<PersonDto>, ServiceError> {
        tracing::info!(
            page = pageable.page(),
            size = pageable.size(),
            "finding all people"
        );

        let slice = self.store.find_all(&pageable).await?;
        Ok(self.to_page(slice, &pageable, |p| self.links.find_all_href(p)))
    }

    pub async fn find_by_name(
        &self,
        first_name: &str,
        pageable: Pageable,
    ) -> Result<PagedModel<PersonDto>, ServiceError> {
        tracing::info!(first_name, page = pageable.page(), "finding people by name");

        let slice = self.store.find_by_name(first_name, &pageable).await?;
        Ok(self.to_page(slice, &pageable, |p| {
            self.links.find_by_name_href(first_name, p)
        }))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<PersonDto, ServiceError> {
        tracing::info!(id, "finding one person");

        let person = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(ServiceError::not_found)?;
        Ok(self.to_dto(&person))
    }

    /// Render one page of people in the format named by `accept`.
    ///
    /// An unsupported `accept` value is reported as is; any later failure
    /// becomes an export error.
    pub async fn export_page(
        &self,
        pageable: Pageable,
        accept: Option<&str>,
    ) -> Result<ExportedFile, ServiceError> {
        tracing::info!(
            page = pageable.page(),
            size = pageable.size(),
            accept,
            "exporting a people page"
        );

        let exporter = self.codecs.exporter(accept)?;

        let people: Vec<PersonDto> = self
            .store
            .find_all(&pageable)
            .await
            .map_err(ServiceError::export)?
            .items
            .iter()
            .map(PersonDto::from)
            .collect();

        let bytes = exporter.export(&people).map_err(ServiceError::export)?;

        Ok(ExportedFile {
            file_name: format!("{}.{}", EXPORT_FILE_STEM, exporter.extension()),
            content_type: exporter.content_type(),
            bytes,
        })
    }

    pub async fn create(&self, person: Option<PersonDto>) -> Result<PersonDto, ServiceError> {
        let dto = person.ok_or(ServiceError::NullArgument)?;
        tracing::info!("creating one person");

        let entity = Person {
            id: None,
            ..Person::from(dto)
        };
        let saved = self.store.save(entity).await?;
        Ok(self.to_dto(&saved))
    }

    pub async fn create_v2(
        &self,
        person: Option<PersonDtoV2>,
    ) -> Result<PersonDtoV2, ServiceError> {
        let dto = person.ok_or(ServiceError::NullArgument)?;
        tracing::info!("creating one person (v2)");

        let entity = Person {
            id: None,
            ..self.mapper.dto_to_entity(dto)
        };
        let saved = self.store.save(entity).await?;
        Ok(self.mapper.entity_to_dto(&saved))
    }

    /// Import every person in `upload`, all or nothing.
    pub async fn mass_creation(&self, upload: Upload) -> Result<Vec<PersonDto>, ServiceError> {
        tracing::info!(
            file_name = ?upload.file_name,
            size = upload.bytes.len(),
            "importing people from file"
        );

        if upload.bytes.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Please set a Valid File!".to_string(),
            ));
        }

        let importer = self
            .codecs
            .importer(upload.file_name.as_deref().unwrap_or_default())?;

        let people: Vec<Person> = importer
            .import(&upload.bytes)
            .map_err(ServiceError::file_processing)?
            .into_iter()
            .map(|dto| Person {
                id: None,
                enabled: true,
                ..Person::from(dto)
            })
            .collect();

        let saved = self
            .store
            .save_all(people)
            .await
            .map_err(ServiceError::file_processing)?;

        tracing::info!(count = saved.len(), "imported people");
        Ok(saved.iter().map(|person| self.to_dto(person)).collect())
    }

    pub async fn update(&self, person: Option<PersonDto>) -> Result<PersonDto, ServiceError> {
        let dto = person.ok_or(ServiceError::NullArgument)?;
        tracing::info!(id = dto.id, "updating one person");

        let mut entity = self
            .store
            .find_by_id(dto.id)
            .await?
            .ok_or_else(ServiceError::not_found)?;

        entity.first_name = dto.first_name;
        entity.last_name = dto.last_name;
        entity.address = dto.address;
        entity.gender = dto.gender;

        let saved = self.store.save(entity).await?;
        Ok(self.to_dto(&saved))
    }

    pub async fn disable(&self, id: i64) -> Result<PersonDto, ServiceError> {
        tracing::info!(id, "disabling one person");

        let person = self
            .store
            .disable(id)
            .await?
            .ok_or_else(ServiceError::not_found)?;
        Ok(self.to_dto(&person))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        tracing::info!(id, "deleting one person");

        if !self.store.delete(id).await? {
            return Err(ServiceError::not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::csv::CsvExporter;
    use crate::codec::{FileExporter, APPLICATION_XLSX, TEXT_CSV};
    use crate::links::Linked;
    use crate::modules::person::store::SqlitePersonStore;
    use crate::testing::memory_pool;
    use async_trait::async_trait;
    use erudio_http::paging::Direction;

    async fn service() -> PersonService {
        let pool = memory_pool(super::super::migrations()).await;
        PersonService::new(
            Arc::new(SqlitePersonStore::new(pool)),
            PersonLinks::new("http://localhost:8080"),
            FormatRegistry::with_defaults(),
            PersonMapper,
        )
    }

    fn ana() -> PersonDto {
        PersonDto::new("Ana", "Silva", "Rua A", "F")
    }

    async fn seed(service: &PersonService, names: &[&str]) -> Vec<PersonDto> {
        let mut created = Vec::new();
        for name in names {
            let dto = PersonDto::new(*name, "Souza", "Rua B", "M");
            created.push(service.create(Some(dto)).await.unwrap());
        }
        created
    }

    struct BrokenStore;

    #[async_trait]
    impl PersonStore for BrokenStore {
        async fn find_by_id(&self, _id: i64) -> Result<Option<Person>, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
        async fn find_all(&self, _pageable: &Pageable) -> Result<Slice<Person>, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
        async fn find_by_name(
            &self,
            _first_name: &str,
            _pageable: &Pageable,
        ) -> Result<Slice<Person>, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
        async fn save(&self, _person: Person) -> Result<Person, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
        async fn save_all(&self, _people: Vec<Person>) -> Result<Vec<Person>, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
        async fn disable(&self, _id: i64) -> Result<Option<Person>, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
        async fn delete(&self, _id: i64) -> Result<bool, ServiceError> {
            Err(ServiceError::Store(sqlx::Error::PoolClosed))
        }
    }

    fn broken_service() -> PersonService {
        PersonService::new(
            Arc::new(BrokenStore),
            PersonLinks::new("http://localhost:8080"),
            FormatRegistry::with_defaults(),
            PersonMapper,
        )
    }

    #[tokio::test]
    async fn created_person_is_found_with_links() {
        let service = service().await;
        let created = service.create(Some(ana())).await.unwrap();

        let found = service.find_by_id(created.id).await.unwrap();
        assert_eq!(found.first_name, "Ana");
        assert_eq!(found.last_name, "Silva");
        assert_eq!(found.address, "Rua A");
        assert_eq!(found.gender, "F");
        assert!(found.enabled);

        let rels: Vec<&str> = found.links().iter().map(|l| l.rel.as_str()).collect();
        assert_eq!(rels.len(), 9);
        for rel in ["self", "findAll", "delete"] {
            assert!(rels.contains(&rel), "missing {rel}");
        }
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let service = service().await;
        let mut dto = ana();
        dto.id = 77;

        let created = service.create(Some(dto)).await.unwrap();
        assert_ne!(created.id, 77);
    }

    #[tokio::test]
    async fn missing_objects_are_rejected() {
        let service = service().await;
        assert!(matches!(service.create(None).await, Err(ServiceError::NullArgument)));
        assert!(matches!(service.create_v2(None).await, Err(ServiceError::NullArgument)));
        assert!(matches!(service.update(None).await, Err(ServiceError::NullArgument)));
    }

    #[tokio::test]
    async fn find_all_descending_returns_the_requested_window() {
        let service = service().await;
        seed(&service, &["Ana", "Carla", "Bruno"]).await;

        let pageable = Pageable::new(0, 2, Direction::Desc).unwrap();
        let page = service.find_all(pageable).await.unwrap();

        assert_eq!(page.content.len(), 2);
        assert_eq!(page.content[0].first_name, "Carla");
        assert_eq!(page.page.total_elements, 3);
        assert_eq!(page.page.total_pages, 2);
        assert_eq!(
            page.link("self").unwrap().href,
            "http://localhost:8080/api/person/v1?page=0&size=2&direction=desc"
        );
        assert!(page.link("next").is_some());
        assert!(page.link("prev").is_none());
    }

    #[tokio::test]
    async fn find_by_name_pages_through_matches() {
        let service = service().await;
        seed(&service, &["Ana", "Mariana", "Bruno", "Anabela"]).await;

        let pageable = Pageable::new(0, 2, Direction::Asc).unwrap();
        let page = service.find_by_name("ana", pageable).await.unwrap();

        let names: Vec<&str> = page.content.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Anabela"]);
        assert_eq!(page.page.total_elements, 3);
        assert_eq!(
            page.link("next").unwrap().href,
            "http://localhost:8080/api/person/v1/findPeopleByName/ana?page=1&size=2&direction=asc"
        );
    }

    #[tokio::test]
    async fn update_overwrites_mutable_fields_and_keeps_identity() {
        let service = service().await;
        let created = service.create(Some(ana())).await.unwrap();
        service.disable(created.id).await.unwrap();

        let mut changed = PersonDto::new("Ana Maria", "Costa", "Rua C", "F");
        changed.id = created.id;
        let updated = service.update(Some(changed)).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.first_name, "Ana Maria");
        assert_eq!(updated.address, "Rua C");
        assert!(!updated.enabled);

        let mut unknown = ana();
        unknown.id = 999;
        assert!(matches!(
            service.update(Some(unknown)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn disable_clears_the_flag_only() {
        let service = service().await;
        let created = service.create(Some(ana())).await.unwrap();

        let disabled = service.disable(created.id).await.unwrap();
        assert!(!disabled.enabled);
        assert_eq!(disabled.first_name, created.first_name);
        assert_eq!(disabled.last_name, created.last_name);
        assert_eq!(disabled.links, created.links);

        assert!(matches!(
            service.disable(999).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_and_then_reports_not_found() {
        let service = service().await;
        let created = service.create(Some(ana())).await.unwrap();

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.find_by_id(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_v2_stamps_birth_day_and_skips_links() {
        let service = service().await;
        let dto = PersonDtoV2 {
            id: 0,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            birth_day: None,
            address: "Rua A".into(),
            gender: "F".into(),
        };

        let created = service.create_v2(Some(dto)).await.unwrap();
        assert!(created.id > 0);
        assert!(created.birth_day.is_some());
    }

    #[tokio::test]
    async fn export_selects_format_from_accept_header() {
        let service = service().await;
        seed(&service, &["Ana", "Bruno"]).await;

        let csv = service
            .export_page(Pageable::default(), Some(TEXT_CSV))
            .await
            .unwrap();
        assert_eq!(csv.file_name, "people_exported.csv");
        assert_eq!(csv.content_type, TEXT_CSV);
        let text = String::from_utf8(csv.bytes).unwrap();
        assert!(text.starts_with("First Name,Last Name,Address,Gender"));
        assert!(text.contains("Bruno,Souza,Rua B,M"));

        let xlsx = service
            .export_page(Pageable::default(), Some(APPLICATION_XLSX))
            .await
            .unwrap();
        assert_eq!(xlsx.file_name, "people_exported.xlsx");
        assert!(!xlsx.bytes.is_empty());
    }

    #[tokio::test]
    async fn export_with_unknown_accept_header_is_unsupported() {
        let service = service().await;
        for accept in [Some("application/pdf"), None] {
            assert!(matches!(
                service.export_page(Pageable::default(), accept).await,
                Err(ServiceError::UnsupportedFormat(_))
            ));
        }
    }

    #[tokio::test]
    async fn export_wraps_store_failures() {
        let result = broken_service()
            .export_page(Pageable::default(), Some(TEXT_CSV))
            .await;
        assert!(matches!(result, Err(ServiceError::Export(_))));
    }

    #[tokio::test]
    async fn mass_creation_imports_every_row() {
        let service = service().await;
        let people = vec![
            PersonDto::new("Ana", "Silva", "Rua A", "F"),
            PersonDto::new("Bruno", "Costa", "Rua B", "M"),
        ];
        let bytes = CsvExporter.export(&people).unwrap();

        let created = service
            .mass_creation(Upload {
                file_name: Some("people.csv".to_string()),
                bytes,
            })
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|p| p.id > 0 && p.links.len() == 9));
        let page = service.find_all(Pageable::default()).await.unwrap();
        assert_eq!(page.page.total_elements, 2);
    }

    #[tokio::test]
    async fn mass_creation_rejects_bad_uploads() {
        let service = service().await;

        let empty = Upload {
            file_name: Some("people.csv".to_string()),
            bytes: Vec::new(),
        };
        assert!(matches!(
            service.mass_creation(empty).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let unnamed = Upload {
            file_name: None,
            bytes: b"First Name\nAna\n".to_vec(),
        };
        assert!(matches!(
            service.mass_creation(unnamed).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let pdf = Upload {
            file_name: Some("people.pdf".to_string()),
            bytes: b"%PDF".to_vec(),
        };
        assert!(matches!(
            service.mass_creation(pdf).await,
            Err(ServiceError::UnsupportedFormat(_))
        ));

        let corrupt = Upload {
            file_name: Some("people.xlsx".to_string()),
            bytes: b"not a workbook".to_vec(),
        };
        assert!(matches!(
            service.mass_creation(corrupt).await,
            Err(ServiceError::FileProcessing(_))
        ));
    }

    #[tokio::test]
    async fn mass_creation_wraps_store_failures() {
        let upload = Upload {
            file_name: Some("people.csv".to_string()),
            bytes: b"First Name,Last Name,Address,Gender\nAna,Silva,Rua A,F\n".to_vec(),
        };
        assert!(matches!(
            broken_service().mass_creation(upload).await,
            Err(ServiceError::FileProcessing(_))
        ));
    }
}
