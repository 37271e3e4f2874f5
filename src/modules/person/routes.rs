use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use erudio_http::error::AppError;
use erudio_http::hateoas::PagedModel;
use erudio_http::negotiate::{Accepts, Negotiated, Payload};
use erudio_http::paging::{PageParams, Pageable};

use super::models::{PersonDto, PersonDtoV2};
use super::service::{PersonService, Upload};
use crate::codec::APPLICATION_OCTET_STREAM;
use crate::error::ServiceError;

const ROOT: &str = "PersonDTO";
const PAGE_ROOT: &str = "PagedModel";

pub fn router(service: PersonService) -> Router {
    Router::new()
        .route("/v1", get(find_all).post(create).put(update))
        .route("/v1/v2", post(create_v2))
        .route("/v1/massCreation", post(mass_creation))
        .route("/v1/exportPage", get(export_page))
        .route("/v1/findPeopleByName/{first_name}", get(find_by_name))
        .route("/v1/{id}", get(find_by_id).patch(disable).delete(delete))
        .with_state(service)
}

fn pageable(params: PageParams) -> Result<Pageable, AppError> {
    Ok(Pageable::try_from(params).map_err(ServiceError::from)?)
}

async fn find_all(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Query(params): Query<PageParams>,
) -> Result<Negotiated<PagedModel<PersonDto>>, AppError> {
    let page = service.find_all(pageable(params)?).await?;
    Ok(Negotiated::new(format, PAGE_ROOT, page))
}

async fn find_by_name(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Path(first_name): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Negotiated<PagedModel<PersonDto>>, AppError> {
    let page = service.find_by_name(&first_name, pageable(params)?).await?;
    Ok(Negotiated::new(format, PAGE_ROOT, page))
}

async fn find_by_id(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Path(id): Path<i64>,
) -> Result<Negotiated<PersonDto>, AppError> {
    let person = service.find_by_id(id).await?;
    Ok(Negotiated::new(format, ROOT, person))
}

async fn export_page(
    State(service): State<PersonService>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());

    let file = service.export_page(pageable(params)?, accept).await?;

    let content_type = if file.content_type.is_empty() {
        APPLICATION_OCTET_STREAM
    } else {
        file.content_type
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

async fn create(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Payload(person): Payload<PersonDto>,
) -> Result<Negotiated<PersonDto>, AppError> {
    let created = service.create(person).await?;
    Ok(Negotiated::new(format, ROOT, created))
}

async fn create_v2(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Payload(person): Payload<PersonDtoV2>,
) -> Result<Negotiated<PersonDtoV2>, AppError> {
    let created = service.create_v2(person).await?;
    Ok(Negotiated::new(format, "PersonDTOV2", created))
}

async fn mass_creation(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    mut multipart: Multipart,
) -> Result<Negotiated<Vec<PersonDto>>, AppError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        upload.file_name = field.file_name().map(str::to_string);
        upload.bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?
            .to_vec();
        break;
    }

    let created = service.mass_creation(upload).await?;
    Ok(Negotiated::new(format, ROOT, created))
}

async fn update(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Payload(person): Payload<PersonDto>,
) -> Result<Negotiated<PersonDto>, AppError> {
    let updated = service.update(person).await?;
    Ok(Negotiated::new(format, ROOT, updated))
}

async fn disable(
    State(service): State<PersonService>,
    Accepts(format): Accepts,
    Path(id): Path<i64>,
) -> Result<Negotiated<PersonDto>, AppError> {
    let person = service.disable(id).await?;
    Ok(Negotiated::new(format, ROOT, person))
}

async fn delete(
    State(service): State<PersonService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
