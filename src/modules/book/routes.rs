use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use erudio_http::error::AppError;
use erudio_http::hateoas::PagedModel;
use erudio_http::negotiate::{Accepts, Negotiated, Payload};
use erudio_http::paging::{PageParams, Pageable};

use super::models::BookDto;
use super::service::BookService;
use crate::error::ServiceError;

const ROOT: &str = "BookDTO";

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/v1", get(find_all).post(create).put(update))
        .route("/v1/{id}", get(find_by_id).delete(delete))
        .with_state(service)
}

async fn find_all(
    State(service): State<BookService>,
    Accepts(format): Accepts,
    Query(params): Query<PageParams>,
) -> Result<Negotiated<PagedModel<BookDto>>, AppError> {
    let pageable = Pageable::try_from(params).map_err(ServiceError::from)?;
    let page = service.find_all(pageable).await?;
    Ok(Negotiated::new(format, "PagedModel", page))
}

async fn find_by_id(
    State(service): State<BookService>,
    Accepts(format): Accepts,
    Path(id): Path<i64>,
) -> Result<Negotiated<BookDto>, AppError> {
    Ok(Negotiated::new(format, ROOT, service.find_by_id(id).await?))
}

async fn create(
    State(service): State<BookService>,
    Accepts(format): Accepts,
    Payload(book): Payload<BookDto>,
) -> Result<Negotiated<BookDto>, AppError> {
    Ok(Negotiated::new(format, ROOT, service.create(book).await?))
}

async fn update(
    State(service): State<BookService>,
    Accepts(format): Accepts,
    Payload(book): Payload<BookDto>,
) -> Result<Negotiated<BookDto>, AppError> {
    Ok(Negotiated::new(format, ROOT, service.update(book).await?))
}

async fn delete(
    State(service): State<BookService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
