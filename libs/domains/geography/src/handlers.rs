use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::GeographyResult;
use crate::models::{RequestGeography, ResponseGeography};
use crate::repository::GeographyRepository;
use crate::service::GeographyService;

pub const TAG: &str = "localities";

/// OpenAPI documentation for the geography API
#[derive(OpenApi)]
#[openapi(
    paths(create_locality, get_locality),
    components(
        schemas(RequestGeography, ResponseGeography),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Country, province and locality registration")
    )
)]
pub struct ApiDoc;

/// Create the geography router
pub fn router<R: GeographyRepository + 'static>(service: GeographyService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", post(create_locality))
        .route("/{id}", get(get_locality))
        .with_state(shared_service)
}

/// Register a locality, creating its country and province when missing
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = RequestGeography,
    responses(
        (status = 201, description = "Locality created", body = ResponseGeography),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_locality<R: GeographyRepository>(
    State(service): State<Arc<GeographyService<R>>>,
    ValidatedJson(input): ValidatedJson<RequestGeography>,
) -> GeographyResult<impl IntoResponse> {
    let created = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a locality with its province and country
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Locality id (postal code)")
    ),
    responses(
        (status = 200, description = "Locality found", body = ResponseGeography),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_locality<R: GeographyRepository>(
    State(service): State<Arc<GeographyService<R>>>,
    Path(id): Path<String>,
) -> GeographyResult<Json<ResponseGeography>> {
    let locality = service.get_locality(&id).await?;
    Ok(Json(locality))
}
