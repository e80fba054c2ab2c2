use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Geo API",
        version = "0.1.0",
        description = "Registers localities together with their province and country"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/localities", api = domain_geography::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
