use axum::Router;
use domain_geography::{GeographyService, PgGeographyRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgGeographyRepository::new(state.db.clone());
    let service = GeographyService::new(repository);
    handlers::router(service)
}
