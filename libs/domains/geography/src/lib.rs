//! Geography Domain
//!
//! Resolves a flat (country name, province name, locality id + name) request
//! into three linked rows inside one transaction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Country → Province → Locality resolution
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Transaction │  ← Commit-or-rollback guard
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Store contract (trait + Postgres / in-memory)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_geography::{
//!     handlers,
//!     repository::InMemoryGeographyRepository,
//!     service::GeographyService,
//! };
//!
//! let repository = InMemoryGeographyRepository::new();
//! let service = GeographyService::new(repository);
//!
//! let router = handlers::router(service);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod transaction;

pub use error::{GeographyError, GeographyResult};
pub use models::{
    Country, Locality, NewCountry, NewLocality, NewProvince, Province, RequestGeography,
    ResponseGeography,
};
pub use postgres::PgGeographyRepository;
pub use repository::{
    Executor, GeographyRepository, InMemoryGeographyRepository, InMemoryTransaction,
};
pub use service::GeographyService;
pub use transaction::TransactionGuard;
