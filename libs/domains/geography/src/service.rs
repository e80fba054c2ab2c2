use std::future::Future;
use std::sync::Arc;

use crate::error::{GeographyError, GeographyResult};
use crate::models::{
    Country, Locality, NewCountry, NewLocality, NewProvince, Province, RequestGeography,
    ResolvedGeography, ResponseGeography,
};
use crate::repository::{Executor, GeographyRepository};
use crate::transaction::TransactionGuard;

/// What to do when the lookup half of find-or-create finds a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExisting {
    /// Return the found row unchanged
    Reuse,
    /// Fail with `Conflict(message)`
    Reject(&'static str),
}

/// Runs `find`; on `NotFound` runs `create`. Any other lookup error is
/// returned unchanged.
pub async fn resolve_or_create<T, Find, Create, CreateFut>(
    find: Find,
    on_existing: OnExisting,
    create: Create,
) -> GeographyResult<T>
where
    Find: Future<Output = GeographyResult<T>>,
    Create: FnOnce() -> CreateFut,
    CreateFut: Future<Output = GeographyResult<T>>,
{
    match find.await {
        Ok(found) => match on_existing {
            OnExisting::Reuse => Ok(found),
            OnExisting::Reject(message) => Err(GeographyError::conflict(message)),
        },
        Err(err) if err.is_not_found() => create().await,
        Err(err) => Err(err),
    }
}

/// Resolves geography requests into linked country, province and locality rows
#[derive(Clone)]
pub struct GeographyService<R: GeographyRepository> {
    repository: Arc<R>,
}

impl<R: GeographyRepository> GeographyService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Find-or-create the country, then the province under it, then create the
    /// locality, all inside one transaction. Any failure rolls the whole
    /// transaction back and returns the first error unchanged.
    #[tracing::instrument(skip(self, request), fields(locality_id = %request.id))]
    pub async fn create(&self, request: RequestGeography) -> GeographyResult<ResponseGeography> {
        let guard = TransactionGuard::begin(self.repository.as_ref()).await?;

        let outcome = self.resolve(guard.executor(), &request).await;
        match outcome {
            Ok(resolved) => {
                guard.commit().await?;
                tracing::info!(
                    country_id = resolved.country.id,
                    province_id = resolved.province.id,
                    "Resolved geography"
                );
                Ok(resolved.into())
            }
            Err(err) => {
                guard.rollback().await;
                tracing::info!(error = %err, "Geography resolution rolled back");
                Err(err)
            }
        }
    }

    async fn resolve(
        &self,
        tx: Executor<'_, R::Tx>,
        request: &RequestGeography,
    ) -> GeographyResult<ResolvedGeography> {
        let country = self.resolve_country(tx, &request.country_name).await?;
        let province = self
            .resolve_province(tx, &request.province_name, country.id)
            .await?;
        let locality = self
            .resolve_locality(tx, &request.id, &request.locality_name, province.id)
            .await?;

        Ok(ResolvedGeography {
            country,
            province,
            locality,
        })
    }

    pub async fn resolve_country(
        &self,
        tx: Executor<'_, R::Tx>,
        name: &str,
    ) -> GeographyResult<Country> {
        resolve_or_create(
            self.repository.find_country_by_name(tx, name),
            OnExisting::Reuse,
            || {
                self.repository.create_country(
                    tx,
                    NewCountry {
                        name: name.to_string(),
                    },
                )
            },
        )
        .await
    }

    pub async fn resolve_province(
        &self,
        tx: Executor<'_, R::Tx>,
        name: &str,
        country_id: i32,
    ) -> GeographyResult<Province> {
        resolve_or_create(
            self.repository.find_province_by_name(tx, name, country_id),
            OnExisting::Reuse,
            || {
                self.repository.create_province(
                    tx,
                    NewProvince {
                        name: name.to_string(),
                        country_id,
                    },
                )
            },
        )
        .await
    }

    /// Localities are never reused: an existing id is a conflict.
    pub async fn resolve_locality(
        &self,
        tx: Executor<'_, R::Tx>,
        id: &str,
        name: &str,
        province_id: i32,
    ) -> GeographyResult<Locality> {
        resolve_or_create(
            self.repository.find_locality_by_id(tx, id),
            OnExisting::Reject("locality already exists"),
            || {
                self.repository.create_locality(
                    tx,
                    NewLocality {
                        id: id.to_string(),
                        name: name.to_string(),
                        province_id,
                    },
                )
            },
        )
        .await
    }

    /// Reads a locality with its province and country names.
    #[tracing::instrument(skip(self))]
    pub async fn get_locality(&self, id: &str) -> GeographyResult<ResponseGeography> {
        let locality = self
            .repository
            .find_locality_by_id(Executor::Direct, id)
            .await?;
        let province = self
            .repository
            .find_province_by_id(Executor::Direct, locality.province_id)
            .await?;
        let country = self
            .repository
            .find_country_by_id(Executor::Direct, province.country_id)
            .await?;

        Ok(ResolvedGeography {
            country,
            province,
            locality,
        }
        .into())
    }
}
