use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, RwLock};

use crate::error::{GeographyError, GeographyResult};
use crate::models::{Country, Locality, NewCountry, NewLocality, NewProvince, Province};

/// Where a store operation runs: directly against the store or inside an
/// open transaction.
pub enum Executor<'a, T> {
    Direct,
    Transaction(&'a T),
}

impl<T> Executor<'_, T> {
    pub fn is_transaction(&self) -> bool {
        matches!(self, Executor::Transaction(_))
    }
}

impl<T> Clone for Executor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Executor<'_, T> {}

impl<T> std::fmt::Debug for Executor<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Executor::Direct => f.write_str("Direct"),
            Executor::Transaction(_) => f.write_str("Transaction"),
        }
    }
}

/// Store contract for the geography hierarchy.
///
/// Lookups report a missing row as `GeographyError::NotFound`. Creates must
/// report a uniqueness violation as `GeographyError::Conflict`, including the
/// case where a concurrent transaction inserted the same key first.
#[cfg_attr(test, mockall::automock(type Tx = ();))]
#[async_trait]
pub trait GeographyRepository: Send + Sync {
    type Tx: Send + Sync;

    async fn begin(&self) -> GeographyResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> GeographyResult<()>;

    /// Returns `GeographyError::TransactionFinalized` when the transaction
    /// was already committed or rolled back.
    async fn rollback(&self, tx: Self::Tx) -> GeographyResult<()>;

    async fn find_country_by_name<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        name: &str,
    ) -> GeographyResult<Country>;

    async fn find_country_by_id<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        id: i32,
    ) -> GeographyResult<Country>;

    async fn create_country<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        input: NewCountry,
    ) -> GeographyResult<Country>;

    async fn find_province_by_name<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        name: &str,
        country_id: i32,
    ) -> GeographyResult<Province>;

    async fn find_province_by_id<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        id: i32,
    ) -> GeographyResult<Province>;

    async fn create_province<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        input: NewProvince,
    ) -> GeographyResult<Province>;

    async fn find_locality_by_id<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        id: &str,
    ) -> GeographyResult<Locality>;

    async fn create_locality<'e>(
        &self,
        executor: Executor<'e, Self::Tx>,
        input: NewLocality,
    ) -> GeographyResult<Locality>;
}

#[derive(Debug, Default, Clone)]
struct GeographyTables {
    countries: HashMap<i32, Country>,
    provinces: HashMap<i32, Province>,
    localities: HashMap<String, Locality>,
}

impl GeographyTables {
    fn country_by_name(&self, name: &str) -> Option<&Country> {
        self.countries
            .values()
            .find(|c| c.name.to_lowercase() == name.to_lowercase())
    }

    fn province_by_name(&self, name: &str, country_id: i32) -> Option<&Province> {
        self.provinces.values().find(|p| {
            p.country_id == country_id && p.name.to_lowercase() == name.to_lowercase()
        })
    }

    fn holds(&self, key: &UniqueKey) -> bool {
        match key {
            UniqueKey::Country(name) => self.country_by_name(name).is_some(),
            UniqueKey::Province(name, country_id) => {
                self.province_by_name(name, *country_id).is_some()
            }
            UniqueKey::Locality(id) => self.localities.contains_key(id),
        }
    }

    /// Foreign key and unique checks for `row`, without inserting it.
    fn check(&self, row: &StagedRow) -> GeographyResult<()> {
        match row {
            StagedRow::Province(p) if !self.countries.contains_key(&p.country_id) => {
                return Err(GeographyError::internal(format!(
                    "country {} does not exist",
                    p.country_id
                )));
            }
            StagedRow::Locality(l) if !self.provinces.contains_key(&l.province_id) => {
                return Err(GeographyError::internal(format!(
                    "province {} does not exist",
                    l.province_id
                )));
            }
            _ => {}
        }
        if self.holds(&row.unique_key()) {
            return Err(row.conflict());
        }
        Ok(())
    }

    fn insert(&mut self, row: StagedRow) {
        match row {
            StagedRow::Country(c) => {
                self.countries.insert(c.id, c);
            }
            StagedRow::Province(p) => {
                self.provinces.insert(p.id, p);
            }
            StagedRow::Locality(l) => {
                self.localities.insert(l.id.clone(), l);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum StagedRow {
    Country(Country),
    Province(Province),
    Locality(Locality),
}

impl StagedRow {
    fn unique_key(&self) -> UniqueKey {
        match self {
            StagedRow::Country(c) => UniqueKey::Country(c.name.to_lowercase()),
            StagedRow::Province(p) => UniqueKey::Province(p.name.to_lowercase(), p.country_id),
            StagedRow::Locality(l) => UniqueKey::Locality(l.id.clone()),
        }
    }

    fn conflict(&self) -> GeographyError {
        match self {
            StagedRow::Country(c) => {
                GeographyError::conflict(format!("country '{}' already exists", c.name))
            }
            StagedRow::Province(p) => {
                GeographyError::conflict(format!("province '{}' already exists", p.name))
            }
            StagedRow::Locality(_) => GeographyError::conflict("locality already exists"),
        }
    }
}

/// Mirrors the unique indexes of the SQL schema (names compared lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum UniqueKey {
    Country(String),
    Province(String, i32),
    Locality(String),
}

/// Unique keys written by open transactions, keyed to the owning transaction.
/// A second writer on a held key fails at insert time, the way a unique
/// index does once the first insert is visible to it.
type Claims = Arc<StdMutex<HashMap<UniqueKey, u64>>>;

fn lock_claims(claims: &Claims) -> MutexGuard<'_, HashMap<UniqueKey, u64>> {
    claims.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transaction handle for [`InMemoryGeographyRepository`].
///
/// Writes are staged against a private view of the tables and only become
/// visible to other callers on commit. Dropping the handle discards them and
/// releases its unique keys.
#[derive(Debug)]
pub struct InMemoryTransaction {
    id: u64,
    view: Mutex<GeographyTables>,
    staged: Mutex<Vec<StagedRow>>,
    claims: Claims,
    finalized: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    #[cfg(test)]
    pub(crate) fn finalized_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.finalized)
    }

    fn ensure_open(&self) -> GeographyResult<()> {
        if self.finalized.load(Ordering::SeqCst) {
            return Err(GeographyError::TransactionFinalized);
        }
        Ok(())
    }

    fn claim(&self, row: &StagedRow) -> GeographyResult<()> {
        let key = row.unique_key();
        let mut claims = lock_claims(&self.claims);
        if claims.get(&key).is_some_and(|owner| *owner != self.id) {
            return Err(row.conflict());
        }
        claims.insert(key, self.id);
        Ok(())
    }

    fn release_claims(&self) {
        lock_claims(&self.claims).retain(|_, owner| *owner != self.id);
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        self.release_claims();
    }
}

/// In-memory implementation of GeographyRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryGeographyRepository {
    tables: Arc<RwLock<GeographyTables>>,
    claims: Claims,
    tx_seq: Arc<AtomicU64>,
    country_seq: Arc<AtomicI32>,
    province_seq: Arc<AtomicI32>,
}

impl Default for InMemoryGeographyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGeographyRepository {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(GeographyTables::default())),
            claims: Arc::new(StdMutex::new(HashMap::new())),
            tx_seq: Arc::new(AtomicU64::new(1)),
            country_seq: Arc::new(AtomicI32::new(1)),
            province_seq: Arc::new(AtomicI32::new(1)),
        }
    }

    pub async fn country_count(&self) -> usize {
        self.tables.read().await.countries.len()
    }

    pub async fn province_count(&self) -> usize {
        self.tables.read().await.provinces.len()
    }

    pub async fn locality_count(&self) -> usize {
        self.tables.read().await.localities.len()
    }

    async fn snapshot<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
    ) -> GeographyResult<GeographyTables> {
        match executor {
            Executor::Direct => Ok(self.tables.read().await.clone()),
            Executor::Transaction(tx) => {
                tx.ensure_open()?;
                Ok(tx.view.lock().await.clone())
            }
        }
    }

    /// Validates and writes a row either straight into the shared tables or
    /// into the transaction's staged view. Keys committed or held by another
    /// open transaction are a conflict.
    async fn write<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        row: StagedRow,
    ) -> GeographyResult<()> {
        match executor {
            Executor::Direct => {
                let mut tables = self.tables.write().await;
                tables.check(&row)?;
                if lock_claims(&self.claims).contains_key(&row.unique_key()) {
                    return Err(row.conflict());
                }
                tables.insert(row);
                Ok(())
            }
            Executor::Transaction(tx) => {
                tx.ensure_open()?;
                let mut view = tx.view.lock().await;
                view.check(&row)?;
                {
                    let committed = self.tables.read().await;
                    if committed.holds(&row.unique_key()) {
                        return Err(row.conflict());
                    }
                    tx.claim(&row)?;
                }
                view.insert(row.clone());
                tx.staged.lock().await.push(row);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl GeographyRepository for InMemoryGeographyRepository {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> GeographyResult<InMemoryTransaction> {
        let view = self.tables.read().await.clone();
        Ok(InMemoryTransaction {
            id: self.tx_seq.fetch_add(1, Ordering::SeqCst),
            view: Mutex::new(view),
            staged: Mutex::new(Vec::new()),
            claims: Arc::clone(&self.claims),
            finalized: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn commit(&self, mut tx: InMemoryTransaction) -> GeographyResult<()> {
        if tx.finalized.swap(true, Ordering::SeqCst) {
            return Err(GeographyError::TransactionFinalized);
        }

        let staged = std::mem::take(tx.staged.get_mut());
        let mut tables = self.tables.write().await;

        // All or nothing
        let mut merged = tables.clone();
        for row in staged {
            merged.check(&row)?;
            merged.insert(row);
        }
        *tables = merged;
        tx.release_claims();
        Ok(())
    }

    async fn rollback(&self, tx: InMemoryTransaction) -> GeographyResult<()> {
        if tx.finalized.swap(true, Ordering::SeqCst) {
            return Err(GeographyError::TransactionFinalized);
        }
        Ok(())
    }

    async fn find_country_by_name<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        name: &str,
    ) -> GeographyResult<Country> {
        self.snapshot(executor)
            .await?
            .country_by_name(name)
            .cloned()
            .ok_or_else(|| GeographyError::not_found(format!("country '{}' not found", name)))
    }

    async fn find_country_by_id<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        id: i32,
    ) -> GeographyResult<Country> {
        self.snapshot(executor)
            .await?
            .countries
            .get(&id)
            .cloned()
            .ok_or_else(|| GeographyError::not_found(format!("country {} not found", id)))
    }

    async fn create_country<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        input: NewCountry,
    ) -> GeographyResult<Country> {
        let country = Country {
            id: self.country_seq.fetch_add(1, Ordering::SeqCst),
            name: input.name,
        };
        self.write(executor, StagedRow::Country(country.clone())).await?;

        tracing::debug!(country_id = country.id, "Created country");
        Ok(country)
    }

    async fn find_province_by_name<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        name: &str,
        country_id: i32,
    ) -> GeographyResult<Province> {
        self.snapshot(executor)
            .await?
            .province_by_name(name, country_id)
            .cloned()
            .ok_or_else(|| GeographyError::not_found(format!("province '{}' not found", name)))
    }

    async fn find_province_by_id<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        id: i32,
    ) -> GeographyResult<Province> {
        self.snapshot(executor)
            .await?
            .provinces
            .get(&id)
            .cloned()
            .ok_or_else(|| GeographyError::not_found(format!("province {} not found", id)))
    }

    async fn create_province<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        input: NewProvince,
    ) -> GeographyResult<Province> {
        let province = Province {
            id: self.province_seq.fetch_add(1, Ordering::SeqCst),
            name: input.name,
            country_id: input.country_id,
        };
        self.write(executor, StagedRow::Province(province.clone())).await?;

        tracing::debug!(province_id = province.id, "Created province");
        Ok(province)
    }

    async fn find_locality_by_id<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        id: &str,
    ) -> GeographyResult<Locality> {
        self.snapshot(executor)
            .await?
            .localities
            .get(id)
            .cloned()
            .ok_or_else(|| GeographyError::not_found(format!("locality {} not found", id)))
    }

    async fn create_locality<'e>(
        &self,
        executor: Executor<'e, InMemoryTransaction>,
        input: NewLocality,
    ) -> GeographyResult<Locality> {
        let locality = Locality {
            id: input.id,
            name: input.name,
            province_id: input.province_id,
        };
        self.write(executor, StagedRow::Locality(locality.clone())).await?;

        tracing::debug!(locality_id = %locality.id, "Created locality");
        Ok(locality)
    }
}
