use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, FromQueryResult,
    SqlErr, Statement, TransactionTrait, Value,
};

use crate::{
    error::{GeographyError, GeographyResult},
    models::{Country, Locality, NewCountry, NewLocality, NewProvince, Province},
    repository::{Executor, GeographyRepository},
};

/// Runs `$body` with `$conn` bound to the pool or to the open transaction.
macro_rules! on_executor {
    ($self:ident, $executor:expr, |$conn:ident| $body:expr) => {
        match $executor {
            Executor::Direct => {
                let $conn = &$self.db;
                $body
            }
            Executor::Transaction(tx) => {
                let $conn = tx;
                $body
            }
        }
    };
}

#[derive(Debug, FromQueryResult)]
struct CountryRow {
    id: i32,
    name: String,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ProvinceRow {
    id: i32,
    name: String,
    country_id: i32,
}

impl From<ProvinceRow> for Province {
    fn from(row: ProvinceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            country_id: row.country_id,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct LocalityRow {
    id: String,
    name: String,
    province_id: i32,
}

impl From<LocalityRow> for Locality {
    fn from(row: LocalityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            province_id: row.province_id,
        }
    }
}

fn statement<I>(sql: &str, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

fn query_error(e: DbErr) -> GeographyError {
    GeographyError::internal(format!("Database error: {}", e))
}

/// Maps an insert failure, classifying unique violations as conflicts.
fn insert_error(e: DbErr, conflict: impl FnOnce() -> String) -> GeographyError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => GeographyError::conflict(conflict()),
        _ => query_error(e),
    }
}

async fn fetch_one<T, C>(conn: &C, stmt: Statement) -> GeographyResult<Option<T>>
where
    T: FromQueryResult,
    C: ConnectionTrait,
{
    T::find_by_statement(stmt).one(conn).await.map_err(query_error)
}

/// PostgreSQL implementation of GeographyRepository
#[derive(Clone)]
pub struct PgGeographyRepository {
    db: DatabaseConnection,
}

impl PgGeographyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GeographyRepository for PgGeographyRepository {
    type Tx = DatabaseTransaction;

    async fn begin(&self) -> GeographyResult<DatabaseTransaction> {
        self.db.begin().await.map_err(query_error)
    }

    async fn commit(&self, tx: DatabaseTransaction) -> GeographyResult<()> {
        tx.commit().await.map_err(query_error)
    }

    async fn rollback(&self, tx: DatabaseTransaction) -> GeographyResult<()> {
        // `rollback` consumes the handle, so a finalized transaction cannot reach here
        tx.rollback().await.map_err(query_error)
    }

    async fn find_country_by_name<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        name: &str,
    ) -> GeographyResult<Country> {
        let stmt = statement(
            "SELECT id, name FROM countries WHERE LOWER(name) = LOWER($1)",
            [name.into()],
        );

        on_executor!(self, executor, |conn| fetch_one::<CountryRow, _>(conn, stmt).await)?
            .map(Country::from)
            .ok_or_else(|| GeographyError::not_found(format!("country '{}' not found", name)))
    }

    async fn find_country_by_id<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        id: i32,
    ) -> GeographyResult<Country> {
        let stmt = statement("SELECT id, name FROM countries WHERE id = $1", [id.into()]);

        on_executor!(self, executor, |conn| fetch_one::<CountryRow, _>(conn, stmt).await)?
            .map(Country::from)
            .ok_or_else(|| GeographyError::not_found(format!("country {} not found", id)))
    }

    async fn create_country<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        input: NewCountry,
    ) -> GeographyResult<Country> {
        let stmt = statement(
            "INSERT INTO countries (name) VALUES ($1) RETURNING id, name",
            [input.name.clone().into()],
        );

        let row = on_executor!(self, executor, |conn| {
            CountryRow::find_by_statement(stmt).one(conn).await
        })
        .map_err(|e| insert_error(e, || format!("country '{}' already exists", input.name)))?
        .ok_or_else(|| GeographyError::internal("Failed to create country"))?;

        tracing::info!(country_id = row.id, "Created country");
        Ok(row.into())
    }

    async fn find_province_by_name<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        name: &str,
        country_id: i32,
    ) -> GeographyResult<Province> {
        let stmt = statement(
            r#"
            SELECT id, name, country_id FROM provinces
            WHERE LOWER(name) = LOWER($1) AND country_id = $2
            "#,
            [name.into(), country_id.into()],
        );

        on_executor!(self, executor, |conn| fetch_one::<ProvinceRow, _>(conn, stmt).await)?
            .map(Province::from)
            .ok_or_else(|| GeographyError::not_found(format!("province '{}' not found", name)))
    }

    async fn find_province_by_id<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        id: i32,
    ) -> GeographyResult<Province> {
        let stmt = statement(
            "SELECT id, name, country_id FROM provinces WHERE id = $1",
            [id.into()],
        );

        on_executor!(self, executor, |conn| fetch_one::<ProvinceRow, _>(conn, stmt).await)?
            .map(Province::from)
            .ok_or_else(|| GeographyError::not_found(format!("province {} not found", id)))
    }

    async fn create_province<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        input: NewProvince,
    ) -> GeographyResult<Province> {
        let stmt = statement(
            r#"
            INSERT INTO provinces (name, country_id) VALUES ($1, $2)
            RETURNING id, name, country_id
            "#,
            [input.name.clone().into(), input.country_id.into()],
        );

        let row = on_executor!(self, executor, |conn| {
            ProvinceRow::find_by_statement(stmt).one(conn).await
        })
        .map_err(|e| insert_error(e, || format!("province '{}' already exists", input.name)))?
        .ok_or_else(|| GeographyError::internal("Failed to create province"))?;

        tracing::info!(province_id = row.id, "Created province");
        Ok(row.into())
    }

    async fn find_locality_by_id<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        id: &str,
    ) -> GeographyResult<Locality> {
        let stmt = statement(
            "SELECT id, name, province_id FROM localities WHERE id = $1",
            [id.into()],
        );

        on_executor!(self, executor, |conn| fetch_one::<LocalityRow, _>(conn, stmt).await)?
            .map(Locality::from)
            .ok_or_else(|| GeographyError::not_found(format!("locality {} not found", id)))
    }

    async fn create_locality<'e>(
        &self,
        executor: Executor<'e, DatabaseTransaction>,
        input: NewLocality,
    ) -> GeographyResult<Locality> {
        let stmt = statement(
            r#"
            INSERT INTO localities (id, name, province_id) VALUES ($1, $2, $3)
            RETURNING id, name, province_id
            "#,
            [
                input.id.into(),
                input.name.into(),
                input.province_id.into(),
            ],
        );

        let row = on_executor!(self, executor, |conn| {
            LocalityRow::find_by_statement(stmt).one(conn).await
        })
        .map_err(|e| insert_error(e, || "locality already exists".to_string()))?
        .ok_or_else(|| GeographyError::internal("Failed to create locality"))?;

        tracing::info!(locality_id = %row.id, "Created locality");
        Ok(row.into())
    }
}
