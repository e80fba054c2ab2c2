//! Scoped ownership of one store transaction.
//!
//! A [`TransactionGuard`] is finalized at most once: `commit` and `rollback`
//! both consume it. A guard that is dropped without either (for example when
//! the request future is cancelled) drops the underlying transaction, which
//! every [`GeographyRepository`] implementation treats as a rollback.

use crate::error::{GeographyError, GeographyResult};
use crate::repository::{Executor, GeographyRepository};

pub struct TransactionGuard<'r, R: GeographyRepository> {
    repository: &'r R,
    tx: R::Tx,
}

impl<'r, R: GeographyRepository> TransactionGuard<'r, R> {
    /// Opens a transaction. Any store failure is reported as
    /// `Internal("failed to start transaction")`.
    pub async fn begin(repository: &'r R) -> GeographyResult<Self> {
        let tx = repository.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to start transaction");
            GeographyError::internal("failed to start transaction")
        })?;

        Ok(Self { repository, tx })
    }

    pub fn executor(&self) -> Executor<'_, R::Tx> {
        Executor::Transaction(&self.tx)
    }

    /// Commits the transaction. A failed commit is reported as
    /// `Internal("failed to commit transaction")` and is not followed by a
    /// rollback: the transaction has already been handed to the store.
    pub async fn commit(self) -> GeographyResult<()> {
        self.repository.commit(self.tx).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit transaction");
            GeographyError::internal("failed to commit transaction")
        })
    }

    /// Best-effort rollback. Failures are logged and swallowed so they never
    /// mask the error that caused the rollback.
    pub async fn rollback(self) {
        match self.repository.rollback(self.tx).await {
            Ok(()) => tracing::debug!("Transaction rolled back"),
            Err(GeographyError::TransactionFinalized) => {
                tracing::debug!("Rollback skipped, transaction already finalized")
            }
            Err(e) => tracing::warn!(error = %e, "Failed to roll back transaction"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCountry;
    use crate::repository::InMemoryGeographyRepository;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_commit_persists_writes() {
        let repo = InMemoryGeographyRepository::new();
        let guard = TransactionGuard::begin(&repo).await.unwrap();

        repo.create_country(
            guard.executor(),
            NewCountry {
                name: "Argentina".to_string(),
            },
        )
        .await
        .unwrap();
        guard.commit().await.unwrap();

        assert_eq!(repo.country_count().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let repo = InMemoryGeographyRepository::new();
        let guard = TransactionGuard::begin(&repo).await.unwrap();

        repo.create_country(
            guard.executor(),
            NewCountry {
                name: "Argentina".to_string(),
            },
        )
        .await
        .unwrap();
        guard.rollback().await;

        assert_eq!(repo.country_count().await, 0);
    }

    #[tokio::test]
    async fn test_rollback_tolerates_finalized_transaction() {
        let repo = InMemoryGeographyRepository::new();
        let guard = TransactionGuard::begin(&repo).await.unwrap();
        guard.tx.finalized_flag().store(true, Ordering::SeqCst);

        // Must not panic or surface an error
        guard.rollback().await;
    }

    #[tokio::test]
    async fn test_commit_on_finalized_transaction_is_internal() {
        let repo = InMemoryGeographyRepository::new();
        let guard = TransactionGuard::begin(&repo).await.unwrap();
        guard.tx.finalized_flag().store(true, Ordering::SeqCst);

        let result = guard.commit().await;
        assert_eq!(
            result,
            Err(GeographyError::internal("failed to commit transaction"))
        );
    }
}
