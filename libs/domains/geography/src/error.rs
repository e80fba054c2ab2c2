use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Semantic error codes surfaced by the geography store and resolver.
///
/// `NotFound` coming out of a lookup is a branch signal for find-or-create and
/// never escapes `GeographyService::create` on a correct run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeographyError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Returned by a store when a commit or rollback targets a transaction
    /// that was already finalized.
    #[error("Transaction already finalized")]
    TransactionFinalized,
}

pub type GeographyResult<T> = Result<T, GeographyError>;

impl GeographyError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// The message without the code prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Validation(msg)
            | Self::Internal(msg) => msg,
            Self::TransactionFinalized => "transaction already finalized",
        }
    }
}

impl From<GeographyError> for AppError {
    fn from(err: GeographyError) -> Self {
        match err {
            GeographyError::NotFound(msg) => AppError::NotFound(msg),
            GeographyError::Conflict(msg) => AppError::Conflict(msg),
            GeographyError::Validation(msg) => AppError::BadRequest(msg),
            GeographyError::Internal(msg) => AppError::InternalServerError(msg),
            GeographyError::TransactionFinalized => {
                AppError::InternalServerError("transaction already finalized".to_string())
            }
        }
    }
}

impl IntoResponse for GeographyError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_message_strips_code_prefix() {
        let err = GeographyError::conflict("locality already exists");
        assert_eq!(err.message(), "locality already exists");
        assert_eq!(err.to_string(), "Conflict: locality already exists");
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (GeographyError::not_found("locality 1 not found"), StatusCode::NOT_FOUND),
            (GeographyError::conflict("locality already exists"), StatusCode::CONFLICT),
            (GeographyError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (
                GeographyError::internal("failed to commit transaction"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (GeographyError::TransactionFinalized, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
