/// Error types for social-core
use thiserror::Error;

/// PostgreSQL SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for CHECK constraint violations
const CHECK_VIOLATION: &str = "23514";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already liked")]
    AlreadyLiked,

    #[error("Not liked")]
    NotLiked,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Counter {counter} on {entity} would drop below zero")]
    CounterUnderflow {
        entity: &'static str,
        counter: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code, exposed to API clients
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Unauthenticated => "UNAUTHENTICATED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::AlreadyLiked => "ALREADY_LIKED",
            ServiceError::NotLiked => "NOT_LIKED",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::CounterUnderflow { .. } => "CONFLICT",
            ServiceError::Database(_) | ServiceError::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the message is safe to show to callers verbatim
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ServiceError::Database(_) | ServiceError::Internal(_))
    }

    /// Map a write failure to a typed error.
    ///
    /// A foreign key violation means the referenced row vanished while the
    /// transaction was running, so it surfaces as `NotFound` for `what`.
    pub fn from_write(err: sqlx::Error, what: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
            {
                ServiceError::NotFound(what.into())
            }
            _ => ServiceError::Database(err),
        }
    }

    pub(crate) fn is_check_violation(err: &sqlx::Error) -> bool {
        matches!(
            err,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(CHECK_VIOLATION)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        ServiceError::Validation(fields.join("; "))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ServiceError::NotFound("post".into()).code(), "NOT_FOUND");
        assert_eq!(ServiceError::Unauthenticated.code(), "UNAUTHENTICATED");
        assert_eq!(ServiceError::Forbidden("x".into()).code(), "FORBIDDEN");
        assert_eq!(ServiceError::AlreadyLiked.code(), "ALREADY_LIKED");
        assert_eq!(ServiceError::NotLiked.code(), "NOT_LIKED");
        assert_eq!(ServiceError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(
            ServiceError::CounterUnderflow {
                entity: "post",
                counter: "likes_count"
            }
            .code(),
            "CONFLICT"
        );
        assert_eq!(ServiceError::Internal("boom".into()).code(), "INTERNAL");
    }

    #[test]
    fn test_storage_errors_are_not_user_facing() {
        assert!(!ServiceError::Database(sqlx::Error::RowNotFound).is_user_facing());
        assert!(!ServiceError::Internal("boom".into()).is_user_facing());
        assert!(ServiceError::NotLiked.is_user_facing());
    }

    #[test]
    fn test_non_constraint_write_error_stays_database() {
        let err = ServiceError::from_write(sqlx::Error::PoolTimedOut, "post");
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
