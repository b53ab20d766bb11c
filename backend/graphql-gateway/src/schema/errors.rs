//! Mapping of domain failures onto GraphQL errors with a stable `code`
//! extension. Storage and internal failures are logged and replaced with
//! a generic message.

use async_graphql::{Error, ErrorExtensions, Result as GraphQLResult, ID};
use social_core::ServiceError;
use tracing::error;
use uuid::Uuid;

use crate::identity::IdentityError;

const GENERIC_MESSAGE: &str = "Internal server error";

fn coded(message: impl Into<String>, code: &'static str) -> Error {
    Error::new(message).extend_with(|_, ext| ext.set("code", code))
}

/// Wrapper so domain errors can carry GraphQL extensions
pub struct GraphQLServiceError<'a>(pub &'a ServiceError);

impl ErrorExtensions for GraphQLServiceError<'_> {
    fn extend(&self) -> Error {
        let err = self.0;
        if err.is_user_facing() {
            coded(err.to_string(), err.code())
        } else {
            error!(error = %err, "request failed");
            coded(GENERIC_MESSAGE, err.code())
        }
    }
}

impl ErrorExtensions for IdentityError {
    fn extend(&self) -> Error {
        if self.is_user_facing() {
            coded(self.to_string(), self.code())
        } else {
            error!(error = %self, "identity service call failed");
            coded(GENERIC_MESSAGE, self.code())
        }
    }
}

pub fn service_error(err: &ServiceError) -> Error {
    GraphQLServiceError(err).extend()
}

pub trait IntoGraphQLResult<T> {
    fn into_gql(self) -> GraphQLResult<T>;
}

impl<T> IntoGraphQLResult<T> for Result<T, ServiceError> {
    fn into_gql(self) -> GraphQLResult<T> {
        self.map_err(|e| service_error(&e))
    }
}

impl<T> IntoGraphQLResult<T> for Result<T, IdentityError> {
    fn into_gql(self) -> GraphQLResult<T> {
        self.map_err(|e| e.extend())
    }
}

pub fn unauthenticated(message: impl Into<String>) -> Error {
    coded(message, "UNAUTHENTICATED")
}

/// Parse a GraphQL `ID` argument as a UUID
pub fn parse_id(id: &ID, field: &str) -> GraphQLResult<Uuid> {
    Uuid::parse_str(id.as_str())
        .map_err(|_| coded(format!("{} is not a valid id", field), "VALIDATION_ERROR"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    fn code_of(err: &Error) -> Option<Value> {
        err.extensions.as_ref().and_then(|ext| ext.get("code").cloned())
    }

    #[test]
    fn test_user_facing_error_keeps_message() {
        let err = service_error(&ServiceError::NotLiked);
        assert_eq!(err.message, "Not liked");
        assert_eq!(code_of(&err), Some(Value::from("NOT_LIKED")));
    }

    #[test]
    fn test_database_error_is_masked() {
        let err = service_error(&ServiceError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.message, GENERIC_MESSAGE);
        assert_eq!(code_of(&err), Some(Value::from("INTERNAL")));
    }

    #[test]
    fn test_invalid_credentials_code() {
        let err: GraphQLResult<()> = Err(IdentityError::InvalidCredentials).into_gql();
        let err = err.unwrap_err();
        assert_eq!(code_of(&err), Some(Value::from("UNAUTHENTICATED")));
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id(&ID::from("not-a-uuid"), "postId").unwrap_err();
        assert_eq!(code_of(&err), Some(Value::from("VALIDATION_ERROR")));

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&ID::from(id.to_string()), "postId").unwrap(), id);
    }
}
