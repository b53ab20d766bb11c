//! Ownership and authentication checks for write mutations

use crate::domain::identity::AuthenticatedUser;
use crate::domain::models::Post;
use crate::error::{ServiceError, ServiceResult};

/// Verify user is authenticated and return the identity
pub fn require_authenticated(user: Option<&AuthenticatedUser>) -> ServiceResult<&AuthenticatedUser> {
    user.ok_or(ServiceError::Unauthenticated)
}

/// Only the post's author may modify or delete it
pub fn require_owner(post: &Post, user: &AuthenticatedUser) -> ServiceResult<()> {
    if post.author_id != user.user_id {
        return Err(ServiceError::Forbidden(format!(
            "user {} cannot modify post {} owned by {}",
            user.user_id, post.id, post.author_id
        )));
    }

    Ok(())
}
