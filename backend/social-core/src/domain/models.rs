use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Upper bound for post and comment bodies, in characters
pub const MAX_CONTENT_LENGTH: u64 = 10_000;

/// User entity - identity plus denormalized social counters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post entity - owned by exactly one author
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment entity - represents a comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Share entity - append-only record of a user sharing a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Share {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub shared_at: DateTime<Utc>,
}

/// Registration payload for a new user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
}

/// Body of a post or comment as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContentInput {
    #[validate(
        length(max = 10000, message = "content is too long"),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
}

impl ContentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("content must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Stored counters next to the live child-row counts for one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostCounterAudit {
    pub post_id: Uuid,
    pub likes_count: i64,
    pub live_likes: i64,
    pub comments_count: i64,
    pub live_comments: i64,
    pub shares_count: i64,
    pub live_shares: i64,
}

impl PostCounterAudit {
    pub fn is_consistent(&self) -> bool {
        self.likes_count == self.live_likes
            && self.comments_count == self.live_comments
            && self.shares_count == self.live_shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_content_rejected() {
        assert!(ContentInput::new("").validate().is_err());
        assert!(ContentInput::new("   \n\t").validate().is_err());
    }

    #[test]
    fn test_regular_content_accepted() {
        assert!(ContentInput::new("hello world").validate().is_ok());
    }

    #[test]
    fn test_oversized_content_rejected() {
        let body = "a".repeat(MAX_CONTENT_LENGTH as usize + 1);
        assert!(ContentInput::new(body).validate().is_err());

        let body = "a".repeat(MAX_CONTENT_LENGTH as usize);
        assert!(ContentInput::new(body).validate().is_ok());
    }

    #[test]
    fn test_new_user_requires_valid_email() {
        let user = NewUser {
            name: "Anna".into(),
            username: "anna".into(),
            email: "not-an-email".into(),
        };
        assert!(user.validate().is_err());

        let user = NewUser {
            email: "anna@example.com".into(),
            ..user
        };
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_audit_consistency() {
        let audit = PostCounterAudit {
            post_id: Uuid::new_v4(),
            likes_count: 2,
            live_likes: 2,
            comments_count: 1,
            live_comments: 1,
            shares_count: 0,
            live_shares: 0,
        };
        assert!(audit.is_consistent());

        let drifted = PostCounterAudit {
            likes_count: 3,
            ..audit
        };
        assert!(!drifted.is_consistent());
    }
}
