use crate::domain::models::{NewUser, User};
use crate::error::{ServiceError, ServiceResult};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// PostgreSQL SQLSTATE for unique violations
const UNIQUE_VIOLATION: &str = "23505";

/// Lowercase the domain part; the local part is case-sensitive
fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Repository for User operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a user row. Credentials live with the identity service.
    pub async fn create_user(&self, new_user: &NewUser) -> ServiceResult<User> {
        new_user.validate()?;

        let email = normalize_email(&new_user.email);

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, username, email, avatar, bio, followers_count,
                      following_count, posts_count, is_active, created_at, updated_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.username)
        .bind(email)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(ServiceError::Validation(
                    "email or username already registered".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a single user by ID
    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, avatar, bio, followers_count,
                   following_count, posts_count, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Batch load users (author resolution for post lists)
    pub async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, avatar, bio, followers_count,
                   following_count, posts_count, is_active, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
