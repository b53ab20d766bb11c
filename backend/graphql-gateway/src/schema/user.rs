//! User schema and the `me` query

use async_graphql::{Context, Object, Result as GraphQLResult, SimpleObject, ID};
use serde::{Deserialize, Serialize};
use social_core::services::require_authenticated;
use social_core::{AuthenticatedUser, SocialService};

use super::errors::IntoGraphQLResult;

#[derive(SimpleObject, Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: ID,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl From<social_core::domain::models::User> for User {
    fn from(user: social_core::domain::models::User) -> Self {
        User {
            id: ID::from(user.id.to_string()),
            name: user.name,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            bio: user.bio,
            posts_count: user.posts_count,
            followers_count: user.followers_count,
            following_count: user.following_count,
        }
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The authenticated caller
    async fn me(&self, ctx: &Context<'_>) -> GraphQLResult<User> {
        let actor = require_authenticated(ctx.data_opt::<AuthenticatedUser>()).into_gql()?;
        let service = ctx.data::<SocialService>()?;

        service.get_user(actor.user_id).await.map(User::from).into_gql()
    }
}
