//! Post and comment schema

use async_graphql::{ComplexObject, Context, Object, Result as GraphQLResult, SimpleObject, ID};
use chrono::{DateTime, Utc};
use social_core::{FeedMutation, SocialService};
use uuid::Uuid;

use super::errors::{parse_id, IntoGraphQLResult};
use super::user::User;
use super::{dispatch, load_author, PageLimits};

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Post {
    pub id: ID,
    #[graphql(skip)]
    pub author_id: Uuid,
    pub content: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[ComplexObject]
impl Post {
    async fn author(&self, ctx: &Context<'_>) -> GraphQLResult<User> {
        load_author(ctx, self.author_id).await
    }
}

impl From<social_core::domain::models::Post> for Post {
    fn from(post: social_core::domain::models::Post) -> Self {
        Post {
            id: ID::from(post.id.to_string()),
            author_id: post.author_id,
            content: post.content,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            shares_count: post.shares_count,
            created_at: timestamp(post.created_at),
            updated_at: timestamp(post.updated_at),
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Comment {
    pub id: ID,
    pub post_id: ID,
    #[graphql(skip)]
    pub author_id: Uuid,
    pub content: String,
    pub likes_count: i64,
    pub created_at: String,
}

#[ComplexObject]
impl Comment {
    async fn author(&self, ctx: &Context<'_>) -> GraphQLResult<User> {
        load_author(ctx, self.author_id).await
    }
}

impl From<social_core::domain::models::Comment> for Comment {
    fn from(comment: social_core::domain::models::Comment) -> Self {
        Comment {
            id: ID::from(comment.id.to_string()),
            post_id: ID::from(comment.post_id.to_string()),
            author_id: comment.author_id,
            content: comment.content,
            likes_count: comment.likes_count,
            created_at: timestamp(comment.created_at),
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct DeletePostPayload {
    pub ok: bool,
}

#[derive(Default)]
pub struct ContentQuery;

#[Object]
impl ContentQuery {
    async fn post(&self, ctx: &Context<'_>, post_id: ID) -> GraphQLResult<Post> {
        let post_id = parse_id(&post_id, "postId")?;
        let service = ctx.data::<SocialService>()?;

        service.get_post(post_id).await.map(Post::from).into_gql()
    }

    /// Most recent posts first
    async fn posts(&self, ctx: &Context<'_>, first: Option<i32>) -> GraphQLResult<Vec<Post>> {
        let limit = ctx.data::<PageLimits>()?.clamp(first);
        let service = ctx.data::<SocialService>()?;

        let posts = service.list_posts(limit).await.into_gql()?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    /// Comments on a post, oldest first
    async fn comments(
        &self,
        ctx: &Context<'_>,
        post_id: ID,
        first: Option<i32>,
    ) -> GraphQLResult<Vec<Comment>> {
        let post_id = parse_id(&post_id, "postId")?;
        let limit = ctx.data::<PageLimits>()?.clamp(first);
        let service = ctx.data::<SocialService>()?;

        let comments = service.list_comments(post_id, limit).await.into_gql()?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}

#[derive(Default)]
pub struct ContentMutation;

#[Object]
impl ContentMutation {
    async fn create_post(&self, ctx: &Context<'_>, content: String) -> GraphQLResult<Post> {
        let outcome = dispatch(ctx, FeedMutation::CreatePost { content }).await?;
        outcome.into_post().map(Post::from).into_gql()
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        post_id: ID,
        content: String,
    ) -> GraphQLResult<Post> {
        let post_id = parse_id(&post_id, "postId")?;
        let outcome = dispatch(ctx, FeedMutation::UpdatePost { post_id, content }).await?;
        outcome.into_post().map(Post::from).into_gql()
    }

    /// Removes the post with its comments, likes and shares
    async fn delete_post(&self, ctx: &Context<'_>, post_id: ID) -> GraphQLResult<DeletePostPayload> {
        let post_id = parse_id(&post_id, "postId")?;
        let outcome = dispatch(ctx, FeedMutation::DeletePost { post_id }).await?;
        let deleted = outcome.into_deleted().into_gql()?;

        Ok(DeletePostPayload { ok: deleted.ok })
    }
}
