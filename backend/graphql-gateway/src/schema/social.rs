//! Likes, comments and shares

use async_graphql::{Context, Object, Result as GraphQLResult, SimpleObject, ID};
use social_core::services::{LikeOutcome, ShareOutcome};
use social_core::FeedMutation;

use super::content::Comment;
use super::dispatch;
use super::errors::{parse_id, IntoGraphQLResult};

/// `ok = false` means the like already existed and nothing changed
#[derive(SimpleObject, Clone, Debug)]
pub struct LikePayload {
    pub ok: bool,
    pub likes_count: i64,
}

impl From<LikeOutcome> for LikePayload {
    fn from(outcome: LikeOutcome) -> Self {
        LikePayload {
            ok: outcome.ok,
            likes_count: outcome.likes_count,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct SharePayload {
    pub ok: bool,
    pub shares_count: i64,
}

impl From<ShareOutcome> for SharePayload {
    fn from(outcome: ShareOutcome) -> Self {
        SharePayload {
            ok: outcome.ok,
            shares_count: outcome.shares_count,
        }
    }
}

async fn like_mutation(ctx: &Context<'_>, mutation: FeedMutation) -> GraphQLResult<LikePayload> {
    let outcome = dispatch(ctx, mutation).await?;
    outcome.into_like().map(LikePayload::from).into_gql()
}

#[derive(Default)]
pub struct SocialMutation;

#[Object]
impl SocialMutation {
    async fn like_post(&self, ctx: &Context<'_>, post_id: ID) -> GraphQLResult<LikePayload> {
        let post_id = parse_id(&post_id, "postId")?;
        like_mutation(ctx, FeedMutation::LikePost { post_id }).await
    }

    async fn unlike_post(&self, ctx: &Context<'_>, post_id: ID) -> GraphQLResult<LikePayload> {
        let post_id = parse_id(&post_id, "postId")?;
        like_mutation(ctx, FeedMutation::UnlikePost { post_id }).await
    }

    async fn like_comment(&self, ctx: &Context<'_>, comment_id: ID) -> GraphQLResult<LikePayload> {
        let comment_id = parse_id(&comment_id, "commentId")?;
        like_mutation(ctx, FeedMutation::LikeComment { comment_id }).await
    }

    async fn unlike_comment(
        &self,
        ctx: &Context<'_>,
        comment_id: ID,
    ) -> GraphQLResult<LikePayload> {
        let comment_id = parse_id(&comment_id, "commentId")?;
        like_mutation(ctx, FeedMutation::UnlikeComment { comment_id }).await
    }

    async fn create_comment(
        &self,
        ctx: &Context<'_>,
        post_id: ID,
        content: String,
    ) -> GraphQLResult<Comment> {
        let post_id = parse_id(&post_id, "postId")?;
        let outcome = dispatch(ctx, FeedMutation::CreateComment { post_id, content }).await?;
        outcome.into_comment().map(Comment::from).into_gql()
    }

    async fn share_post(&self, ctx: &Context<'_>, post_id: ID) -> GraphQLResult<SharePayload> {
        let post_id = parse_id(&post_id, "postId")?;
        let outcome = dispatch(ctx, FeedMutation::SharePost { post_id }).await?;
        outcome.into_share().map(SharePayload::from).into_gql()
    }
}
