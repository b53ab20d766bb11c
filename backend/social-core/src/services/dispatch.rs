//! Typed mutation dispatch.
//!
//! Every write enters through [`MutationHandler::dispatch`], which checks
//! the caller identity once and routes the tagged [`FeedMutation`] to its
//! handler on [`SocialService`].

use crate::domain::identity::AuthenticatedUser;
use crate::domain::models::{Comment, Post};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::LikeTarget;
use crate::services::authorization::require_authenticated;
use crate::services::social::{DeleteOutcome, LikeOutcome, ShareOutcome, SocialService};
use async_trait::async_trait;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMutation {
    CreatePost { content: String },
    UpdatePost { post_id: Uuid, content: String },
    DeletePost { post_id: Uuid },
    LikePost { post_id: Uuid },
    UnlikePost { post_id: Uuid },
    LikeComment { comment_id: Uuid },
    UnlikeComment { comment_id: Uuid },
    CreateComment { post_id: Uuid, content: String },
    SharePost { post_id: Uuid },
}

impl FeedMutation {
    pub fn name(&self) -> &'static str {
        match self {
            FeedMutation::CreatePost { .. } => "createPost",
            FeedMutation::UpdatePost { .. } => "updatePost",
            FeedMutation::DeletePost { .. } => "deletePost",
            FeedMutation::LikePost { .. } => "likePost",
            FeedMutation::UnlikePost { .. } => "unlikePost",
            FeedMutation::LikeComment { .. } => "likeComment",
            FeedMutation::UnlikeComment { .. } => "unlikeComment",
            FeedMutation::CreateComment { .. } => "createComment",
            FeedMutation::SharePost { .. } => "sharePost",
        }
    }
}

#[derive(Debug, Clone)]
pub enum MutationOutcome {
    Post(Post),
    Deleted(DeleteOutcome),
    Like(LikeOutcome),
    Comment(Comment),
    Share(ShareOutcome),
}

impl MutationOutcome {
    fn kind(&self) -> &'static str {
        match self {
            MutationOutcome::Post(_) => "post",
            MutationOutcome::Deleted(_) => "deleted",
            MutationOutcome::Like(_) => "like",
            MutationOutcome::Comment(_) => "comment",
            MutationOutcome::Share(_) => "share",
        }
    }

    fn mismatch(self, expected: &str) -> ServiceError {
        ServiceError::Internal(format!(
            "expected {} outcome, got {}",
            expected,
            self.kind()
        ))
    }

    pub fn into_post(self) -> ServiceResult<Post> {
        match self {
            MutationOutcome::Post(post) => Ok(post),
            other => Err(other.mismatch("post")),
        }
    }

    pub fn into_deleted(self) -> ServiceResult<DeleteOutcome> {
        match self {
            MutationOutcome::Deleted(outcome) => Ok(outcome),
            other => Err(other.mismatch("deleted")),
        }
    }

    pub fn into_like(self) -> ServiceResult<LikeOutcome> {
        match self {
            MutationOutcome::Like(outcome) => Ok(outcome),
            other => Err(other.mismatch("like")),
        }
    }

    pub fn into_comment(self) -> ServiceResult<Comment> {
        match self {
            MutationOutcome::Comment(comment) => Ok(comment),
            other => Err(other.mismatch("comment")),
        }
    }

    pub fn into_share(self) -> ServiceResult<ShareOutcome> {
        match self {
            MutationOutcome::Share(outcome) => Ok(outcome),
            other => Err(other.mismatch("share")),
        }
    }
}

#[async_trait]
pub trait MutationHandler: Send + Sync {
    /// Authenticate `actor`, then apply `mutation` atomically
    async fn dispatch(
        &self,
        actor: Option<&AuthenticatedUser>,
        mutation: FeedMutation,
    ) -> ServiceResult<MutationOutcome>;
}

#[async_trait]
impl MutationHandler for SocialService {
    async fn dispatch(
        &self,
        actor: Option<&AuthenticatedUser>,
        mutation: FeedMutation,
    ) -> ServiceResult<MutationOutcome> {
        let operation = mutation.name();
        let span = tracing::info_span!("mutation", operation);

        async move {
            let actor = match require_authenticated(actor) {
                Ok(actor) => actor,
                Err(e) => {
                    warn!("rejected anonymous mutation");
                    return Err(e);
                }
            };

            let result = match mutation {
                FeedMutation::CreatePost { content } => self
                    .create_post(actor, content)
                    .await
                    .map(MutationOutcome::Post),
                FeedMutation::UpdatePost { post_id, content } => self
                    .update_post(actor, post_id, content)
                    .await
                    .map(MutationOutcome::Post),
                FeedMutation::DeletePost { post_id } => self
                    .delete_post(actor, post_id)
                    .await
                    .map(MutationOutcome::Deleted),
                FeedMutation::LikePost { post_id } => self
                    .like(actor, LikeTarget::Post(post_id))
                    .await
                    .map(MutationOutcome::Like),
                FeedMutation::UnlikePost { post_id } => self
                    .unlike(actor, LikeTarget::Post(post_id))
                    .await
                    .map(MutationOutcome::Like),
                FeedMutation::LikeComment { comment_id } => self
                    .like(actor, LikeTarget::Comment(comment_id))
                    .await
                    .map(MutationOutcome::Like),
                FeedMutation::UnlikeComment { comment_id } => self
                    .unlike(actor, LikeTarget::Comment(comment_id))
                    .await
                    .map(MutationOutcome::Like),
                FeedMutation::CreateComment { post_id, content } => self
                    .create_comment(actor, post_id, content)
                    .await
                    .map(MutationOutcome::Comment),
                FeedMutation::SharePost { post_id } => self
                    .share_post(actor, post_id)
                    .await
                    .map(MutationOutcome::Share),
            };

            match &result {
                Ok(outcome) => {
                    info!(user_id = %actor.user_id, outcome = outcome.kind(), "mutation applied")
                }
                Err(e) if e.is_user_facing() => {
                    warn!(user_id = %actor.user_id, code = e.code(), error = %e, "mutation rejected")
                }
                Err(e) => error!(user_id = %actor.user_id, error = %e, "mutation failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}
