use crate::domain::identity::AuthenticatedUser;
use crate::domain::like_state::{LikeAction, LikeState};
use crate::domain::models::{Comment, ContentInput, NewUser, Post, Share, User};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{
    CommentRepository, LikeRepository, LikeTarget, PostRepository, ShareRepository,
    UserRepository,
};
use crate::services::authorization::require_owner;
use crate::services::counters::{apply_delta, Counter, CounterService};
use crate::services::transaction::execute_mutation;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Result of a like or unlike.
///
/// `ok = false` means the pair was already in the requested state and
/// nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub ok: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareOutcome {
    pub ok: bool,
    pub shares_count: i64,
    pub share: Share,
}

/// What the fan-out removed along with the post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub ok: bool,
    pub removed_comments: u64,
    pub removed_post_likes: u64,
    pub removed_comment_likes: u64,
    pub removed_shares: u64,
    pub author_posts_count: i64,
}

fn like_counter(target: LikeTarget) -> Counter {
    match target {
        LikeTarget::Post(_) => Counter::PostLikes,
        LikeTarget::Comment(_) => Counter::CommentLikes,
    }
}

/// Reads and counter-consistent writes over the social graph.
///
/// Write methods take an already authenticated actor; the dispatcher is
/// the public entry point that performs that check.
#[derive(Clone)]
pub struct SocialService {
    pool: PgPool,
    users: UserRepository,
    posts: PostRepository,
    comments: CommentRepository,
    counters: CounterService,
}

impl SocialService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            posts: PostRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            counters: CounterService::new(pool.clone()),
            pool,
        }
    }

    pub fn counters(&self) -> &CounterService {
        &self.counters
    }

    // ========== Reads ==========

    pub async fn get_post(&self, post_id: Uuid) -> ServiceResult<Post> {
        self.posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))
    }

    pub async fn list_posts(&self, limit: i64) -> ServiceResult<Vec<Post>> {
        if limit < 1 {
            return Err(ServiceError::Validation("first must be at least 1".to_string()));
        }
        self.posts.list_recent(limit).await
    }

    pub async fn list_comments(&self, post_id: Uuid, limit: i64) -> ServiceResult<Vec<Comment>> {
        if limit < 1 {
            return Err(ServiceError::Validation("first must be at least 1".to_string()));
        }
        // Distinguish "no comments" from "no such post"
        self.get_post(post_id).await?;
        self.comments.get_comments(post_id, limit).await
    }

    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", user_id)))
    }

    pub async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        self.users.get_users_by_ids(user_ids).await
    }

    pub async fn register_user(&self, new_user: &NewUser) -> ServiceResult<User> {
        self.users.create_user(new_user).await
    }

    // ========== Writes ==========

    pub async fn create_post(&self, actor: &AuthenticatedUser, content: String) -> ServiceResult<Post> {
        ContentInput::new(content.as_str()).validate()?;
        let author_id = actor.user_id;

        execute_mutation(&self.pool, "create_post", move |tx| {
            async move {
                let post = PostRepository::insert_post(tx, author_id, &content).await?;
                apply_delta(tx, author_id, Counter::UserPosts, 1).await?;
                Ok(post)
            }
            .boxed()
        })
        .await
    }

    pub async fn update_post(
        &self,
        actor: &AuthenticatedUser,
        post_id: Uuid,
        content: String,
    ) -> ServiceResult<Post> {
        ContentInput::new(content.as_str()).validate()?;
        let actor = actor.clone();

        execute_mutation(&self.pool, "update_post", move |tx| {
            async move {
                let post = PostRepository::lock_post(tx, post_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;
                require_owner(&post, &actor)?;
                PostRepository::update_content(tx, post_id, &content).await
            }
            .boxed()
        })
        .await
    }

    /// Delete a post and everything hanging off it.
    ///
    /// The post row is locked first, then its comments, so concurrent
    /// likes/comments/shares either finish before the fan-out (and are
    /// removed by it) or fail their foreign key check afterwards.
    pub async fn delete_post(&self, actor: &AuthenticatedUser, post_id: Uuid) -> ServiceResult<DeleteOutcome> {
        let actor = actor.clone();

        execute_mutation(&self.pool, "delete_post", move |tx| {
            async move {
                let post = PostRepository::lock_post(tx, post_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;
                require_owner(&post, &actor)?;

                CommentRepository::lock_for_post(tx, post_id).await?;
                let removed_comment_likes =
                    LikeRepository::delete_comment_likes_for_post(tx, post_id).await?;
                let removed_post_likes = LikeRepository::delete_post_likes(tx, post_id).await?;
                let removed_comments = CommentRepository::delete_for_post(tx, post_id).await?;
                let removed_shares = ShareRepository::delete_for_post(tx, post_id).await?;

                if !PostRepository::delete_post(tx, post_id).await? {
                    return Err(ServiceError::NotFound(format!("post {}", post_id)));
                }
                let author_posts_count =
                    apply_delta(tx, post.author_id, Counter::UserPosts, -1).await?;

                debug!(
                    %post_id,
                    removed_comments,
                    removed_post_likes,
                    removed_comment_likes,
                    removed_shares,
                    "post fan-out delete"
                );

                Ok(DeleteOutcome {
                    ok: true,
                    removed_comments,
                    removed_post_likes,
                    removed_comment_likes,
                    removed_shares,
                    author_posts_count,
                })
            }
            .boxed()
        })
        .await
    }

    /// Like a post or comment.
    ///
    /// A duplicate like is not an error: it returns `ok = false` with the
    /// current count and leaves the counter untouched.
    pub async fn like(&self, actor: &AuthenticatedUser, target: LikeTarget) -> ServiceResult<LikeOutcome> {
        let user_id = actor.user_id;

        let result = execute_mutation(&self.pool, "like", move |tx| {
            async move {
                if !LikeRepository::lock_target(tx, target).await? {
                    return Err(ServiceError::NotFound(format!(
                        "{} {}",
                        target.entity(),
                        target.id()
                    )));
                }

                let liked = LikeRepository::check_user_liked(tx, user_id, target).await?;
                LikeState::from_row_exists(liked).transition(LikeAction::Like)?;

                // Lost a race with a concurrent like from the same user
                if !LikeRepository::insert_like(tx, user_id, target).await? {
                    return Err(ServiceError::AlreadyLiked);
                }

                apply_delta(tx, target.id(), like_counter(target), LikeAction::Like.delta()).await
            }
            .boxed()
        })
        .await;

        match result {
            Ok(likes_count) => Ok(LikeOutcome {
                ok: true,
                likes_count,
            }),
            Err(ServiceError::AlreadyLiked) => {
                let likes_count = self
                    .counters
                    .current(target.id(), like_counter(target))
                    .await?;
                Ok(LikeOutcome {
                    ok: false,
                    likes_count,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Remove a like; fails with `NotLiked` when there is none.
    pub async fn unlike(&self, actor: &AuthenticatedUser, target: LikeTarget) -> ServiceResult<LikeOutcome> {
        let user_id = actor.user_id;

        let likes_count = execute_mutation(&self.pool, "unlike", move |tx| {
            async move {
                if !LikeRepository::lock_target(tx, target).await? {
                    return Err(ServiceError::NotFound(format!(
                        "{} {}",
                        target.entity(),
                        target.id()
                    )));
                }

                let liked = LikeRepository::check_user_liked(tx, user_id, target).await?;
                LikeState::from_row_exists(liked).transition(LikeAction::Unlike)?;

                // A concurrent unlike removed it first
                if !LikeRepository::delete_like(tx, user_id, target).await? {
                    return Err(ServiceError::NotLiked);
                }

                apply_delta(tx, target.id(), like_counter(target), LikeAction::Unlike.delta()).await
            }
            .boxed()
        })
        .await?;

        Ok(LikeOutcome {
            ok: true,
            likes_count,
        })
    }

    pub async fn create_comment(
        &self,
        actor: &AuthenticatedUser,
        post_id: Uuid,
        content: String,
    ) -> ServiceResult<Comment> {
        ContentInput::new(content.as_str()).validate()?;
        let author_id = actor.user_id;

        execute_mutation(&self.pool, "create_comment", move |tx| {
            async move {
                let comment =
                    CommentRepository::insert_comment(tx, post_id, author_id, &content).await?;
                apply_delta(tx, post_id, Counter::PostComments, 1).await?;
                Ok(comment)
            }
            .boxed()
        })
        .await
    }

    /// Append a share record; shares are never undone
    pub async fn share_post(&self, actor: &AuthenticatedUser, post_id: Uuid) -> ServiceResult<ShareOutcome> {
        let user_id = actor.user_id;

        execute_mutation(&self.pool, "share_post", move |tx| {
            async move {
                let share = ShareRepository::insert_share(tx, user_id, post_id).await?;
                let shares_count = apply_delta(tx, post_id, Counter::PostShares, 1).await?;
                Ok(ShareOutcome {
                    ok: true,
                    shares_count,
                    share,
                })
            }
            .boxed()
        })
        .await
    }
}
