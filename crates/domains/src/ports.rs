//! # Core Traits (Ports)
//!
//! Storage and identity adapters implement these traits; services are
//! generic over them. With the `testing` feature, mockall generates a
//! `MockXxx` for each.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Comment, Like, Post, Reply, TargetKind, UserRef};

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts the post and reads it back in one transaction.
    async fn create(&self, post: Post) -> Result<Post>;

    async fn find(&self, id: Uuid) -> Result<Option<Post>>;

    /// At most `limit` posts ordered by
    /// `likes_count DESC, created_at ASC, id ASC`.
    async fn top(&self, limit: i64) -> Result<Vec<Post>>;
}

/// Persistence contract for comments and their replies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Fails with `NotFound` when the parent post does not exist.
    async fn create_comment(&self, comment: Comment) -> Result<Comment>;

    /// Fails with `NotFound` when the parent comment does not exist.
    async fn create_reply(&self, reply: Reply) -> Result<Reply>;

    /// All comments of a post, ascending by `(created_at, id)`.
    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    /// All replies under any comment of a post, ascending by `(created_at, id)`.
    async fn replies_for_post(&self, post_id: Uuid) -> Result<Vec<Reply>>;
}

/// Persistence contract for like rows.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn target_exists(&self, kind: TargetKind, target_id: Uuid) -> Result<bool>;

    async fn exists(&self, user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Result<bool>;

    /// Fails with `DuplicateLike` when the identity tuple is already present.
    async fn insert(&self, like: Like) -> Result<()>;

    /// Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Result<bool>;

    /// Every like row of one user, across all target kinds.
    async fn likes_by_user(&self, user_id: Uuid) -> Result<Vec<Like>>;
}

/// Identity lookup owned by the auth collaborator.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Ids missing from the result are unknown to the directory.
    async fn resolve(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserRef>>;
}
