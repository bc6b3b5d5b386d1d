//! # Post Directory
//!
//! Top-N listing and the append-only write paths (posts, comments, replies).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use domains::{
    age_label, Comment, CommentNode, CommentRepository, DomainError, NewPost, Post, PostRepository,
    PostSummary, Reply, ReplyNode, Result, TargetKind, UserDirectory, UserRef,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::like_ledger::LikeLedger;
use crate::validation;

/// Listing sizes. The front page shows `default_top` posts; no request may
/// ask for more than `max_top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    pub default_top: i64,
    pub max_top: i64,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_top: 5,
            max_top: 50,
        }
    }
}

#[derive(Clone)]
pub struct PostDirectory {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserDirectory>,
    ledger: LikeLedger,
    limits: ListingLimits,
}

impl PostDirectory {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserDirectory>,
        ledger: LikeLedger,
        limits: ListingLimits,
    ) -> Self {
        Self {
            posts,
            comments,
            users,
            ledger,
            limits,
        }
    }

    pub fn limits(&self) -> ListingLimits {
        self.limits
    }

    /// Most liked posts first; equally liked posts oldest first.
    ///
    /// `limit` must be positive and is capped at `max_top`.
    #[instrument(skip(self))]
    pub async fn list_top(&self, limit: i64, viewer_id: Option<Uuid>) -> Result<Vec<PostSummary>> {
        if limit < 1 {
            return Err(DomainError::Validation(format!(
                "limit must be at least 1, got {limit}"
            )));
        }
        let limit = limit.min(self.limits.max_top);

        let posts = self.posts.top(limit).await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<Uuid> = posts.iter().map(|p| p.user_id).collect();
        let authors = self.users.resolve(&author_ids).await?;
        let liked = self.ledger.liked_targets_for(viewer_id).await?;

        Ok(posts
            .into_iter()
            .map(|post| PostSummary {
                user: authors
                    .get(&post.user_id)
                    .cloned()
                    .unwrap_or_else(|| UserRef::unknown(post.user_id)),
                is_liked: liked
                    .as_ref()
                    .map(|targets| targets.contains(TargetKind::Post, post.id)),
                post,
            })
            .collect())
    }

    #[instrument(skip(self, fields))]
    pub async fn create_post(&self, user_id: Uuid, fields: NewPost) -> Result<PostSummary> {
        let title = validation::required("title", &fields.title)?;
        let content = validation::required("content", &fields.content)?;
        let category = validation::required("category", &fields.category)?;
        let author = self.author(user_id).await?;

        let post = self
            .posts
            .create(Post {
                id: Uuid::now_v7(),
                user_id,
                title,
                content,
                category,
                image_url: validation::optional(fields.image_url),
                video_url: validation::optional(fields.video_url),
                likes_count: 0,
                comments_count: 0,
                created_at: Utc::now(),
            })
            .await?;

        info!(post_id = %post.id, category = %post.category, "post created");
        Ok(PostSummary {
            post,
            user: author,
            is_liked: None,
        })
    }

    /// Appends a comment. The returned node has no replies yet.
    #[instrument(skip(self, content))]
    pub async fn add_comment(&self, user_id: Uuid, post_id: Uuid, content: &str) -> Result<CommentNode> {
        let content = validation::required("content", content)?;
        let author = self.author(user_id).await?;

        let comment = self
            .comments
            .create_comment(Comment {
                id: Uuid::now_v7(),
                post_id,
                user_id,
                content,
                likes_count: 0,
                created_at: Utc::now(),
            })
            .await?;

        info!(comment_id = %comment.id, "comment added");
        Ok(CommentNode {
            age_label: age_label(comment.created_at, Utc::now()),
            comment,
            user: author,
            is_liked: None,
            replies: Vec::new(),
        })
    }

    #[instrument(skip(self, content))]
    pub async fn add_reply(&self, user_id: Uuid, comment_id: Uuid, content: &str) -> Result<ReplyNode> {
        let content = validation::required("content", content)?;
        let author = self.author(user_id).await?;

        let reply = self
            .comments
            .create_reply(Reply {
                id: Uuid::now_v7(),
                comment_id,
                user_id,
                content,
                likes_count: 0,
                created_at: Utc::now(),
            })
            .await?;

        info!(reply_id = %reply.id, "reply added");
        Ok(ReplyNode {
            age_label: age_label(reply.created_at, Utc::now()),
            reply,
            user: author,
            is_liked: None,
        })
    }

    async fn author(&self, user_id: Uuid) -> Result<UserRef> {
        let mut found: HashMap<Uuid, UserRef> = self.users.resolve(&[user_id]).await?;
        found
            .remove(&user_id)
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }
}
