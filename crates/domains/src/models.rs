//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! `likes_count` and `comments_count` are never stored; every read path
//! derives them from the underlying rows.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Discriminates what a [`Like`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
    Reply,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::Post, TargetKind::Comment, TargetKind::Reply];

    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
            TargetKind::Reply => "reply",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            "reply" => Ok(TargetKind::Reply),
            other => Err(DomainError::Validation(format!(
                "unknown like target kind '{other}'"
            ))),
        }
    }
}

/// Author reference resolved through the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
}

impl UserRef {
    /// Placeholder for an author the identity collaborator no longer knows.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: "unknown".to_string(),
        }
    }
}

/// A top-level forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A comment directly under a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A reply to a comment. Holds only the parent id, never the parent itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One like row. Identity is `(user_id, target_kind, target_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// A post as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub user: UserRef,
    /// `None` for anonymous viewers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

/// A post with its whole comment/reply tree, assembled for a single read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAggregate {
    #[serde(flatten)]
    pub post: PostSummary,
    pub age_label: String,
    pub comments: Vec<CommentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: UserRef,
    pub age_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    /// Always present; empty when nobody replied.
    pub replies: Vec<ReplyNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyNode {
    #[serde(flatten)]
    pub reply: Reply,
    pub user: UserRef,
    pub age_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

/// Membership sets of everything one viewer has liked, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedTargets {
    pub posts: HashSet<Uuid>,
    pub comments: HashSet<Uuid>,
    pub replies: HashSet<Uuid>,
}

impl LikedTargets {
    pub fn contains(&self, kind: TargetKind, id: Uuid) -> bool {
        match kind {
            TargetKind::Post => self.posts.contains(&id),
            TargetKind::Comment => self.comments.contains(&id),
            TargetKind::Reply => self.replies.contains(&id),
        }
    }

    pub fn insert(&mut self, kind: TargetKind, id: Uuid) {
        match kind {
            TargetKind::Post => self.posts.insert(id),
            TargetKind::Comment => self.comments.insert(id),
            TargetKind::Reply => self.replies.insert(id),
        };
    }

    pub fn len(&self) -> usize {
        self.posts.len() + self.comments.len() + self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Like> for LikedTargets {
    fn from_iter<I: IntoIterator<Item = Like>>(iter: I) -> Self {
        let mut targets = LikedTargets::default();
        for like in iter {
            targets.insert(like.target_kind, like.target_id);
        }
        targets
    }
}
