//! # services
//!
//! Forum business logic, generic over the `domains` ports. [`ForumService`]
//! bundles the components behind the entry points callers use.

pub mod comment_tree;
pub mod like_ledger;
pub mod post_directory;
pub mod validation;

use std::sync::Arc;

use domains::{
    CommentNode, CommentRepository, LikeRepository, NewPost, PostAggregate, PostRepository,
    PostSummary, ReplyNode, Result, TargetKind, UserDirectory,
};
use uuid::Uuid;

pub use comment_tree::CommentTreeAssembler;
pub use like_ledger::LikeLedger;
pub use post_directory::{ListingLimits, PostDirectory};

/// The forum's public entry points, wired over one set of adapters.
#[derive(Clone)]
pub struct ForumService {
    directory: PostDirectory,
    assembler: CommentTreeAssembler,
    ledger: LikeLedger,
}

impl ForumService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
        users: Arc<dyn UserDirectory>,
        limits: ListingLimits,
    ) -> Self {
        let ledger = LikeLedger::new(likes);
        Self {
            directory: PostDirectory::new(
                posts.clone(),
                comments.clone(),
                users.clone(),
                ledger.clone(),
                limits,
            ),
            assembler: CommentTreeAssembler::new(posts, comments, users, ledger.clone()),
            ledger,
        }
    }

    pub async fn create_post(&self, user_id: Uuid, fields: NewPost) -> Result<PostSummary> {
        self.directory.create_post(user_id, fields).await
    }

    pub async fn list_top(&self, limit: i64, viewer_id: Option<Uuid>) -> Result<Vec<PostSummary>> {
        self.directory.list_top(limit, viewer_id).await
    }

    /// `list_top` with the configured front-page size.
    pub async fn front_page(&self, viewer_id: Option<Uuid>) -> Result<Vec<PostSummary>> {
        self.directory
            .list_top(self.directory.limits().default_top, viewer_id)
            .await
    }

    pub async fn fetch_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> Result<PostAggregate> {
        self.assembler.fetch_post(post_id, viewer_id).await
    }

    pub async fn add_comment(&self, user_id: Uuid, post_id: Uuid, content: &str) -> Result<CommentNode> {
        self.directory.add_comment(user_id, post_id, content).await
    }

    pub async fn add_reply(&self, user_id: Uuid, comment_id: Uuid, content: &str) -> Result<ReplyNode> {
        self.directory.add_reply(user_id, comment_id, content).await
    }

    pub async fn toggle_like(&self, user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Result<bool> {
        self.ledger.toggle_like(user_id, kind, target_id).await
    }
}
