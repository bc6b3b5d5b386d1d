//! Shared fixtures for the cross-crate tests under `tests/`.

use std::sync::Arc;

use configs::DatabaseSettings;
use domains::{NewPost, PostSummary, UserRef};
use services::{ForumService, ListingLimits};
use storage_adapters::{
    Gateway, SqliteCommentRepo, SqliteLikeRepo, SqlitePostRepo, SqliteUserDirectory,
};
use tempfile::TempDir;
use uuid::Uuid;

/// A forum over a freshly migrated SQLite file. The database lives as long
/// as this value.
pub struct TestForum {
    pub gateway: Gateway,
    pub service: ForumService,
    users: SqliteUserDirectory,
    _dir: TempDir,
}

impl TestForum {
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Like [`TestForum::new`], with a hook to reshape the pool first.
    pub async fn with_settings(tune: impl FnOnce(&mut DatabaseSettings)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut settings =
            DatabaseSettings::with_url(format!("sqlite://{}", dir.path().join("forum.db").display()));
        tune(&mut settings);

        let gateway = Gateway::connect(&settings).await.expect("Failed to open database");
        gateway.migrate().await.expect("Failed to migrate");

        let service = ForumService::new(
            Arc::new(SqlitePostRepo::new(gateway.clone())),
            Arc::new(SqliteCommentRepo::new(gateway.clone())),
            Arc::new(SqliteLikeRepo::new(gateway.clone())),
            Arc::new(SqliteUserDirectory::new(gateway.clone())),
            ListingLimits::default(),
        );

        Self {
            users: SqliteUserDirectory::new(gateway.clone()),
            gateway,
            service,
            _dir: dir,
        }
    }

    pub async fn user(&self, name: &str) -> UserRef {
        let user = UserRef {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        self.users.register(&user).await.expect("Failed to register user");
        user
    }

    pub async fn post(&self, author: &UserRef, title: &str) -> PostSummary {
        self.service
            .create_post(
                author.id,
                NewPost {
                    title: title.to_string(),
                    content: format!("{title} body"),
                    category: "general".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to create post")
    }

    /// Raw like rows for one identity tuple, bypassing every service.
    pub async fn like_rows(&self, user_id: Uuid, kind: &str, target_id: Uuid) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(user_id)
        .bind(kind)
        .bind(target_id)
        .fetch_one(self.gateway.pool())
        .await
        .expect("Failed to count likes")
    }
}
