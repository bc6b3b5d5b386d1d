//! # SQLite adapters
//!
//! Implements the `domains` ports over the [`Gateway`](crate::gateway::Gateway).
//! Derived counters are computed inside each read statement; no table stores
//! a count.

mod comments;
mod likes;
mod posts;
mod users;

pub use comments::SqliteCommentRepo;
pub use likes::SqliteLikeRepo;
pub use posts::SqlitePostRepo;
pub use users::SqliteUserDirectory;

use domains::{Comment, Like, Post, Reply, TargetKind};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::gateway::StoreError;

fn post_from_row(row: &SqliteRow) -> Result<Post, StoreError> {
    Ok(Post {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category: row.try_get("category")?,
        image_url: row.try_get("image_url")?,
        video_url: row.try_get("video_url")?,
        likes_count: row.try_get("likes_count")?,
        comments_count: row.try_get("comments_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, StoreError> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        likes_count: row.try_get("likes_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reply_from_row(row: &SqliteRow) -> Result<Reply, StoreError> {
    Ok(Reply {
        id: row.try_get("id")?,
        comment_id: row.try_get("comment_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        likes_count: row.try_get("likes_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn like_from_row(row: &SqliteRow) -> Result<Like, StoreError> {
    let kind: String = row.try_get("target_kind")?;
    let target_kind = kind
        .parse::<TargetKind>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(Like {
        user_id: row.try_get("user_id")?,
        target_kind,
        target_id: row.try_get("target_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use configs::DatabaseSettings;
    use domains::UserRef;
    use uuid::Uuid;

    use super::SqliteUserDirectory;
    use crate::gateway::Gateway;

    /// A migrated database in a throwaway directory. Keep the `TempDir`
    /// alive for as long as the gateway is used.
    pub async fn gateway() -> (tempfile::TempDir, Gateway) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("forum.db").display());
        let gateway = Gateway::connect(&DatabaseSettings::with_url(url))
            .await
            .expect("Failed to open database");
        gateway.migrate().await.expect("Failed to migrate");
        (dir, gateway)
    }

    pub async fn user(gateway: &Gateway, name: &str) -> UserRef {
        let user = UserRef {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        SqliteUserDirectory::new(gateway.clone())
            .register(&user)
            .await
            .unwrap();
        user
    }
}
