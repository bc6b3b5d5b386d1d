use async_trait::async_trait;
use domains::{DomainError, Post, PostRepository, Result};
use uuid::Uuid;

use super::post_from_row;
use crate::gateway::{Gateway, StoreError};

const SELECT_POST: &str = r#"
    SELECT p.id, p.user_id, p.title, p.content, p.category, p.image_url, p.video_url, p.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'post' AND l.target_id = p.id) AS likes_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
    FROM posts p
"#;

pub struct SqlitePostRepo {
    gateway: Gateway,
}

impl SqlitePostRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepo {
    /// Insert and read-back share one transaction, so an abandoned call
    /// leaves nothing behind.
    async fn create(&self, post: Post) -> Result<Post> {
        let mut tx = self.gateway.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO posts (id, user_id, title, content, category, image_url, video_url, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(&post.image_url)
        .bind(&post.video_url)
        .bind(post.created_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from);

        match inserted {
            Ok(_) => {}
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(DomainError::not_found("user", post.user_id))
            }
            Err(e) => return Err(e.into()),
        }

        let row = sqlx::query(&format!("{SELECT_POST} WHERE p.id = ?"))
            .bind(post.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        let created = post_from_row(&row)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>> {
        let sql = format!("{SELECT_POST} WHERE p.id = ?");
        let row = self.gateway.fetch_optional(sqlx::query(&sql).bind(id)).await?;

        Ok(row.as_ref().map(post_from_row).transpose()?)
    }

    async fn top(&self, limit: i64) -> Result<Vec<Post>> {
        let sql = format!("{SELECT_POST} ORDER BY likes_count DESC, p.created_at ASC, p.id ASC LIMIT ?");
        let rows = self.gateway.fetch_all(sqlx::query(&sql).bind(limit)).await?;

        Ok(rows.iter().map(post_from_row).collect::<std::result::Result<Vec<_>, StoreError>>()?)
    }
}
