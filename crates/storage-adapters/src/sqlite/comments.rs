use async_trait::async_trait;
use domains::{Comment, CommentRepository, DomainError, Reply, Result};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use super::{comment_from_row, reply_from_row};
use crate::gateway::{Gateway, StoreError};

const SELECT_COMMENT: &str = r#"
    SELECT c.id, c.post_id, c.user_id, c.content, c.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'comment' AND l.target_id = c.id) AS likes_count
    FROM comments c
"#;

const SELECT_REPLY: &str = r#"
    SELECT r.id, r.comment_id, r.user_id, r.content, r.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'reply' AND l.target_id = r.id) AS likes_count
    FROM replies r
"#;

async fn exists(tx: &mut Transaction<'static, Sqlite>, sql: &'static str, id: Uuid) -> Result<bool> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(StoreError::from)?;
    Ok(row.is_some())
}

pub struct SqliteCommentRepo {
    gateway: Gateway,
}

impl SqliteCommentRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepo {
    /// The insert runs first so the transaction takes the write lock up
    /// front. A foreign key failure is then pinned on whichever parent is gone.
    async fn create_comment(&self, comment: Comment) -> Result<Comment> {
        let mut tx = self.gateway.begin().await?;

        let inserted = sqlx::query("INSERT INTO comments (id, post_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(comment.user_id)
            .bind(&comment.content)
            .bind(comment.created_at)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from);

        match inserted {
            Ok(_) => {}
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(if exists(&mut tx, "SELECT 1 FROM posts WHERE id = ?", comment.post_id).await? {
                    DomainError::not_found("user", comment.user_id)
                } else {
                    DomainError::not_found("post", comment.post_id)
                });
            }
            Err(e) => return Err(e.into()),
        }

        let row = sqlx::query(&format!("{SELECT_COMMENT} WHERE c.id = ?"))
            .bind(comment.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        let created = comment_from_row(&row)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(created)
    }

    async fn create_reply(&self, reply: Reply) -> Result<Reply> {
        let mut tx = self.gateway.begin().await?;

        let inserted = sqlx::query("INSERT INTO replies (id, comment_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(reply.id)
            .bind(reply.comment_id)
            .bind(reply.user_id)
            .bind(&reply.content)
            .bind(reply.created_at)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from);

        match inserted {
            Ok(_) => {}
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(if exists(&mut tx, "SELECT 1 FROM comments WHERE id = ?", reply.comment_id).await? {
                    DomainError::not_found("user", reply.user_id)
                } else {
                    DomainError::not_found("comment", reply.comment_id)
                });
            }
            Err(e) => return Err(e.into()),
        }

        let row = sqlx::query(&format!("{SELECT_REPLY} WHERE r.id = ?"))
            .bind(reply.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        let created = reply_from_row(&row)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(created)
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!("{SELECT_COMMENT} WHERE c.post_id = ? ORDER BY c.created_at ASC, c.id ASC");
        let rows = self.gateway.fetch_all(sqlx::query(&sql).bind(post_id)).await?;

        Ok(rows.iter().map(comment_from_row).collect::<std::result::Result<Vec<_>, StoreError>>()?)
    }

    async fn replies_for_post(&self, post_id: Uuid) -> Result<Vec<Reply>> {
        let sql = format!(
            "{SELECT_REPLY} JOIN comments c ON c.id = r.comment_id WHERE c.post_id = ? ORDER BY r.created_at ASC, r.id ASC"
        );
        let rows = self.gateway.fetch_all(sqlx::query(&sql).bind(post_id)).await?;

        Ok(rows.iter().map(reply_from_row).collect::<std::result::Result<Vec<_>, StoreError>>()?)
    }
}
