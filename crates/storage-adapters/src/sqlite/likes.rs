use async_trait::async_trait;
use domains::{DomainError, Like, LikeRepository, Result, TargetKind};
use uuid::Uuid;

use super::like_from_row;
use crate::gateway::{Gateway, StoreError};

/// One fixed statement per target kind; the table name never comes from input.
fn target_exists_sql(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Post => "SELECT 1 FROM posts WHERE id = ?",
        TargetKind::Comment => "SELECT 1 FROM comments WHERE id = ?",
        TargetKind::Reply => "SELECT 1 FROM replies WHERE id = ?",
    }
}

pub struct SqliteLikeRepo {
    gateway: Gateway,
}

impl SqliteLikeRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl LikeRepository for SqliteLikeRepo {
    async fn target_exists(&self, kind: TargetKind, target_id: Uuid) -> Result<bool> {
        let row = self
            .gateway
            .fetch_optional(sqlx::query(target_exists_sql(kind)).bind(target_id))
            .await?;
        Ok(row.is_some())
    }

    async fn exists(&self, user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Result<bool> {
        let row = self
            .gateway
            .fetch_optional(
                sqlx::query("SELECT 1 FROM likes WHERE user_id = ? AND target_kind = ? AND target_id = ?")
                    .bind(user_id)
                    .bind(kind.as_str())
                    .bind(target_id),
            )
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, like: Like) -> Result<()> {
        let inserted = self
            .gateway
            .execute(
                sqlx::query("INSERT INTO likes (user_id, target_kind, target_id, created_at) VALUES (?, ?, ?, ?)")
                    .bind(like.user_id)
                    .bind(like.target_kind.as_str())
                    .bind(like.target_id)
                    .bind(like.created_at),
            )
            .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(StoreError::UniqueViolation(_)) => Err(DomainError::DuplicateLike),
            Err(StoreError::ForeignKeyViolation(_)) => Err(DomainError::not_found("user", like.user_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Result<bool> {
        let done = self
            .gateway
            .execute(
                sqlx::query("DELETE FROM likes WHERE user_id = ? AND target_kind = ? AND target_id = ?")
                    .bind(user_id)
                    .bind(kind.as_str())
                    .bind(target_id),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn likes_by_user(&self, user_id: Uuid) -> Result<Vec<Like>> {
        let rows = self
            .gateway
            .fetch_all(
                sqlx::query("SELECT user_id, target_kind, target_id, created_at FROM likes WHERE user_id = ?")
                    .bind(user_id),
            )
            .await?;

        Ok(rows.iter().map(like_from_row).collect::<std::result::Result<Vec<_>, StoreError>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support;
    use chrono::Utc;

    fn like(user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Like {
        Like {
            user_id,
            target_kind: kind,
            target_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_exists_delete() {
        let (_dir, gateway) = test_support::gateway().await;
        let user = test_support::user(&gateway, "ada").await;
        let repo = SqliteLikeRepo::new(gateway);
        let target = Uuid::now_v7();

        assert!(!repo.exists(user.id, TargetKind::Comment, target).await.unwrap());
        repo.insert(like(user.id, TargetKind::Comment, target)).await.unwrap();
        assert!(repo.exists(user.id, TargetKind::Comment, target).await.unwrap());
        assert!(!repo.exists(user.id, TargetKind::Reply, target).await.unwrap());

        assert!(repo.delete(user.id, TargetKind::Comment, target).await.unwrap());
        assert!(!repo.delete(user.id, TargetKind::Comment, target).await.unwrap());
        assert!(!repo.exists(user.id, TargetKind::Comment, target).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_insert_is_duplicate() {
        let (_dir, gateway) = test_support::gateway().await;
        let user = test_support::user(&gateway, "ada").await;
        let repo = SqliteLikeRepo::new(gateway);
        let target = Uuid::now_v7();

        repo.insert(like(user.id, TargetKind::Post, target)).await.unwrap();
        let err = repo.insert(like(user.id, TargetKind::Post, target)).await.unwrap_err();
        assert_eq!(err, DomainError::DuplicateLike);
        assert_eq!(repo.likes_by_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_likes_by_user_spans_kinds() {
        let (_dir, gateway) = test_support::gateway().await;
        let ada = test_support::user(&gateway, "ada").await;
        let bob = test_support::user(&gateway, "bob").await;
        let repo = SqliteLikeRepo::new(gateway);

        for kind in TargetKind::ALL {
            repo.insert(like(ada.id, kind, Uuid::now_v7())).await.unwrap();
        }
        repo.insert(like(bob.id, TargetKind::Post, Uuid::now_v7())).await.unwrap();

        let mine = repo.likes_by_user(ada.id).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().all(|l| l.user_id == ada.id));
        for kind in TargetKind::ALL {
            assert!(mine.iter().any(|l| l.target_kind == kind));
        }
    }

    #[tokio::test]
    async fn test_target_exists_checks_the_right_table() {
        let (_dir, gateway) = test_support::gateway().await;
        let user = test_support::user(&gateway, "ada").await;
        let post_id = Uuid::now_v7();
        gateway
            .execute(
                sqlx::query("INSERT INTO posts (id, user_id, title, content, category, created_at) VALUES (?, ?, 't', 'c', 'g', ?)")
                    .bind(post_id)
                    .bind(user.id)
                    .bind(Utc::now()),
            )
            .await
            .unwrap();
        let repo = SqliteLikeRepo::new(gateway);

        assert!(repo.target_exists(TargetKind::Post, post_id).await.unwrap());
        assert!(!repo.target_exists(TargetKind::Comment, post_id).await.unwrap());
        assert!(!repo.target_exists(TargetKind::Reply, post_id).await.unwrap());
    }
}
