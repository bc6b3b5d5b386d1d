//! # Like Ledger
//!
//! Records and removes one like per `(user, target kind, target id)`.
//!
//! The toggle is read-then-write. Two concurrent toggles from the same user
//! can both observe "not liked" and both insert; the storage uniqueness
//! constraint rejects the second insert with `DuplicateLike`, which is
//! absorbed here so both calls converge on "liked" with exactly one row.

use std::sync::Arc;

use chrono::Utc;
use domains::{DomainError, Like, LikeRepository, LikedTargets, Result, TargetKind};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct LikeLedger {
    likes: Arc<dyn LikeRepository>,
}

impl LikeLedger {
    pub fn new(likes: Arc<dyn LikeRepository>) -> Self {
        Self { likes }
    }

    /// Flips the like state and returns the new one (`true` = now liked).
    #[instrument(skip(self))]
    pub async fn toggle_like(&self, user_id: Uuid, kind: TargetKind, target_id: Uuid) -> Result<bool> {
        if !self.likes.target_exists(kind, target_id).await? {
            return Err(DomainError::not_found(kind.as_str(), target_id));
        }

        if self.likes.exists(user_id, kind, target_id).await? {
            // A concurrent unlike may already have removed the row; either way
            // the tuple ends up unliked.
            self.likes.delete(user_id, kind, target_id).await?;
            debug!("like removed");
            return Ok(false);
        }

        let like = Like {
            user_id,
            target_kind: kind,
            target_id,
            created_at: Utc::now(),
        };
        match self.likes.insert(like).await {
            Ok(()) => {
                debug!("like recorded");
                Ok(true)
            }
            Err(DomainError::DuplicateLike) => {
                debug!("concurrent like already recorded");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Everything `viewer_id` has liked, fetched in one round-trip.
    pub async fn liked_targets(&self, viewer_id: Uuid) -> Result<LikedTargets> {
        let likes = self.likes.likes_by_user(viewer_id).await?;
        Ok(likes.into_iter().collect())
    }

    /// `liked_targets` for a signed-in viewer, nothing for an anonymous one.
    pub async fn liked_targets_for(&self, viewer_id: Option<Uuid>) -> Result<Option<LikedTargets>> {
        match viewer_id {
            Some(viewer) => Ok(Some(self.liked_targets(viewer).await?)),
            None => Ok(None),
        }
    }
}
