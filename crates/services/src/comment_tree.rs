//! # Comment Tree Assembler
//!
//! Rebuilds a post's comment/reply tree from flat row-sets and annotates every
//! node with the viewer's like state and a relative-age label.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    age_label, Comment, CommentNode, CommentRepository, DomainError, LikedTargets, Post,
    PostAggregate, PostRepository, PostSummary, Reply, ReplyNode, Result, TargetKind,
    UserDirectory, UserRef,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::like_ledger::LikeLedger;

#[derive(Clone)]
pub struct CommentTreeAssembler {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserDirectory>,
    ledger: LikeLedger,
}

impl CommentTreeAssembler {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserDirectory>,
        ledger: LikeLedger,
    ) -> Self {
        Self {
            posts,
            comments,
            users,
            ledger,
        }
    }

    /// Loads `post_id` with its full tree. Anonymous viewers get no
    /// `is_liked` on any node.
    #[instrument(skip(self))]
    pub async fn fetch_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> Result<PostAggregate> {
        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        let comments = self.comments.comments_for_post(post_id).await?;
        let replies = self.comments.replies_for_post(post_id).await?;

        let author_ids: Vec<Uuid> = iter::once(post.user_id)
            .chain(comments.iter().map(|c| c.user_id))
            .chain(replies.iter().map(|r| r.user_id))
            .collect();
        let authors = self.users.resolve(&author_ids).await?;
        let liked = self.ledger.liked_targets_for(viewer_id).await?;

        debug!(comments = comments.len(), replies = replies.len(), "assembling post");
        Ok(assemble(post, comments, replies, &authors, liked.as_ref(), Utc::now()))
    }
}

fn author(authors: &HashMap<Uuid, UserRef>, id: Uuid) -> UserRef {
    authors.get(&id).cloned().unwrap_or_else(|| UserRef::unknown(id))
}

fn is_liked(liked: Option<&LikedTargets>, kind: TargetKind, id: Uuid) -> Option<bool> {
    liked.map(|targets| targets.contains(kind, id))
}

/// Builds the aggregate in one linear pass over each row-set.
///
/// `comments` and `replies` must already be ascending by creation time; the
/// order is preserved. Comment nodes live in an arena indexed by id and each
/// reply is pushed onto its parent through that index.
pub fn assemble(
    post: Post,
    comments: Vec<Comment>,
    replies: Vec<Reply>,
    authors: &HashMap<Uuid, UserRef>,
    liked: Option<&LikedTargets>,
    now: DateTime<Utc>,
) -> PostAggregate {
    let mut arena: Vec<CommentNode> = comments
        .into_iter()
        .map(|comment| CommentNode {
            user: author(authors, comment.user_id),
            age_label: age_label(comment.created_at, now),
            is_liked: is_liked(liked, TargetKind::Comment, comment.id),
            replies: Vec::new(),
            comment,
        })
        .collect();

    let index: HashMap<Uuid, usize> = arena
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.comment.id, slot))
        .collect();

    for reply in replies {
        let Some(&slot) = index.get(&reply.comment_id) else {
            warn!(reply_id = %reply.id, comment_id = %reply.comment_id, "reply without visible parent dropped");
            continue;
        };
        arena[slot].replies.push(ReplyNode {
            user: author(authors, reply.user_id),
            age_label: age_label(reply.created_at, now),
            is_liked: is_liked(liked, TargetKind::Reply, reply.id),
            reply,
        });
    }

    PostAggregate {
        age_label: age_label(post.created_at, now),
        post: PostSummary {
            user: author(authors, post.user_id),
            is_liked: is_liked(liked, TargetKind::Post, post.id),
            post,
        },
        comments: arena,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domains::{Like, MockCommentRepository, MockLikeRepository, MockPostRepository, MockUserDirectory};
    use mockall::predicate::eq;

    fn user(name: &str) -> UserRef {
        UserRef {
            id: Uuid::now_v7(),
            name: name.into(),
        }
    }

    fn post(author: &UserRef, at: DateTime<Utc>) -> Post {
        Post {
            id: Uuid::now_v7(),
            user_id: author.id,
            title: "Breathing exercises".into(),
            content: "What works for you?".into(),
            category: "wellbeing".into(),
            image_url: None,
            video_url: None,
            likes_count: 0,
            comments_count: 2,
            created_at: at,
        }
    }

    fn comment(post: &Post, author: &UserRef, at: DateTime<Utc>) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            post_id: post.id,
            user_id: author.id,
            content: "Box breathing".into(),
            likes_count: 0,
            created_at: at,
        }
    }

    fn reply(comment: &Comment, author: &UserRef, at: DateTime<Utc>) -> Reply {
        Reply {
            id: Uuid::now_v7(),
            comment_id: comment.id,
            user_id: author.id,
            content: "Same here".into(),
            likes_count: 0,
            created_at: at,
        }
    }

    fn directory(users: &[&UserRef]) -> HashMap<Uuid, UserRef> {
        users.iter().map(|u| (u.id, (*u).clone())).collect()
    }

    #[test]
    fn test_assemble_nests_replies_in_order() {
        let now = Utc::now();
        let (ada, bob) = (user("ada"), user("bob"));
        let p = post(&ada, now - Duration::hours(3));
        let c1 = comment(&p, &bob, now - Duration::hours(2));
        let c2 = comment(&p, &ada, now - Duration::minutes(90));
        let r1 = reply(&c1, &ada, now - Duration::minutes(30));
        let r2 = reply(&c2, &bob, now - Duration::seconds(10));
        let r3 = reply(&c1, &bob, now - Duration::seconds(5));

        let aggregate = assemble(
            p.clone(),
            vec![c1.clone(), c2.clone()],
            vec![r1.clone(), r2.clone(), r3.clone()],
            &directory(&[&ada, &bob]),
            None,
            now,
        );

        assert_eq!(aggregate.post.post.id, p.id);
        assert_eq!(aggregate.post.user, ada);
        assert_eq!(aggregate.age_label, "3h ago");
        assert_eq!(aggregate.comments.len(), 2);

        let first = &aggregate.comments[0];
        assert_eq!(first.comment.id, c1.id);
        assert_eq!(first.user, bob);
        assert_eq!(first.age_label, "2h ago");
        assert_eq!(
            first.replies.iter().map(|r| r.reply.id).collect::<Vec<_>>(),
            vec![r1.id, r3.id]
        );
        assert_eq!(first.replies[0].age_label, "30m ago");

        let second = &aggregate.comments[1];
        assert_eq!(second.comment.id, c2.id);
        assert_eq!(second.replies.len(), 1);
        assert_eq!(second.replies[0].reply.id, r2.id);
        assert_eq!(second.replies[0].age_label, "just now");
    }

    #[test]
    fn test_assemble_anonymous_has_no_like_state() {
        let now = Utc::now();
        let ada = user("ada");
        let p = post(&ada, now);
        let c = comment(&p, &ada, now);
        let r = reply(&c, &ada, now);

        let aggregate = assemble(p, vec![c], vec![r], &directory(&[&ada]), None, now);

        assert_eq!(aggregate.post.is_liked, None);
        assert_eq!(aggregate.comments[0].is_liked, None);
        assert_eq!(aggregate.comments[0].replies[0].is_liked, None);
    }

    #[test]
    fn test_assemble_stamps_viewer_likes() {
        let now = Utc::now();
        let ada = user("ada");
        let p = post(&ada, now);
        let liked_comment = comment(&p, &ada, now);
        let plain_comment = comment(&p, &ada, now);
        let liked_reply = reply(&plain_comment, &ada, now);

        let mut liked = LikedTargets::default();
        liked.insert(TargetKind::Comment, liked_comment.id);
        liked.insert(TargetKind::Reply, liked_reply.id);
        // Liking a comment must not mark a post sharing nothing with it.
        liked.insert(TargetKind::Post, Uuid::now_v7());

        let aggregate = assemble(
            p,
            vec![liked_comment, plain_comment],
            vec![liked_reply],
            &directory(&[&ada]),
            Some(&liked),
            now,
        );

        assert_eq!(aggregate.post.is_liked, Some(false));
        assert_eq!(aggregate.comments[0].is_liked, Some(true));
        assert_eq!(aggregate.comments[1].is_liked, Some(false));
        assert_eq!(aggregate.comments[1].replies[0].is_liked, Some(true));
        assert!(aggregate.comments[0].replies.is_empty());
    }

    #[test]
    fn test_assemble_empty_post_and_orphans() {
        let now = Utc::now();
        let ada = user("ada");
        let p = post(&ada, now);
        let elsewhere = comment(&post(&ada, now), &ada, now);
        let orphan = reply(&elsewhere, &ada, now);

        let aggregate = assemble(p, vec![], vec![orphan], &HashMap::new(), None, now);

        assert!(aggregate.comments.is_empty());
        // Authors unknown to the directory still get a reference.
        assert_eq!(aggregate.post.user, UserRef::unknown(ada.id));
    }

    #[tokio::test]
    async fn test_fetch_post_unknown_is_not_found() {
        let missing = Uuid::now_v7();
        let mut posts = MockPostRepository::new();
        posts.expect_find().with(eq(missing)).returning(|_| Ok(None));
        let mut comments = MockCommentRepository::new();
        comments.expect_comments_for_post().never();
        comments.expect_replies_for_post().never();

        let assembler = CommentTreeAssembler::new(
            Arc::new(posts),
            Arc::new(comments),
            Arc::new(MockUserDirectory::new()),
            LikeLedger::new(Arc::new(MockLikeRepository::new())),
        );

        let err = assembler.fetch_post(missing, None).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("post", missing));
    }

    #[tokio::test]
    async fn test_fetch_post_uses_one_like_query_for_viewer() {
        let now = Utc::now();
        let (ada, viewer) = (user("ada"), user("viewer"));
        let p = post(&ada, now - Duration::days(2));
        let c = comment(&p, &ada, now - Duration::days(1));
        let r = reply(&c, &viewer, now);

        let mut posts = MockPostRepository::new();
        let found = p.clone();
        posts.expect_find().returning(move |_| Ok(Some(found.clone())));

        let mut comments = MockCommentRepository::new();
        let listed = c.clone();
        comments.expect_comments_for_post().with(eq(p.id)).returning(move |_| Ok(vec![listed.clone()]));
        let replied = r.clone();
        comments.expect_replies_for_post().with(eq(p.id)).returning(move |_| Ok(vec![replied.clone()]));

        let mut users = MockUserDirectory::new();
        let known = directory(&[&ada, &viewer]);
        users.expect_resolve().times(1).returning(move |ids| {
            Ok(ids.iter().filter_map(|id| known.get(id).map(|u| (*id, u.clone()))).collect())
        });

        let mut likes = MockLikeRepository::new();
        let liked_reply = r.id;
        likes
            .expect_likes_by_user()
            .with(eq(viewer.id))
            .times(1)
            .returning(move |user_id| {
                Ok(vec![Like {
                    user_id,
                    target_kind: TargetKind::Reply,
                    target_id: liked_reply,
                    created_at: Utc::now(),
                }])
            });

        let assembler = CommentTreeAssembler::new(
            Arc::new(posts),
            Arc::new(comments),
            Arc::new(users),
            LikeLedger::new(Arc::new(likes)),
        );

        let aggregate = assembler.fetch_post(p.id, Some(viewer.id)).await.unwrap();
        assert_eq!(aggregate.age_label, "2d ago");
        assert_eq!(aggregate.post.is_liked, Some(false));
        assert_eq!(aggregate.comments[0].is_liked, Some(false));
        assert_eq!(aggregate.comments[0].replies[0].is_liked, Some(true));
        assert_eq!(aggregate.comments[0].replies[0].user, viewer);
    }
}
