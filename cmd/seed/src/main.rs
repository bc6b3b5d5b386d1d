//! # seed
//!
//! Migrates the configured database and fills it with a small demo forum:
//! a few users, posts, a comment thread and some likes. Safe to run more than
//! once; each run adds another batch of content.

use std::sync::Arc;

use anyhow::Context;
use configs::{LogSettings, Settings};
use domains::{NewPost, TargetKind, UserRef};
use services::{ForumService, ListingLimits};
use storage_adapters::{
    Gateway, SqliteCommentRepo, SqliteLikeRepo, SqlitePostRepo, SqliteUserDirectory,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn post(title: &str, content: &str, category: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: content.to_string(),
        category: category.to_string(),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_tracing(&settings.log);

    let gateway = Gateway::connect(&settings.database)
        .await
        .context("Failed to open database")?;
    gateway.migrate().await.context("Failed to run migrations")?;
    gateway.ping().await?;

    let directory = SqliteUserDirectory::new(gateway.clone());
    let mut users = Vec::new();
    for name in ["alice", "bruno", "chidi"] {
        let user = UserRef {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        directory.register(&user).await?;
        users.push(user);
    }
    let (alice, bruno, chidi) = (&users[0], &users[1], &users[2]);

    let forum = ForumService::new(
        Arc::new(SqlitePostRepo::new(gateway.clone())),
        Arc::new(SqliteCommentRepo::new(gateway.clone())),
        Arc::new(SqliteLikeRepo::new(gateway.clone())),
        Arc::new(directory),
        ListingLimits {
            default_top: settings.forum.default_top_limit,
            max_top: settings.forum.max_top_limit,
        },
    );

    let welcome = forum
        .create_post(alice.id, post("Welcome", "Introduce yourself below.", "general"))
        .await?;
    let gear = forum
        .create_post(bruno.id, post("Show your desk setup", "Photos welcome.", "hardware"))
        .await?;
    let mut clip = post("Weekend ride", "Coastal loop, 80km.", "outdoors");
    clip.video_url = Some("https://video.example/ride.mp4".to_string());
    let ride = forum.create_post(chidi.id, clip).await?;

    let hello = forum.add_comment(bruno.id, welcome.post.id, "Hi all, Bruno here.").await?;
    forum.add_reply(alice.id, hello.comment.id, "Welcome aboard!").await?;
    forum.add_comment(chidi.id, welcome.post.id, "Glad to be here.").await?;
    forum.add_comment(alice.id, gear.post.id, "Standing desk, no regrets.").await?;

    for user in [alice, bruno, chidi] {
        forum.toggle_like(user.id, TargetKind::Post, welcome.post.id).await?;
    }
    forum.toggle_like(alice.id, TargetKind::Post, ride.post.id).await?;
    forum.toggle_like(chidi.id, TargetKind::Comment, hello.comment.id).await?;

    for summary in forum.front_page(Some(alice.id)).await? {
        info!(
            title = %summary.post.title,
            author = %summary.user.name,
            likes = summary.post.likes_count,
            comments = summary.post.comments_count,
            liked_by_alice = ?summary.is_liked,
            "front page"
        );
    }

    gateway.close().await;
    Ok(())
}
