//! # storage-adapters
//!
//! Relational persistence for the forum core: the pooled [`Gateway`] and the
//! SQLite implementations of the `domains` ports.

pub mod gateway;
pub mod sqlite;

pub use gateway::{Gateway, Statement, StoreError};
pub use sqlite::{SqliteCommentRepo, SqliteLikeRepo, SqlitePostRepo, SqliteUserDirectory};
