//! forum/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for the forum core.
//! Nothing in this crate performs I/O.

pub mod age;
pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use age::age_label;
pub use errors::*;
pub use models::*;
pub use ports::*;
