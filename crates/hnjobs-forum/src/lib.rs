//! # hnjobs-forum
//!
//! Client for the forum's public JSON API. The pipeline depends on the
//! [`ForumApi`] trait; [`HackerNewsClient`] is the HTTP implementation.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::ForumApi;
pub use client::HackerNewsClient;
pub use error::{ForumError, ForumResult};
pub use types::{CommentItem, ForumUser, Item, StoryItem};
