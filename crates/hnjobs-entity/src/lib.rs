//! # hnjobs-entity
//!
//! Domain entity models for the HN jobs pipeline. Row models derive
//! `sqlx::FromRow`; the `posting` module holds the transient shapes the
//! language model returns, which are never persisted as-is.

pub mod comment;
pub mod job;
pub mod posting;
pub mod story;
