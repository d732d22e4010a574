//! # hnjobs-database
//!
//! PostgreSQL connection management, repositories for stories, comments,
//! and jobs, and the [`PipelineStore`] contract the pipeline is written
//! against.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{JobTransaction, PgPipelineStore, PipelineStore};
