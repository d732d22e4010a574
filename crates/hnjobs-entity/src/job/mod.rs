//! Persisted job entities.

pub mod model;

pub use model::{Job, TechStack};
