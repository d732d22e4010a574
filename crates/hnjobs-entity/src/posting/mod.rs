//! Transient extraction results returned by the language model.

pub mod model;

pub use model::{Compensation, JobEntry, JobPosting, ResolvedJob};
