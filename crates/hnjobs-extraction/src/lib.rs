//! # hnjobs-extraction
//!
//! Sends batches of raw comment text to a hosted language model and
//! returns structured [`JobPosting`](hnjobs_entity::posting::JobPosting)s.
//!
//! The pipeline only sees the [`JobExtractor`] trait; [`GeminiExtractor`]
//! is the provider implementation and keeps every transport detail to
//! itself.

pub mod error;
pub mod extractor;
pub mod gemini;
pub mod prompt;
pub mod schema;

pub use error::{ExtractionError, ExtractionResult, classify};
pub use extractor::{JobExtractor, assign_ids, validate_batch};
pub use gemini::GeminiExtractor;
