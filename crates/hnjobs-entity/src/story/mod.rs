//! Hiring thread entities.

pub mod model;

pub use model::Story;
