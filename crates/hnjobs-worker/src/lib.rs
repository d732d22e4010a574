//! Background pipeline for the HN jobs service.
//!
//! This crate provides:
//! - A bounded comment queue shared by producers and the processor
//! - A scraper that discovers the current hiring thread and its new comments
//! - A processor that batches comments through the extraction client
//! - A runner that wires them together and re-arms scrape and recovery timers

pub mod processor;
pub mod queue;
pub mod runner;
pub mod scraper;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use processor::{BatchOutcome, Processor};
pub use queue::{CommentQueue, CommentReceiver, comment_queue};
pub use runner::Runner;
pub use scraper::{ScrapeReport, Scraper};
