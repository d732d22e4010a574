//! Repository implementations for pipeline entities.

pub mod comment;
pub mod job;
pub mod story;

pub use comment::CommentRepository;
pub use job::JobRepository;
pub use story::StoryRepository;
