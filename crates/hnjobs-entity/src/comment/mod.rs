//! Raw comment entities and their processing status.

pub mod model;
pub mod status;

pub use model::{Comment, NewComment};
pub use status::CommentStatus;
