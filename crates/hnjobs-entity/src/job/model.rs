//! Job and tech-stack entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hnjobs_core::types::{CommentId, JobId};

/// One persisted role derived from a job posting. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Locally generated identifier.
    pub id: JobId,
    /// Comment the role was extracted from.
    pub comment_id: CommentId,
    /// Company name.
    pub company: String,
    /// Short company description.
    pub company_description: Option<String>,
    /// Company homepage.
    pub company_url: Option<String>,
    /// Contact email or handle.
    pub contact: Option<String>,
    /// Role title.
    pub title: String,
    /// Role description.
    pub description: Option<String>,
    /// Role type, e.g. `"full-time"` or `"contract"`.
    pub role_type: Option<String>,
    /// Where to apply.
    pub application_url: Option<String>,
    /// Office location(s).
    pub location: Option<String>,
    /// Salary range, job-level or inherited from the posting.
    pub salary: Option<String>,
    /// Equity, job-level or inherited from the posting.
    pub equity: Option<String>,
    /// Remote work is possible.
    pub is_remote: bool,
    /// Hybrid work is possible.
    pub is_hybrid: bool,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

/// One technology tag belonging to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TechStack {
    /// Owning job.
    pub job_id: JobId,
    /// Technology name, e.g. `"Rust"`.
    pub value: String,
}
