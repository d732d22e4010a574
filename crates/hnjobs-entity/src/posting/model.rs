//! Structured job posting as extracted from one comment.
//!
//! The model is asked to emit every field even when null, so every
//! optional field tolerates `null` as well as absence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use hnjobs_core::types::{CommentId, JobId};

use crate::job::Job;

/// Salary and equity, either for one role or for the whole posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    /// Base salary or range, e.g. `"$100k-$150k"`.
    #[serde(default)]
    pub base_salary: Option<String>,
    /// Equity description, e.g. `"0.1%-0.5%"`.
    #[serde(default)]
    pub equity: Option<String>,
}

/// One role inside a posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    /// Role title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Role description.
    #[serde(default)]
    pub description: Option<String>,
    /// Role type, e.g. `"full-time"`.
    #[serde(default)]
    pub role_type: Option<String>,
    /// Where to apply for this role.
    #[serde(default)]
    pub application_url: Option<String>,
    /// Office location(s).
    #[serde(default)]
    pub location: Option<String>,
    /// Role-level compensation; overrides the posting's.
    #[serde(default, deserialize_with = "null_as_default")]
    pub compensation: Compensation,
    /// Role-level tech stack; overrides the posting's.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
}

/// The model's interpretation of one comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Comment the posting was extracted from. Absent if the model dropped it.
    #[serde(default)]
    pub id: Option<CommentId>,
    /// `false` for replies that are not job postings at all.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_job_posting: bool,
    /// Company name.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Short company description.
    #[serde(default)]
    pub company_description: Option<String>,
    /// Company homepage.
    #[serde(default)]
    pub company_url: Option<String>,
    /// Contact email or handle.
    #[serde(default)]
    pub contact: Option<String>,
    /// Roles advertised in the comment.
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<JobEntry>,
    /// Remote work is offered.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_remote: bool,
    /// Hybrid work is offered.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_hybrid: bool,
    /// Compensation that applies to every role unless overridden.
    #[serde(default, deserialize_with = "null_as_default")]
    pub general_compensation: Compensation,
    /// Tech stack that applies to every role unless overridden.
    #[serde(default, deserialize_with = "null_as_default")]
    pub general_tech_stack: Vec<String>,
}

/// A job row ready to insert, with its resolved tags.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    /// Row for the `jobs` table.
    pub job: Job,
    /// Rows for the `tech_stack` table.
    pub tech_stack: Vec<String>,
}

impl JobPosting {
    /// Whether this posting should produce job rows.
    pub fn has_jobs(&self) -> bool {
        self.is_job_posting && !self.jobs.is_empty()
    }

    /// Turn every role into a job row.
    ///
    /// Job-level compensation and tech stack win; when a job leaves them
    /// empty the posting-level `general_*` values are used. The two are
    /// never merged.
    pub fn resolve_jobs(&self, comment_id: CommentId, now: DateTime<Utc>) -> Vec<ResolvedJob> {
        if !self.is_job_posting {
            return Vec::new();
        }

        let company = non_empty(&self.company_name).unwrap_or_default();

        self.jobs
            .iter()
            .map(|entry| {
                let tech_stack = if cleaned(&entry.tech_stack).is_empty() {
                    cleaned(&self.general_tech_stack)
                } else {
                    cleaned(&entry.tech_stack)
                };

                let job = Job {
                    id: JobId::new(),
                    comment_id,
                    company: company.clone(),
                    company_description: non_empty(&self.company_description),
                    company_url: non_empty(&self.company_url),
                    contact: non_empty(&self.contact),
                    title: entry.title.trim().to_string(),
                    description: non_empty(&entry.description),
                    role_type: non_empty(&entry.role_type),
                    application_url: non_empty(&entry.application_url),
                    location: non_empty(&entry.location),
                    salary: non_empty(&entry.compensation.base_salary)
                        .or_else(|| non_empty(&self.general_compensation.base_salary)),
                    equity: non_empty(&entry.compensation.equity)
                        .or_else(|| non_empty(&self.general_compensation.equity)),
                    is_remote: self.is_remote,
                    is_hybrid: self.is_hybrid,
                    created_at: now,
                };

                ResolvedJob { job, tech_stack }
            })
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn cleaned(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|existing| existing.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    out
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
