//! Prompt text sent with every extraction request.

use std::collections::BTreeMap;
use std::fmt::Write;

use hnjobs_core::types::CommentId;

/// Instructions the model follows for every batch.
pub const SYSTEM_INSTRUCTION: &str = "\
You extract structured job postings from comments in a monthly \"Who is hiring?\" thread.

You receive a numbered list of comments. Each item starts with its comment ID in the form [ID: <id>].
Return exactly one JSON object per comment, in the same order as the input, and copy the comment ID into the \"id\" field.

Rules:
- Decode HTML entities (&amp;, &#x2F;, &quot;, <p>, <a href=...>) into plain text.
- Normalize obfuscated email addresses such as \"jobs [at] acme [dot] com\" or \"jobs at acme dot com\" to \"jobs@acme.com\".
- Extract complete URLs, never truncated ones. When several links are present prefer the application, careers, or jobs page for application_url.
- Convert ALL-CAPS company names and job titles to Title Case while preserving acronyms (AI, ML, SRE, AWS, iOS, API, CTO, QA).
- Keep compensation and tech stack at the level they are stated. Put values that apply to one role in that job's compensation and tech_stack. Put values that apply to the whole company in general_compensation and general_tech_stack. Do not copy company-level values into every job.
- Set is_remote and is_hybrid for the posting as a whole. Both may be true when roles mix arrangements.
- If a comment is not a job posting (a question, a reply, a complaint), set is_job_posting to false and leave jobs empty.
- Every declared field must be present. Use null for unknown values and [] for empty lists.

Output a bare JSON array and nothing else. No markdown, no citations, no commentary.";

/// Render a batch as a numbered list in ascending comment-ID order.
pub fn build_user_prompt(inputs: &BTreeMap<CommentId, String>) -> String {
    let mut prompt = String::new();
    for (n, (id, text)) in inputs.iter().enumerate() {
        if n > 0 {
            prompt.push_str("\n\n");
        }
        let _ = write!(prompt, "{}. [ID: {}]\n{}", n + 1, id, text.trim());
    }
    prompt
}
