//! Structured-output schema for the model's response.
//!
//! Mirrors [`JobPosting`](hnjobs_entity::posting::JobPosting). Every
//! property is listed in `required` so the model always emits it, with
//! `nullable` marking the ones that may be null.

use serde_json::{Value, json};

fn nullable_string() -> Value {
    json!({ "type": "STRING", "nullable": true })
}

fn string_list() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn compensation() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "base_salary": nullable_string(),
            "equity": nullable_string(),
        },
        "required": ["base_salary", "equity"],
    })
}

fn job_entry() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": nullable_string(),
            "role_type": nullable_string(),
            "application_url": nullable_string(),
            "location": nullable_string(),
            "compensation": compensation(),
            "tech_stack": string_list(),
        },
        "required": [
            "title", "description", "role_type", "application_url",
            "location", "compensation", "tech_stack",
        ],
    })
}

/// Schema for the array of postings returned per batch.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "INTEGER" },
                "is_job_posting": { "type": "BOOLEAN" },
                "company_name": nullable_string(),
                "company_description": nullable_string(),
                "company_url": nullable_string(),
                "contact": nullable_string(),
                "jobs": { "type": "ARRAY", "items": job_entry() },
                "is_remote": { "type": "BOOLEAN" },
                "is_hybrid": { "type": "BOOLEAN" },
                "general_compensation": compensation(),
                "general_tech_stack": string_list(),
            },
            "required": [
                "id", "is_job_posting", "company_name", "company_description",
                "company_url", "contact", "jobs", "is_remote", "is_hybrid",
                "general_compensation", "general_tech_stack",
            ],
        },
    })
}
