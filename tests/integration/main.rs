//! End-to-end pipeline tests against in-memory collaborators.

mod helpers;
mod pipeline_test;
mod recovery_test;
