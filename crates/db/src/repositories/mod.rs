//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod generation_job_status_repo;
pub mod project_repo;

pub use generation_job_status_repo::GenerationJobStatusRepo;
pub use project_repo::ProjectRepo;
