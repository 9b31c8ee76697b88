//! Row structs for the tables the store reads and writes.
//!
//! Each struct is `FromRow` and converts into the matching
//! `reelforge_core` domain type.

pub mod generation_job_status;
pub mod project;
