//! Domain types shared by every reelforge crate.
//!
//! Nothing in here performs I/O. The job status model, the persisted
//! status map codec, stage definitions and the generation inputs read from
//! the project store all live here so the store, provider and pipeline
//! crates agree on one vocabulary.

pub mod error;
pub mod inputs;
pub mod job_status;
pub mod stage;
pub mod types;
pub mod work_unit;
