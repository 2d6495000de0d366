//! # Workflows Module
//!
//! High-level entry points that chain the engine stages into complete runs.
//!
//! - **Sequence pipeline** ([`sequence`]) - Folds one record and writes every per-sequence
//!   artifact: reports, Vienna file, colorbar legends, the RNArtist script and, when a
//!   renderer is available, the rendered images.
//! - **Batch orchestrator** ([`batch`]) - Collects input files, checks external tools,
//!   dispatches one job per record onto a worker pool and writes the run-level
//!   `master_summary.txt` and `error_log.txt`.
//!
//! Both report progress through [`crate::engine::progress::ProgressReporter`] and never
//! read global state: everything a job needs arrives in its
//! [`crate::engine::config::PipelineConfig`].

pub mod batch;
pub mod sequence;
