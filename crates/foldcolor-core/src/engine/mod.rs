//! # Engine Module
//!
//! The per-sequence stages of the pipeline. Each stage is a plain function or a small trait
//! object that takes an explicit configuration value and returns a result; the ordering of
//! stages and the fan-out over sequences live in [`crate::workflows`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`], [`profile`], [`model`]) - JSON profile parsing, the model
//!   configurator, and the immutable [`config::PipelineConfig`] shared by every job
//! - **Folding** ([`folding`], [`rnafold`]) - the backend trait, output validation, and the
//!   `RNAfold` command-line backend
//! - **Analysis** ([`probability`], [`coloring`]) - per-residue pairing mass and colors
//! - **Artifacts** ([`report`], [`colorbar`], [`script`]) - text reports, legend images, and
//!   the renderer script
//! - **Rendering** ([`render`]) - the external renderer invoker
//! - **Diagnostics** ([`error`], [`warning`], [`progress`]) - fatal errors, collected
//!   warnings, and progress events

pub mod coloring;
pub mod colorbar;
pub mod config;
pub mod error;
pub mod folding;
pub mod model;
pub mod probability;
pub mod profile;
pub mod progress;
pub mod render;
pub mod report;
pub mod rnafold;
pub mod script;
pub mod warning;
