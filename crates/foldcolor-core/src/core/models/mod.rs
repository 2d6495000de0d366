//! # Core Models Module
//!
//! Plain data carried between the pipeline stages. Every value in here is created once by a
//! producing stage and read-only afterwards.
//!
//! ## Key Components
//!
//! - [`sequence`] - Parsed input records and the derivation of filesystem-safe names
//! - [`fold`] - Folding results, pairing-probability entries and per-residue statistics

pub mod fold;
pub mod sequence;
