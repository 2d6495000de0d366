//! # Core Module
//!
//! Stateless data structures and I/O that the rest of the library builds on. Nothing in this
//! layer spawns processes or holds configuration; every function is a plain transformation of
//! its inputs.
//!
//! ## Overview
//!
//! - **Sequence Representation** ([`models`]) - input records, fold results, per-base statistics
//! - **Structure Parsing** ([`structure`]) - stack-based dot-bracket pair matching
//! - **File I/O** ([`io`]) - FASTA reading and Vienna structure writing
//! - **Color Gradients** ([`color`]) - gradient sampling and the named colormap catalog

pub mod color;
pub mod io;
pub mod models;
pub mod structure;
