//! # foldcolor
//!
//! Batch RNA/DNA secondary-structure folding with base-pairing probability coloring.
//!
//! Each input sequence is folded by an external thermodynamic backend, its per-residue
//! pairing probabilities are mapped through a color gradient, flat-file reports are written,
//! and a script for the RNArtist renderer is generated and optionally executed.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same strict three-layer split throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SequenceRecord`, `FoldResult`),
//!   dot-bracket parsing, FASTA/Vienna I/O and the colormap catalog.
//!
//! - **[`engine`]: The Stages.** Model configuration, the folding adapter and its `RNAfold`
//!   backend, probability aggregation, color mapping, report and script writing, and the
//!   render invoker. Every stage takes an explicit configuration value; none reads global state.
//!
//! - **[`workflows`]: The Public API.** The per-sequence pipeline and the batch orchestrator
//!   that fans jobs out over a worker pool and writes the run-level summary.

pub mod core;
pub mod engine;
pub mod workflows;
