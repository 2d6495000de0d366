//! Reading sequence inputs and writing structure files.
//!
//! - [`fasta`] parses single- and multi-record FASTA-like text into [`SequenceRecord`]s
//! - [`vienna`] writes the three-line Vienna structure file consumed by the renderer
//!
//! [`SequenceRecord`]: crate::core::models::sequence::SequenceRecord

pub mod fasta;
pub mod vienna;
