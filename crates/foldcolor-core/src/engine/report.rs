//! Per-sequence flat-file reports.

use super::coloring::ColorAssignment;
use super::error::EngineError;
use crate::core::io::vienna::write_vienna;
use crate::core::models::fold::{BasePairProbability, FoldResult, PerBaseStats, active_entries};
use crate::core::structure::base_pairs;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Pairing entries at or below this probability are left out of the raw probability report.
pub const REPORT_PROBABILITY_CUTOFF: f64 = 0.00001;

/// `<dir>/<sequence>_<artifact>.<extension>`
pub fn artifact_path(dir: &Path, sequence: &str, artifact: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", sequence, artifact, extension))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub pair_probabilities: PathBuf,
    pub structure_pair_probabilities: PathBuf,
    pub per_base: PathBuf,
    pub vienna: PathBuf,
}

impl ReportPaths {
    pub fn new(dir: &Path, sequence: &str) -> Self {
        Self {
            summary: artifact_path(dir, sequence, "summary", "txt"),
            pair_probabilities: artifact_path(dir, sequence, "basepair_probabilities", "txt"),
            structure_pair_probabilities: artifact_path(
                dir,
                sequence,
                "structure_basepair_probs",
                "txt",
            ),
            per_base: artifact_path(dir, sequence, "base_pairing_probabilities_per_base", "txt"),
            vienna: artifact_path(dir, sequence, "structure", "vienna"),
        }
    }
}

pub fn write_summary<W: Write>(writer: &mut W, rna: &str, result: &FoldResult) -> io::Result<()> {
    writeln!(writer, "Sequence: {}", rna)?;
    writeln!(writer, "Structure: {}", result.structure)?;
    writeln!(writer, "MFE: {:.2}", result.mfe)?;
    writeln!(writer, "Ensemble Energy: {:.2}", result.ensemble_energy)?;
    writeln!(
        writer,
        "Frequency of MFE structure in ensemble: {:.2} %",
        result.mfe_frequency * 100.0
    )?;
    writeln!(writer, "Ensemble Diversity: {:.2}", result.mean_bp_distance)?;
    Ok(())
}

pub fn write_pair_probabilities<W: Write>(
    writer: &mut W,
    pairing_list: &[BasePairProbability],
) -> io::Result<()> {
    for entry in active_entries(pairing_list).filter(|e| e.p > REPORT_PROBABILITY_CUTOFF) {
        writeln!(writer, "P({},{}) = {:.10}", entry.i, entry.j, entry.p)?;
    }
    Ok(())
}

/// One row per MFE base pair with its ensemble probability (0 when the pair is absent).
pub fn write_structure_pair_probabilities<W: Write>(
    writer: &mut W,
    pairs: &[(usize, usize)],
    pairing_list: &[BasePairProbability],
) -> io::Result<()> {
    let lookup: HashMap<(usize, usize), f64> = active_entries(pairing_list)
        .flat_map(|e| [((e.i, e.j), e.p), ((e.j, e.i), e.p)])
        .collect();

    writeln!(writer, "i\tj\tP_ij")?;
    for &(i, j) in pairs {
        let p = lookup.get(&(i, j)).copied().unwrap_or(0.0);
        writeln!(writer, "{}\t{}\t{:.10}", i, j, p)?;
    }
    Ok(())
}

pub fn write_per_base<W: Write>(
    writer: &mut W,
    residues: &str,
    stats: &PerBaseStats,
    colors: &ColorAssignment,
) -> io::Result<()> {
    writeln!(writer, "Position\tBase\tPi\tColor_RGB")?;
    for (index, ((base, pi), color)) in residues
        .chars()
        .zip(&stats.pi)
        .zip(&colors.colors)
        .enumerate()
    {
        writeln!(writer, "{}\t{}\t{:.6}\t{}", index + 1, base, pi, color)?;
    }
    Ok(())
}

fn write_file(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| EngineError::io(path, e))
}

/// Everything the report writer needs about one folded sequence.
pub struct ReportInput<'a> {
    pub name: &'a str,
    pub residues: &'a str,
    pub rna: &'a str,
    pub result: &'a FoldResult,
    pub stats: &'a PerBaseStats,
    pub colors: &'a ColorAssignment,
}

/// Writes the four text reports and the Vienna structure file into `dir`.
pub fn write_reports(dir: &Path, input: &ReportInput<'_>) -> Result<ReportPaths, EngineError> {
    let paths = ReportPaths::new(dir, input.name);
    let pairs = base_pairs(&input.result.structure)?;

    write_file(&paths.summary, |w| write_summary(w, input.rna, input.result))?;
    write_file(&paths.pair_probabilities, |w| {
        write_pair_probabilities(w, &input.result.pairing_list)
    })?;
    write_file(&paths.structure_pair_probabilities, |w| {
        write_structure_pair_probabilities(w, &pairs, &input.result.pairing_list)
    })?;
    write_file(&paths.per_base, |w| {
        write_per_base(w, input.residues, input.stats, input.colors)
    })?;
    write_file(&paths.vienna, |w| {
        write_vienna(w, input.name, input.rna, &input.result.structure)
    })?;

    Ok(paths)
}
