use super::error::EngineError;
use super::model::ModelConfig;
use crate::core::models::fold::{BasePairProbability, FoldResult, active_entries};
use crate::core::models::sequence::SequenceRecord;
use thiserror::Error;
use tracing::{debug, instrument};

/// Gas constant in kcal/(mol·K).
pub const GAS_CONSTANT: f64 = 0.001_987_17;

const CONSTRAINT_CHARS: &[char] = &['.', '(', ')', 'x', '<', '>', '|'];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FoldingError {
    #[error("{name} is not available: {hint}")]
    BackendUnavailable { name: String, hint: String },
    #[error("backend rejected the input: {0}")]
    Rejected(String),
    #[error("invalid constraint character '{character}' at position {position}")]
    InvalidConstraint { character: char, position: usize },
    #[error("structure length {structure_len} does not match sequence length {sequence_len}")]
    StructureLength {
        structure_len: usize,
        sequence_len: usize,
    },
    #[error("pairing entry ({i}, {j}) is outside 1 <= i < j <= {len}")]
    PairOutOfRange { i: usize, j: usize, len: usize },
    #[error("malformed backend output: {0}")]
    MalformedOutput(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MfeSolution {
    pub structure: String,
    pub mfe: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnsembleSolution {
    pub ensemble_energy: f64,
    pub pairing_list: Vec<BasePairProbability>,
    pub mean_bp_distance: f64,
}

/// A thermodynamic folding backend.
///
/// Implementations are shared by every worker, so they must be stateless or internally
/// synchronized.
pub trait FoldingEngine: Send + Sync {
    fn fold_mfe(&self, sequence: &str, model: &ModelConfig) -> Result<MfeSolution, FoldingError>;

    fn fold_ensemble(
        &self,
        sequence: &str,
        model: &ModelConfig,
    ) -> Result<EnsembleSolution, FoldingError>;

    /// Checked once before any job is dispatched.
    fn check_available(&self) -> Result<(), FoldingError> {
        Ok(())
    }
}

/// Folds one record and normalizes the backend's answers into a [`FoldResult`].
///
/// The MFE is always computed. The ensemble is only computed when `partition_function` is
/// set; otherwise the pairing list is empty and every ensemble statistic is zero.
#[instrument(skip_all, fields(sequence = record.name(), length = record.len()))]
pub fn fold_record(
    engine: &dyn FoldingEngine,
    record: &SequenceRecord,
    model: &ModelConfig,
    partition_function: bool,
) -> Result<FoldResult, EngineError> {
    let to_engine_error = |error: FoldingError| match error {
        FoldingError::BackendUnavailable { name, hint } => {
            EngineError::DependencyMissing { name, hint }
        }
        other => EngineError::Folding {
            sequence: record.name().to_string(),
            reason: other.to_string(),
        },
    };

    if let Some(constraint) = &model.constraint {
        validate_constraint(constraint).map_err(to_engine_error)?;
    }

    let sequence = record.residues();
    let length = record.len();

    let mfe = engine.fold_mfe(sequence, model).map_err(to_engine_error)?;
    let structure_len = mfe.structure.chars().count();
    if structure_len != length {
        return Err(to_engine_error(FoldingError::StructureLength {
            structure_len,
            sequence_len: length,
        }));
    }
    debug!(mfe = mfe.mfe, structure = %mfe.structure, "MFE computed");

    let ensemble = if partition_function {
        let ensemble = engine
            .fold_ensemble(sequence, model)
            .map_err(to_engine_error)?;
        validate_pairing_list(&ensemble.pairing_list, length).map_err(to_engine_error)?;
        ensemble
    } else {
        EnsembleSolution::default()
    };

    let mfe_frequency = if partition_function {
        mfe_frequency(ensemble.ensemble_energy, mfe.mfe, model.kelvin())
    } else {
        0.0
    };

    Ok(FoldResult {
        structure: mfe.structure,
        mfe: mfe.mfe,
        ensemble_energy: ensemble.ensemble_energy,
        pairing_list: ensemble.pairing_list,
        mean_bp_distance: ensemble.mean_bp_distance,
        mfe_frequency,
        constraint_applied: model.constraint.is_some(),
    })
}

/// `exp((G_ensemble - G_mfe) / RT)`, or 0 when `RT` is not positive.
pub fn mfe_frequency(ensemble_energy: f64, mfe: f64, kelvin: f64) -> f64 {
    let rt = GAS_CONSTANT * kelvin;
    if rt > 0.0 {
        ((ensemble_energy - mfe) / rt).exp()
    } else {
        0.0
    }
}

fn validate_constraint(constraint: &str) -> Result<(), FoldingError> {
    match constraint
        .chars()
        .enumerate()
        .find(|(_, c)| !CONSTRAINT_CHARS.contains(c))
    {
        Some((index, character)) => Err(FoldingError::InvalidConstraint {
            character,
            position: index + 1,
        }),
        None => Ok(()),
    }
}

fn validate_pairing_list(list: &[BasePairProbability], len: usize) -> Result<(), FoldingError> {
    for entry in active_entries(list) {
        if entry.i < 1 || entry.i >= entry.j || entry.j > len {
            return Err(FoldingError::PairOutOfRange {
                i: entry.i,
                j: entry.j,
                len,
            });
        }
    }
    Ok(())
}
