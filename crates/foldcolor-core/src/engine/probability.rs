use super::error::EngineError;
use crate::core::models::fold::{BasePairProbability, FoldResult, PerBaseStats, active_entries};
use crate::core::structure::paired_status;

/// Sums, for every position, the probability of each pairing entry touching it.
///
/// The result can exceed 1.0 when several candidate partners contribute.
pub fn pairing_mass(pairing_list: &[BasePairProbability], length: usize) -> Vec<f64> {
    let mut pi = vec![0.0; length];
    for entry in active_entries(pairing_list) {
        for position in [entry.i, entry.j] {
            if let Some(slot) = position.checked_sub(1).and_then(|k| pi.get_mut(k)) {
                *slot += entry.p;
            }
        }
    }
    pi
}

/// Reduces a fold result to per-residue pairing mass and MFE paired status.
pub fn per_base_stats(result: &FoldResult, length: usize) -> Result<PerBaseStats, EngineError> {
    let paired = paired_status(&result.structure)?;
    if paired.len() != length {
        return Err(EngineError::Internal(format!(
            "structure covers {} positions but the sequence has {}",
            paired.len(),
            length
        )));
    }
    Ok(PerBaseStats {
        pi: pairing_mass(&result.pairing_list, length),
        paired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(structure: &str, pairing_list: Vec<BasePairProbability>) -> FoldResult {
        FoldResult {
            structure: structure.to_string(),
            mfe: -1.0,
            ensemble_energy: -1.2,
            pairing_list,
            mean_bp_distance: 0.0,
            mfe_frequency: 0.5,
            constraint_applied: false,
        }
    }

    #[test]
    fn mass_accumulates_on_both_partners() {
        let list = vec![
            BasePairProbability::new(1, 8, 0.6),
            BasePairProbability::new(1, 7, 0.3),
            BasePairProbability::new(2, 7, 0.5),
            BasePairProbability::sentinel(),
        ];
        let pi = pairing_mass(&list, 8);
        assert!((pi[0] - 0.9).abs() < 1e-12);
        assert!((pi[1] - 0.5).abs() < 1e-12);
        assert!((pi[6] - 0.8).abs() < 1e-12);
        assert!((pi[7] - 0.6).abs() < 1e-12);
        assert_eq!(pi[3], 0.0);
    }

    #[test]
    fn mass_can_exceed_one() {
        let list = vec![
            BasePairProbability::new(1, 5, 0.7),
            BasePairProbability::new(1, 6, 0.6),
        ];
        assert!(pairing_mass(&list, 6)[0] > 1.0);
    }

    #[test]
    fn stats_lengths_match_sequence() {
        let fold = result("((....))", vec![BasePairProbability::new(1, 8, 0.9)]);
        let stats = per_base_stats(&fold, 8).unwrap();
        assert_eq!(stats.pi.len(), 8);
        assert_eq!(stats.paired.len(), 8);
        assert_eq!(
            stats.paired,
            vec![true, true, false, false, false, false, true, true]
        );
    }

    #[test]
    fn empty_pairing_list_gives_zero_mass() {
        let stats = per_base_stats(&result("....", Vec::new()), 4).unwrap();
        assert_eq!(stats.pi, vec![0.0; 4]);
    }

    #[test]
    fn unbalanced_structure_is_an_error() {
        let err = per_base_stats(&result("(..))", Vec::new()), 5).unwrap_err();
        assert!(matches!(err, EngineError::Structure(_)));
    }
}
