/// One entry of the sparse pairing-probability list, with 1-based positions.
///
/// An entry with `i == 0 && j == 0` is a terminator: consumers stop reading at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePairProbability {
    pub i: usize,
    pub j: usize,
    pub p: f64,
}

impl BasePairProbability {
    pub fn new(i: usize, j: usize, p: f64) -> Self {
        Self { i, j, p }
    }

    pub fn sentinel() -> Self {
        Self::new(0, 0, 0.0)
    }

    pub fn is_sentinel(&self) -> bool {
        self.i == 0 && self.j == 0
    }
}

/// Iterates the entries of a pairing list up to (excluding) the first sentinel.
pub fn active_entries(
    pairing_list: &[BasePairProbability],
) -> impl Iterator<Item = &BasePairProbability> {
    pairing_list.iter().take_while(|entry| !entry.is_sentinel())
}

/// The normalized output of the folding stage for one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    /// MFE structure in dot-bracket notation, one character per residue.
    pub structure: String,
    /// Minimum free energy in kcal/mol.
    pub mfe: f64,
    /// Ensemble free energy in kcal/mol; zero when the partition function was not computed.
    pub ensemble_energy: f64,
    pub pairing_list: Vec<BasePairProbability>,
    /// Mean base-pair distance of the ensemble ("ensemble diversity").
    pub mean_bp_distance: f64,
    /// Boltzmann weight of the MFE structure within the ensemble, in `[0, 1]`.
    pub mfe_frequency: f64,
    pub constraint_applied: bool,
}

/// Per-residue reductions of a [`FoldResult`], indexed 0-based.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerBaseStats {
    pub pi: Vec<f64>,
    pub paired: Vec<bool>,
}

impl PerBaseStats {
    pub fn len(&self) -> usize {
        self.pi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pi.is_empty()
    }
}
