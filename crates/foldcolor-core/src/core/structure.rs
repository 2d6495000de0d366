//! Dot-bracket structure utilities.
//!
//! Only `(` and `)` denote base pairs. Every other character (`.`, the `+` used for
//! G-quadruplex positions, ...) is treated as unpaired.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Unmatched ')' at position {position}")]
    UnmatchedClose { position: usize },
    #[error("Unmatched '(' at position {position}")]
    UnmatchedOpen { position: usize },
}

/// Returns the base pairs of a dot-bracket string as 1-based `(i, j)` tuples with `i < j`,
/// in the order their closing brackets appear.
pub fn base_pairs(structure: &str) -> Result<Vec<(usize, usize)>, StructureError> {
    let mut stack = Vec::new();
    let mut pairs = Vec::new();

    for (idx, ch) in structure.chars().enumerate() {
        let position = idx + 1;
        match ch {
            '(' => stack.push(position),
            ')' => {
                let opening = stack
                    .pop()
                    .ok_or(StructureError::UnmatchedClose { position })?;
                pairs.push((opening, position));
            }
            _ => {}
        }
    }

    if let Some(&position) = stack.last() {
        return Err(StructureError::UnmatchedOpen { position });
    }
    Ok(pairs)
}

/// Marks every position covered by a matched bracket pair.
pub fn paired_status(structure: &str) -> Result<Vec<bool>, StructureError> {
    let mut paired = vec![false; structure.chars().count()];
    for (i, j) in base_pairs(structure)? {
        paired[i - 1] = true;
        paired[j - 1] = true;
    }
    Ok(paired)
}
