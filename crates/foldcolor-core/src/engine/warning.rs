use crate::core::io::fasta::ReadWarning;
use itertools::Itertools;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// Non-fatal findings. Each one falls back to a safe default and never aborts a job.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    UnknownColormap {
        requested: String,
        fallback: String,
    },
    UnknownColoringMode {
        requested: String,
    },
    UnknownParameterTable {
        requested: String,
    },
    UnknownOutputStructure {
        requested: String,
    },
    UnknownRenderPolicy {
        requested: String,
    },
    DanglingModeOutOfRange {
        requested: i64,
    },
    ConstraintLengthMismatch {
        sequence: String,
        constraint_len: usize,
        sequence_len: usize,
    },
    UnsupportedColorbarFormat {
        format: String,
    },
    UnknownOrientation {
        requested: String,
    },
    UnsupportedRenderFormat {
        format: String,
    },
    InvalidResidues {
        sequence: String,
        characters: Vec<char>,
    },
    UnrecognizedExtension {
        path: PathBuf,
        extension: String,
    },
    ShapeDataUnsupported {
        file: String,
    },
    DuplicateSequenceName {
        name: String,
    },
    ProfileUnreadable {
        path: PathBuf,
        reason: String,
    },
    RenderDegraded {
        sequence: String,
        reason: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownColormap {
                requested,
                fallback,
            } => write!(
                f,
                "Colormap '{}' not found. Using '{}' instead.",
                requested, fallback
            ),
            Self::UnknownColoringMode { requested } => write!(
                f,
                "Unknown coloring mode '{}'. Coloring every residue by its pairing probability.",
                requested
            ),
            Self::UnknownParameterTable { requested } => write!(
                f,
                "Unknown parameter set '{}'. Using the Turner 2004 table.",
                requested
            ),
            Self::UnknownOutputStructure { requested } => write!(
                f,
                "Unknown output structure '{}'. Using timestamped run directories.",
                requested
            ),
            Self::UnknownRenderPolicy { requested } => write!(
                f,
                "Unknown render policy '{}'. Treating rendering as best-effort.",
                requested
            ),
            Self::DanglingModeOutOfRange { requested } => write!(
                f,
                "Dangling-end mode {} is outside 0..=3. Using mode 2.",
                requested
            ),
            Self::ConstraintLengthMismatch {
                sequence,
                constraint_len,
                sequence_len,
            } => write!(
                f,
                "Constraint string length ({}) does not match sequence length ({}) for '{}'. Ignoring.",
                constraint_len, sequence_len, sequence
            ),
            Self::UnsupportedColorbarFormat { format } => write!(
                f,
                "Unsupported color bar format '{}'. Skipping.",
                format
            ),
            Self::UnknownOrientation { requested } => write!(
                f,
                "Unknown color bar orientation '{}'. Using 'horizontal'.",
                requested
            ),
            Self::UnsupportedRenderFormat { format } => write!(
                f,
                "Unsupported render format '{}'. Skipping.",
                format
            ),
            Self::InvalidResidues {
                sequence,
                characters,
            } => {
                let chars = characters.iter().join(", ");
                write!(
                    f,
                    "Invalid characters found in sequence '{}': {}",
                    sequence, chars
                )
            }
            Self::UnrecognizedExtension { path, extension } => write!(
                f,
                "Input '{}' has unrecognized extension '{}'. Reading it as FASTA.",
                path.display(),
                extension
            ),
            Self::ShapeDataUnsupported { file } => write!(
                f,
                "SHAPE reactivity data '{}' was requested but is not supported. Skipping.",
                file
            ),
            Self::DuplicateSequenceName { name } => write!(
                f,
                "More than one input record is named '{}'. Their output directories will overwrite each other.",
                name
            ),
            Self::ProfileUnreadable { path, reason } => write!(
                f,
                "Profile '{}' could not be loaded ({}). Using defaults.",
                path.display(),
                reason
            ),
            Self::RenderDegraded { sequence, reason } => {
                write!(f, "Rendering failed for '{}': {}", sequence, reason)
            }
        }
    }
}

impl From<ReadWarning> for ConfigWarning {
    fn from(warning: ReadWarning) -> Self {
        match warning {
            ReadWarning::InvalidResidues {
                sequence,
                characters,
            } => Self::InvalidResidues {
                sequence,
                characters,
            },
            ReadWarning::UnrecognizedExtension { path, extension } => {
                Self::UnrecognizedExtension { path, extension }
            }
        }
    }
}

/// Collects warnings, logging each one as it is raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings(Vec<ConfigWarning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, warning: ConfigWarning) {
        warn!("{}", warning);
        self.0.push(warning);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ConfigWarning> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_collects_in_order() {
        let mut warnings = Warnings::new();
        warnings.raise(ConfigWarning::UnknownColoringMode {
            requested: "rainbow".to_string(),
        });
        warnings.raise(ConfigWarning::DanglingModeOutOfRange { requested: 7 });
        let collected = warnings.into_vec();
        assert_eq!(collected.len(), 2);
        assert!(matches!(
            collected[1],
            ConfigWarning::DanglingModeOutOfRange { requested: 7 }
        ));
    }

    #[test]
    fn read_warnings_convert() {
        let warning: ConfigWarning = ReadWarning::InvalidResidues {
            sequence: "x".to_string(),
            characters: vec!['N', 'X'],
        }
        .into();
        assert_eq!(
            warning.to_string(),
            "Invalid characters found in sequence 'x': N, X"
        );
    }
}
