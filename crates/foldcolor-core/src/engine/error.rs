use crate::core::color::catalog::CatalogError;
use crate::core::io::fasta::FastaError;
use crate::core::structure::StructureError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Folding failed for '{sequence}': {reason}")]
    Folding { sequence: String, reason: String },

    #[error("Rendering failed for '{sequence}' ({status}): {stderr}")]
    Render {
        sequence: String,
        status: String,
        stderr: String,
    },

    #[error("Required dependency '{name}' is missing: {hint}")]
    DependencyMissing { name: String, hint: String },

    #[error("Invalid structure: {0}")]
    Structure(#[from] StructureError),

    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Colormap catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Color bar generation failed: {0}")]
    Colorbar(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<FastaError> for EngineError {
    fn from(error: FastaError) -> Self {
        Self::Input(error.to_string())
    }
}
