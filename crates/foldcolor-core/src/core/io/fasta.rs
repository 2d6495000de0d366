use crate::core::models::sequence::SequenceRecord;
use itertools::Itertools;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RECOGNIZED_EXTENSIONS: &[&str] = &["fasta", "fa", "txt"];

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("I/O error reading '{source_name}': {source}")]
    Io {
        source_name: String,
        #[source]
        source: io::Error,
    },
    #[error("No sequences found in '{source_name}'")]
    NoRecords { source_name: String },
}

/// Non-fatal findings raised while reading an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadWarning {
    InvalidResidues {
        sequence: String,
        characters: Vec<char>,
    },
    UnrecognizedExtension {
        path: PathBuf,
        extension: String,
    },
}

impl fmt::Display for ReadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
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
                "File extension '{}' of '{}' is not .fasta, .fa, or .txt",
                extension,
                path.display()
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct FastaContents {
    pub records: Vec<SequenceRecord>,
    pub warnings: Vec<ReadWarning>,
}

pub struct FastaFile;

impl FastaFile {
    /// Parses every record from a buffered reader.
    ///
    /// Consecutive non-header lines accumulate onto the current record and a new `>` line
    /// closes it. A header that collected no residues is dropped. Residue lines that appear
    /// before the first header form an anonymous record.
    ///
    /// # Errors
    ///
    /// Returns [`FastaError::NoRecords`] when nothing usable was found, or
    /// [`FastaError::Io`] if reading fails.
    pub fn read_from(
        reader: &mut impl BufRead,
        source_name: &str,
    ) -> Result<FastaContents, FastaError> {
        let mut contents = FastaContents::default();
        let mut header: Option<String> = None;
        let mut residues = String::new();

        for line in reader.lines() {
            let line = line.map_err(|e| FastaError::Io {
                source_name: source_name.to_string(),
                source: e,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('>') {
                Self::close_record(&mut contents, header.take(), &mut residues);
                header = Some(rest.trim().to_string());
            } else {
                residues.push_str(line);
            }
        }
        Self::close_record(&mut contents, header, &mut residues);

        if contents.records.is_empty() {
            return Err(FastaError::NoRecords {
                source_name: source_name.to_string(),
            });
        }
        Ok(contents)
    }

    pub fn read_from_path(path: &Path) -> Result<FastaContents, FastaError> {
        if !path.is_file() {
            return Err(FastaError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|e| FastaError::Io {
            source_name: source_name.clone(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);
        let mut contents = Self::read_from(&mut reader, &source_name)?;

        if let Some(extension) = unrecognized_extension(path) {
            contents.warnings.insert(
                0,
                ReadWarning::UnrecognizedExtension {
                    path: path.to_path_buf(),
                    extension,
                },
            );
        }
        Ok(contents)
    }

    pub fn parse_str(text: &str, source_name: &str) -> Result<FastaContents, FastaError> {
        Self::read_from(&mut text.as_bytes(), source_name)
    }

    fn close_record(contents: &mut FastaContents, header: Option<String>, residues: &mut String) {
        if residues.is_empty() {
            return;
        }
        let record = SequenceRecord::new(header, std::mem::take(residues));
        let invalid = record.invalid_residues();
        if !invalid.is_empty() {
            contents.warnings.push(ReadWarning::InvalidResidues {
                sequence: record.name().to_string(),
                characters: invalid.into_iter().collect(),
            });
        }
        contents.records.push(record);
    }
}

/// Returns the lowercase extension of `path` when it is not one of the recognized FASTA
/// extensions.
pub fn unrecognized_extension(path: &Path) -> Option<String> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if RECOGNIZED_EXTENSIONS.contains(&extension.as_str()) {
        None
    } else {
        Some(extension)
    }
}
