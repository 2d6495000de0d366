use std::collections::BTreeSet;
use uuid::Uuid;

const VALID_RESIDUES: &[char] = &['A', 'C', 'G', 'U', 'T', 'a', 'c', 'g', 'u', 't'];

/// A single input sequence as read from a FASTA-like file.
///
/// The derived `name` is fixed at construction time, so an anonymous record keeps the same
/// synthesized name for its whole lifetime even though that name is random.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    header: Option<String>,
    name: String,
    residues: String,
}

impl SequenceRecord {
    pub fn new(header: Option<String>, residues: impl Into<String>) -> Self {
        let header = header
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        let name = derive_sequence_name(header.as_deref());
        Self {
            header,
            name,
            residues: residues.into(),
        }
    }

    /// The raw header text without the leading `>`, if the record had one.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// The filesystem-safe name used for output directories and file prefixes.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// The residues in the RNA alphabet (`T` replaced by `U`, case preserved).
    pub fn to_rna(&self) -> String {
        self.residues
            .chars()
            .map(|c| match c {
                'T' => 'U',
                't' => 'u',
                other => other,
            })
            .collect()
    }

    /// Characters outside the nucleotide alphabet, in sorted order.
    pub fn invalid_residues(&self) -> BTreeSet<char> {
        self.residues
            .chars()
            .filter(|c| !VALID_RESIDUES.contains(c))
            .collect()
    }
}

/// Sanitizes a FASTA header into a name usable as a directory component.
///
/// Takes the first whitespace-delimited token, maps `|`, space and tab to `_`, then drops
/// every character that is not alphanumeric, `_` or `-`. Returns `None` when nothing is left.
pub fn sanitize_name(header: &str) -> Option<String> {
    let token = header.split_whitespace().next()?;
    let name: String = token
        .chars()
        .map(|c| match c {
            '|' | ' ' | '\t' => '_',
            other => other,
        })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if name.is_empty() { None } else { Some(name) }
}

pub fn derive_sequence_name(header: Option<&str>) -> String {
    header
        .and_then(sanitize_name)
        .unwrap_or_else(placeholder_name)
}

fn placeholder_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("sequence_{}", &id[..8])
}
