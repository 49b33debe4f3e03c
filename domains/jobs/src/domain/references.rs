//! Repository references and the object kinds archiving can follow

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::JobError;

/// Kind of git object a reference points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Commit,
    Tag,
    Tree,
    Blob,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tag => write!(f, "tag"),
            Self::Tree => write!(f, "tree"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// A named reference of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub hash: String,
    pub kind: ObjectKind,
}

impl Reference {
    pub fn new(name: impl Into<String>, hash: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            kind,
        }
    }

    /// Only commits and annotated tags can be archived
    pub fn ensure_supported(&self) -> Result<(), JobError> {
        match self.kind {
            ObjectKind::Commit | ObjectKind::Tag => Ok(()),
            kind => Err(JobError::ReferencedObjectTypeNotSupported {
                reference: self.name.clone(),
                kind,
            }),
        }
    }
}

/// Source of the references of one repository
#[async_trait::async_trait]
pub trait Referencer: Send + Sync {
    async fn references(&self) -> Result<Vec<Reference>, JobError>;
}

/// Fetch references, dropping those pointing to unsupported objects.
///
/// Each rejection is permanent for that reference only; the remaining
/// references are still returned.
pub async fn supported_references(referencer: &dyn Referencer) -> Result<Vec<Reference>, JobError> {
    let references = referencer.references().await?;
    let mut supported = Vec::with_capacity(references.len());

    for reference in references {
        match reference.ensure_supported() {
            Ok(()) => supported.push(reference),
            Err(err) => {
                tracing::warn!(
                    reference = %reference.name,
                    hash = %reference.hash,
                    error = %err,
                    "Skipping reference"
                );
            }
        }
    }

    Ok(supported)
}
