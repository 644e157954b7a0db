//! Error types for field parsing, index patching and generation
//!
//! Field-level problems are collected rather than returned one at a time, so
//! a single invocation can report every bad token. [`GenerationError`] is the
//! terminal error of one `generate` run and knows which phase it ended in.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::scaffold::field_type::BaseType;
use crate::scaffold::generator::{FileOutcome, GenerationPhase};

/// Error produced while parsing or validating a single field token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Token has no `:` separator or an unusable name
    #[error("malformed field token '{token}': {reason}")]
    MalformedToken {
        /// Offending token (or name segment)
        token: String,
        /// Human-readable reason
        reason: String,
    },

    /// A character that is neither part of an identifier nor a known marker
    #[error("unknown modifier '{found}' in field name '{segment}'. Valid markers: ^ (unique), trailing _ (optional), _hashed, _encrypted")]
    UnknownModifier {
        /// Name segment as typed
        segment: String,
        /// First character that could not be interpreted
        found: char,
    },

    /// Type segment does not match the type grammar
    #[error("unknown field type '{segment}'. Supported types: str, int, float, bool, datetime, date, dict, list, list:<type>, ref:Model, list:ref:Model")]
    UnknownType {
        /// Offending type segment
        segment: String,
    },

    /// Target of `ref:` is not a simple identifier
    #[error("invalid model reference '{reference}'. Must start with a letter and contain only letters, digits and underscores")]
    InvalidModelReference {
        /// Offending reference
        reference: String,
    },

    /// Modifiers and type cannot be combined on one field
    #[error("conflicting attributes on field '{field}': {reason}")]
    ConflictingFieldAttributes {
        /// Canonical field name
        field: String,
        /// What conflicts
        reason: ConflictReason,
    },

    /// Two tokens resolve to the same canonical name
    #[error("duplicate field name '{name}' (already declared by '{first_token}')")]
    DuplicateFieldName {
        /// Canonical field name
        name: String,
        /// Token that declared the name first
        first_token: String,
    },

    /// Custom controller action is malformed or collides with another handler
    #[error("invalid action '{action}': {reason}")]
    InvalidAction {
        /// Action as typed (`method:name`)
        action: String,
        /// Human-readable reason
        reason: String,
    },
}

/// Reason for [`FieldError::ConflictingFieldAttributes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// A relation cannot be hashed or encrypted
    TransformOnRelation,
    /// Only string fields can carry a security transform
    TransformOnNonString(BaseType),
    /// `hashed` and `encrypted` requested together
    MultipleTransforms,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransformOnRelation => {
                write!(f, "a reference field cannot be hashed or encrypted")
            }
            Self::TransformOnNonString(base) => {
                write!(f, "only str fields can be hashed or encrypted, found {base}")
            }
            Self::MultipleTransforms => {
                write!(f, "a field cannot be both hashed and encrypted")
            }
        }
    }
}

/// A [`FieldError`] tied to the token that caused it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("#{position} '{token}': {error}")]
pub struct TokenError {
    /// 1-based position of the token on the command line
    pub position: usize,
    /// Token as typed
    pub token: String,
    /// What went wrong
    pub error: FieldError,
}

/// One problem found while validating a generation request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Resource name is not an identifier
    #[error("invalid resource name '{name}'. Must start with a letter and contain only letters, digits and underscores")]
    InvalidResourceName {
        /// Name as typed
        name: String,
    },

    /// Model and scaffold generation need at least one field
    #[error("at least one field must be specified")]
    NoFields,

    /// A field token or action failed
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// All validation problems of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Resource name as typed
    pub resource: String,
    /// Every problem found, in input order
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let resource = &self.resource;
        write!(f, "{count} problem(s) in definition of '{resource}'")?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

/// File system failure while reading or replacing a file
#[derive(Debug, Error)]
pub enum IndexPatchError {
    /// Underlying I/O operation failed
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        /// Operation that failed (read, write, replace, create directory)
        op: &'static str,
        /// File or directory involved
        path: PathBuf,
        /// Cause
        #[source]
        source: io::Error,
    },
}

impl IndexPatchError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Writes that completed before a failure, plus what did not happen
#[derive(Debug)]
pub struct PartialWrite {
    /// Files written (or confirmed unchanged) before the failure
    pub written: Vec<FileOutcome>,
    /// File whose write failed
    pub failed: PathBuf,
    /// Why it failed
    pub source: IndexPatchError,
    /// Files never attempted
    pub pending: Vec<PathBuf>,
}

impl fmt::Display for PartialWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = &self.source;
        write!(f, "generation stopped part-way: {source}")?;
        for outcome in &self.written {
            write!(f, "\n  written: {}", outcome.path.display())?;
        }
        write!(f, "\n  failed:  {}", self.failed.display())?;
        for path in &self.pending {
            write!(f, "\n  skipped: {}", path.display())?;
        }
        Ok(())
    }
}

/// Terminal error of a generation run
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Input failed validation; nothing was written
    #[error("{0}")]
    Rejected(Rejection),

    /// Artifacts already exist with different content; nothing was written
    #[error("refusing to overwrite existing artifact(s): {}. Pass --force to replace them", display_paths(.paths))]
    ArtifactsExist {
        /// Existing artifact files
        paths: Vec<PathBuf>,
    },

    /// Two planned writes resolve to the same file; nothing was written
    #[error("{} and {} would both be written to {}. Configure separate directories", .first, .second, .path.display())]
    PathCollision {
        /// Shared file
        path: PathBuf,
        /// Label of the first write
        first: String,
        /// Label of the second write
        second: String,
    },

    /// A template failed to render; nothing was written
    #[error("failed to render template: {0}")]
    Render(#[from] minijinja::Error),

    /// Reading existing files failed before any write; nothing was written
    #[error(transparent)]
    Io(#[from] IndexPatchError),

    /// Some files were written before a write failed
    #[error("{0}")]
    PartiallyWritten(PartialWrite),
}

impl GenerationError {
    /// Terminal phase this error represents
    #[must_use]
    pub const fn phase(&self) -> GenerationPhase {
        match self {
            Self::PartiallyWritten(_) => GenerationPhase::PartiallyWritten,
            _ => GenerationPhase::Failed,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
