//! Artifact locations
//!
//! Maps logical artifact ids (`models/post`, `controllers/posts`) to files and
//! aggregators of the host project. The generator only talks to the
//! [`ArtifactLocator`] trait so other layouts can be plugged in.

use std::fmt;
use std::path::PathBuf;

use super::index::RegistrationPattern;
use crate::config::LayoutSettings;

/// Category of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Record definition
    Model,
    /// Request handlers
    Controller,
}

impl ArtifactKind {
    /// Category prefix used in logical ids
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Controller => "controllers",
        }
    }
}

/// Logical id of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId {
    /// Category
    pub kind: ArtifactKind,
    /// Module name inside the category (`post`, `posts`)
    pub module: String,
}

impl ArtifactId {
    /// Build an id
    #[must_use]
    pub fn new(kind: ArtifactKind, module: impl Into<String>) -> Self {
        Self {
            kind,
            module: module.into(),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.category(), self.module)
    }
}

/// Resolves where artifacts and their aggregators live
///
/// Paths are relative to the project root.
pub trait ArtifactLocator {
    /// File holding an artifact
    fn artifact_path(&self, id: &ArtifactId) -> PathBuf;

    /// Aggregator for a category
    fn index_path(&self, kind: ArtifactKind) -> PathBuf;

    /// Line that registers an artifact in its aggregator
    fn registration_line(&self, id: &ArtifactId) -> String;

    /// First line(s) of a newly created aggregator
    fn index_header(&self, kind: ArtifactKind) -> String;

    /// How registration lines are recognised
    fn registration_pattern(&self) -> RegistrationPattern;
}

/// Layout driven by [`LayoutSettings`]: `src/models/<module>.rs` registered in
/// `src/models/mod.rs`, `src/handlers/<module>.rs` in `src/handlers/mod.rs`
#[derive(Debug, Clone)]
pub struct ConventionalLocator {
    layout: LayoutSettings,
    pattern: RegistrationPattern,
}

impl ConventionalLocator {
    /// Locator for a layout
    #[must_use]
    pub fn new(layout: LayoutSettings) -> Self {
        Self {
            layout,
            pattern: RegistrationPattern::rust_module(),
        }
    }

    fn dir(&self, kind: ArtifactKind) -> &PathBuf {
        match kind {
            ArtifactKind::Model => &self.layout.models_dir,
            ArtifactKind::Controller => &self.layout.controllers_dir,
        }
    }
}

impl ArtifactLocator for ConventionalLocator {
    fn artifact_path(&self, id: &ArtifactId) -> PathBuf {
        self.dir(id.kind).join(format!("{}.rs", id.module))
    }

    fn index_path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir(kind).join(&self.layout.index_file)
    }

    fn registration_line(&self, id: &ArtifactId) -> String {
        self.pattern.line_for(&id.module)
    }

    fn index_header(&self, kind: ArtifactKind) -> String {
        match kind {
            ArtifactKind::Model => "//! Data models".to_string(),
            ArtifactKind::Controller => "//! HTTP request handlers".to_string(),
        }
    }

    fn registration_pattern(&self) -> RegistrationPattern {
        self.pattern.clone()
    }
}
