//! Generation orchestrator
//!
//! One `generate` run is split in two steps so callers can inspect what is
//! about to happen:
//!
//! - [`Generator::plan`] parses and validates the request, renders every
//!   artifact, reads existing files and computes the aggregator patches.
//!   Nothing is written, so a failure here leaves the project untouched.
//! - [`Generator::apply`] writes the plan: artifacts first, then aggregators,
//!   each replaced atomically. A failed write is reported with the files
//!   already written; nothing is rolled back.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, instrument};

use super::action::ControllerAction;
use super::index::{read_optional, write_atomic, IndexPatcher};
use super::locator::{ArtifactId, ArtifactLocator, ConventionalLocator};
use super::renderer::{RenderOptions, TemplateRenderer};
use super::resource::ResourceDescriptor;
use crate::config::ProjectContext;
use crate::error::{
    FieldError, GenerationError, PartialWrite, Rejection, TokenError, ValidationError,
};

/// What to generate for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Model artifact only
    Model,
    /// Controller artifact only
    Controller,
    /// Model and controller
    Scaffold,
}

impl ResourceKind {
    /// Whether a model artifact is produced
    #[must_use]
    pub const fn includes_model(self) -> bool {
        matches!(self, Self::Model | Self::Scaffold)
    }

    /// Whether a controller artifact is produced
    #[must_use]
    pub const fn includes_controller(self) -> bool {
        matches!(self, Self::Controller | Self::Scaffold)
    }

    /// Whether at least one field is required
    #[must_use]
    pub const fn requires_fields(self) -> bool {
        self.includes_model()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Controller => write!(f, "controller"),
            Self::Scaffold => write!(f, "scaffold"),
        }
    }
}

/// Input of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// What to generate
    pub kind: ResourceKind,
    /// Resource name as typed
    pub resource: String,
    /// Field tokens in declaration order
    pub fields: Vec<String>,
    /// Custom controller actions (`get:search`)
    pub actions: Vec<String>,
    /// Overwrite artifacts whose content differs
    pub force: bool,
}

impl GenerateRequest {
    /// Request without fields or actions
    #[must_use]
    pub fn new(kind: ResourceKind, resource: impl Into<String>) -> Self {
        Self {
            kind,
            resource: resource.into(),
            fields: Vec::new(),
            actions: Vec::new(),
            force: false,
        }
    }

    /// Set the field tokens
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the custom actions
    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Allow overwriting differing artifacts
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Where a run is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationPhase {
    /// Splitting and resolving tokens
    Parsing,
    /// Cross-field and request checks
    Validating,
    /// Rendering artifacts and planning patches
    Rendering,
    /// Writing files
    Patching,
    /// Every write completed
    Done,
    /// Stopped before anything was written
    Failed,
    /// Stopped after some files were written
    PartiallyWritten,
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsing => "parsing",
            Self::Validating => "validating",
            Self::Rendering => "rendering",
            Self::Patching => "patching",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::PartiallyWritten => "partially written",
        };
        f.write_str(name)
    }
}

/// Whether a file is a generated artifact or an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    /// Model or controller module
    Artifact,
    /// `mod.rs` registering artifacts
    Index,
}

/// Effect of a write on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    /// File did not exist
    Created,
    /// File existed with other content
    Updated,
    /// File already had this content; not rewritten
    Unchanged,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.pad("create"),
            Self::Updated => f.pad("update"),
            Self::Unchanged => f.pad("identical"),
        }
    }
}

/// One file the plan will write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    /// `models/post`, `models index`, ...
    pub label: String,
    /// Absolute path
    pub path: PathBuf,
    /// Content on disk when the plan was made
    pub previous: Option<String>,
    /// Content to write
    pub content: String,
    /// Artifact or aggregator
    pub role: FileRole,
}

impl PlannedWrite {
    /// What applying this write does
    #[must_use]
    pub fn action(&self) -> FileAction {
        match &self.previous {
            None => FileAction::Created,
            Some(previous) if *previous == self.content => FileAction::Unchanged,
            Some(_) => FileAction::Updated,
        }
    }
}

/// Validated, rendered and patched output of [`Generator::plan`]
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    /// What was requested
    pub kind: ResourceKind,
    /// Validated resource
    pub resource: ResourceDescriptor,
    /// Artifact ids produced
    pub artifacts: Vec<ArtifactId>,
    /// Writes, artifacts before aggregators
    pub writes: Vec<PlannedWrite>,
}

impl GenerationPlan {
    /// Whether applying the plan would change nothing
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.writes
            .iter()
            .all(|write| write.action() == FileAction::Unchanged)
    }
}

/// One file handled by [`Generator::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Absolute path
    pub path: PathBuf,
    /// `models/post`, `models index`, ...
    pub label: String,
    /// What happened
    pub action: FileAction,
    /// Artifact or aggregator
    pub role: FileRole,
}

/// Successful result of a run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Resource name
    pub resource: String,
    /// What was requested
    pub kind: ResourceKind,
    /// Always [`GenerationPhase::Done`]
    pub phase: GenerationPhase,
    /// Artifact ids produced
    pub artifacts: Vec<ArtifactId>,
    /// Every file, in write order
    pub files: Vec<FileOutcome>,
}

impl GenerationReport {
    /// Files whose content changed
    pub fn changed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|file| file.action != FileAction::Unchanged)
    }
}

/// Plans and applies generation runs for one project
#[derive(Debug)]
pub struct Generator<'a, L: ArtifactLocator> {
    context: &'a ProjectContext,
    locator: L,
    renderer: TemplateRenderer,
}

impl<'a> Generator<'a, ConventionalLocator> {
    /// Generator using the configured layout and template overrides
    ///
    /// # Errors
    ///
    /// Returns an error if a template override cannot be read or compiled
    pub fn for_project(context: &'a ProjectContext) -> Result<Self, GenerationError> {
        let renderer = match context.template_dir() {
            Some(dir) => TemplateRenderer::with_overrides(&dir)?,
            None => TemplateRenderer::new()?,
        };
        let locator = ConventionalLocator::new(context.config.layout.clone());
        Ok(Self::new(context, locator, renderer))
    }
}

impl<'a, L: ArtifactLocator> Generator<'a, L> {
    /// Generator with an explicit locator and renderer
    #[must_use]
    pub const fn new(context: &'a ProjectContext, locator: L, renderer: TemplateRenderer) -> Self {
        Self {
            context,
            locator,
            renderer,
        }
    }

    /// Plan and apply in one step
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::plan`] or [`Self::apply`]
    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerationReport, GenerationError> {
        let plan = self.plan(request)?;
        self.apply(plan)
    }

    /// Validate, render and compute every write without touching the disk
    ///
    /// # Errors
    ///
    /// - [`GenerationError::Rejected`] with every validation problem
    /// - [`GenerationError::Render`] if a template fails
    /// - [`GenerationError::Io`] if an existing file cannot be read
    /// - [`GenerationError::PathCollision`] if two writes resolve to one file
    /// - [`GenerationError::ArtifactsExist`] if an artifact exists with
    ///   different content and neither the request nor the configuration
    ///   forces an overwrite
    #[instrument(skip(self, request), fields(resource = %request.resource, kind = %request.kind))]
    pub fn plan(&self, request: &GenerateRequest) -> Result<GenerationPlan, GenerationError> {
        transition(GenerationPhase::Parsing);
        let parsed = ResourceDescriptor::parse(&request.resource, &request.fields);
        let actions = parse_actions(request);

        transition(GenerationPhase::Validating);
        let mut errors = Vec::new();
        let resource = match parsed {
            Ok(resource) => Some(resource),
            Err(found) => {
                errors.extend(found);
                None
            }
        };
        if request.kind.requires_fields() && request.fields.is_empty() {
            errors.push(ValidationError::NoFields);
        }
        let actions = actions.unwrap_or_else(|found| {
            errors.extend(found);
            Vec::new()
        });

        let resource = match resource {
            Some(resource) if errors.is_empty() => resource,
            _ => {
                debug!(problems = errors.len(), "Request rejected");
                return Err(GenerationError::Rejected(Rejection {
                    resource: request.resource.clone(),
                    errors,
                }));
            }
        };

        transition(GenerationPhase::Rendering);
        let options = RenderOptions::from_layout(&self.context.config.layout);
        let mut rendered = Vec::new();
        if request.kind.includes_model() {
            let content = self.renderer.render_model(&resource, &options)?;
            rendered.push((resource.model_file_id(), content));
        }
        if request.kind.includes_controller() {
            let content = self.renderer.render_controller(&resource, &actions, &options)?;
            rendered.push((resource.controller_file_id(), content));
        }

        let mut writes = Vec::new();
        for (id, content) in &rendered {
            let path = self.context.root.join(self.locator.artifact_path(id));
            let previous = read_optional(&path)?;
            writes.push(PlannedWrite {
                label: id.to_string(),
                path,
                previous,
                content: content.clone(),
                role: FileRole::Artifact,
            });
        }

        check_distinct_paths(&writes)?;

        let force = request.force || self.context.config.generate.force;
        let conflicts: Vec<PathBuf> = writes
            .iter()
            .filter(|write| write.action() == FileAction::Updated)
            .map(|write| write.path.clone())
            .collect();
        if !conflicts.is_empty() {
            if !force {
                debug!(conflicts = conflicts.len(), "Existing artifacts differ");
                return Err(GenerationError::ArtifactsExist { paths: conflicts });
            }
            info!(conflicts = conflicts.len(), "Overwriting existing artifacts");
        }

        let artifacts: Vec<ArtifactId> = rendered.into_iter().map(|(id, _)| id).collect();
        for id in &artifacts {
            self.plan_registration(id, &mut writes)?;
        }
        check_distinct_paths(&writes)?;

        Ok(GenerationPlan {
            kind: request.kind,
            resource,
            artifacts,
            writes,
        })
    }

    /// Write a plan: artifacts first, then aggregators
    ///
    /// Files whose content is already up to date are not rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::PartiallyWritten`] if a write fails. It lists
    /// the files handled before the failure (possibly none), which are left in
    /// place, and the files never attempted.
    #[instrument(skip(self, plan), fields(resource = %plan.resource.name(), kind = %plan.kind))]
    pub fn apply(&self, plan: GenerationPlan) -> Result<GenerationReport, GenerationError> {
        transition(GenerationPhase::Patching);

        let paths: Vec<PathBuf> = plan.writes.iter().map(|write| write.path.clone()).collect();
        let mut files = Vec::with_capacity(plan.writes.len());

        for (idx, write) in plan.writes.into_iter().enumerate() {
            let action = write.action();
            if action == FileAction::Unchanged {
                debug!(file = %write.path.display(), "Already up to date");
            } else if let Err(source) = write_atomic(&write.path, &write.content) {
                transition(GenerationPhase::PartiallyWritten);
                return Err(GenerationError::PartiallyWritten(PartialWrite {
                    written: files,
                    failed: write.path,
                    source,
                    pending: paths[idx + 1..].to_vec(),
                }));
            } else {
                info!(file = %write.path.display(), %action, "Wrote {}", write.label);
            }

            files.push(FileOutcome {
                path: write.path,
                label: write.label,
                action,
                role: write.role,
            });
        }

        transition(GenerationPhase::Done);
        Ok(GenerationReport {
            resource: plan.resource.name().to_string(),
            kind: plan.kind,
            phase: GenerationPhase::Done,
            artifacts: plan.artifacts,
            files,
        })
    }

    /// Add (or extend) the aggregator write registering `id`
    fn plan_registration(
        &self,
        id: &ArtifactId,
        writes: &mut Vec<PlannedWrite>,
    ) -> Result<(), GenerationError> {
        let path = self.context.root.join(self.locator.index_path(id.kind));
        let patcher = IndexPatcher::new(self.locator.registration_pattern());
        let line = self.locator.registration_line(id);
        let header = self.locator.index_header(id.kind);

        // Two kinds sharing one aggregator patch the same pending content
        if let Some(existing) = writes
            .iter_mut()
            .find(|write| write.role == FileRole::Index && write.path == path)
        {
            let patched = patcher.patch(Some(&existing.content), &line, &header);
            existing.content = patched.content;
            return Ok(());
        }

        let previous = read_optional(&path)?;
        let patched = patcher.patch(previous.as_deref(), &line, &header);
        writes.push(PlannedWrite {
            label: format!("{} index", id.kind.category()),
            path,
            previous,
            content: patched.content,
            role: FileRole::Index,
        });
        Ok(())
    }
}

/// Every planned write must target its own file
fn check_distinct_paths(writes: &[PlannedWrite]) -> Result<(), GenerationError> {
    for (idx, write) in writes.iter().enumerate() {
        if let Some(earlier) = writes[..idx].iter().find(|earlier| earlier.path == write.path) {
            return Err(GenerationError::PathCollision {
                path: write.path.clone(),
                first: earlier.label.clone(),
                second: write.label.clone(),
            });
        }
    }
    Ok(())
}

fn parse_actions(request: &GenerateRequest) -> Result<Vec<ControllerAction>, Vec<ValidationError>> {
    if request.kind.includes_controller() {
        return ControllerAction::parse_all(&request.actions);
    }

    let errors: Vec<ValidationError> = request
        .actions
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            ValidationError::Token(TokenError {
                position: idx + 1,
                token: raw.clone(),
                error: FieldError::InvalidAction {
                    action: raw.clone(),
                    reason: format!("custom actions need a controller, not a {}", request.kind),
                },
            })
        })
        .collect();

    if errors.is_empty() {
        Ok(Vec::new())
    } else {
        Err(errors)
    }
}

fn transition(phase: GenerationPhase) {
    debug!(%phase, "Generation phase");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaffoldConfig;
    use std::fs;

    fn project() -> (tempfile::TempDir, ProjectContext) {
        let dir = tempfile::tempdir().unwrap();
        let context = ProjectContext::new(dir.path(), ScaffoldConfig::default());
        (dir, context)
    }

    fn scaffold(name: &str, fields: &[&str]) -> GenerateRequest {
        GenerateRequest::new(ResourceKind::Scaffold, name).with_fields(fields.iter().copied())
    }

    #[test]
    fn test_resource_kind_contents() {
        assert!(ResourceKind::Model.includes_model());
        assert!(!ResourceKind::Model.includes_controller());
        assert!(ResourceKind::Controller.includes_controller());
        assert!(!ResourceKind::Controller.requires_fields());
        assert!(ResourceKind::Scaffold.includes_model());
        assert!(ResourceKind::Scaffold.includes_controller());
    }

    #[test]
    fn test_plan_orders_artifacts_before_indexes() {
        let (_dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        let plan = generator.plan(&scaffold("Post", &["title:str"])).unwrap();

        let labels: Vec<_> = plan.writes.iter().map(|write| write.label.as_str()).collect();
        assert_eq!(
            labels,
            ["models/post", "controllers/posts", "models index", "controllers index"]
        );
        assert!(plan.writes.iter().all(|write| write.action() == FileAction::Created));
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_plan_writes_nothing() {
        let (dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        generator.plan(&scaffold("Post", &["title:str"])).unwrap();
        assert!(!dir.path().join("src").exists());
    }

    #[test]
    fn test_rejection_collects_every_problem() {
        let (_dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        let request = scaffold("Post", &["title", "age:number"]).with_actions(["fetch:x"]);

        let Err(GenerationError::Rejected(rejection)) = generator.plan(&request) else {
            panic!("expected a rejection");
        };
        assert_eq!(rejection.resource, "Post");
        assert_eq!(rejection.errors.len(), 3);
    }

    #[test]
    fn test_model_requires_fields() {
        let (_dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        let err = generator
            .plan(&GenerateRequest::new(ResourceKind::Model, "Post"))
            .unwrap_err();
        let GenerationError::Rejected(rejection) = err else {
            panic!("expected a rejection");
        };
        assert_eq!(rejection.errors, vec![ValidationError::NoFields]);
    }

    #[test]
    fn test_controller_without_fields() {
        let (_dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        let plan = generator
            .plan(&GenerateRequest::new(ResourceKind::Controller, "Session"))
            .unwrap();
        assert_eq!(plan.artifacts.len(), 1);
        assert_eq!(plan.artifacts[0].to_string(), "controllers/sessions");
    }

    #[test]
    fn test_actions_on_model_are_rejected() {
        let (_dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        let request = GenerateRequest::new(ResourceKind::Model, "Post")
            .with_fields(["title:str"])
            .with_actions(["get:search"]);
        assert!(matches!(
            generator.plan(&request),
            Err(GenerationError::Rejected(_))
        ));
    }

    #[test]
    fn test_generate_then_rerun_is_unchanged() {
        let (dir, context) = project();
        let generator = Generator::for_project(&context).unwrap();
        let request = scaffold("Post", &["title:str", "body:str"]);

        let report = generator.generate(&request).unwrap();
        assert_eq!(report.phase, GenerationPhase::Done);
        assert_eq!(report.changed().count(), 4);

        let before = fs::read_to_string(dir.path().join("src/models/mod.rs")).unwrap();
        let report = generator.generate(&request).unwrap();
        assert_eq!(report.changed().count(), 0);
        let after = fs::read_to_string(dir.path().join("src/models/mod.rs")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_differing_artifact_needs_force() {
        let (dir, context) = project();
        let models = dir.path().join("src/models");
        fs::create_dir_all(&models).unwrap();
        fs::write(models.join("post.rs"), "// hand written\n").unwrap();

        let generator = Generator::for_project(&context).unwrap();
        let request = GenerateRequest::new(ResourceKind::Model, "Post").with_fields(["title:str"]);

        let Err(GenerationError::ArtifactsExist { paths }) = generator.plan(&request) else {
            panic!("expected a conflict");
        };
        assert_eq!(paths, vec![models.join("post.rs")]);

        let plan = generator.plan(&request.with_force(true)).unwrap();
        assert_eq!(plan.writes[0].action(), FileAction::Updated);
    }

    #[test]
    fn test_config_force() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ScaffoldConfig::default();
        config.generate.force = true;
        let context = ProjectContext::new(dir.path(), config);
        let models = dir.path().join("src/models");
        fs::create_dir_all(&models).unwrap();
        fs::write(models.join("post.rs"), "// old\n").unwrap();

        let generator = Generator::for_project(&context).unwrap();
        let request = GenerateRequest::new(ResourceKind::Model, "Post").with_fields(["title:str"]);
        assert!(generator.plan(&request).is_ok());
    }

    #[test]
    fn test_shared_aggregator_is_patched_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ScaffoldConfig::default();
        config.layout.controllers_dir = PathBuf::from("src/models");
        let context = ProjectContext::new(dir.path(), config);
        let generator = Generator::for_project(&context).unwrap();

        let plan = generator.plan(&scaffold("Post", &["title:str"])).unwrap();
        let indexes: Vec<_> = plan
            .writes
            .iter()
            .filter(|write| write.role == FileRole::Index)
            .collect();
        assert_eq!(indexes.len(), 1);
        assert_eq!(
            indexes[0].content,
            "//! Data models\n\npub mod post;\npub mod posts;\n"
        );
    }

    #[test]
    fn test_artifacts_sharing_a_file_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ScaffoldConfig::default();
        config.layout.controllers_dir = PathBuf::from("src/models");
        let context = ProjectContext::new(dir.path(), config);
        let generator = Generator::for_project(&context).unwrap();

        let err = generator.generate(&scaffold("Sheep", &["name:str"])).unwrap_err();
        let GenerationError::PathCollision { path, first, second } = &err else {
            panic!("expected a path collision, got {err:?}");
        };
        assert_eq!(path, &dir.path().join("src/models/sheep.rs"));
        assert_eq!(first, "models/sheep");
        assert_eq!(second, "controllers/sheep");
        assert_eq!(err.phase(), GenerationPhase::Failed);
        assert!(!dir.path().join("src/models").exists());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(GenerationPhase::PartiallyWritten.to_string(), "partially written");
        assert_eq!(FileAction::Unchanged.to_string(), "identical");
    }
}
