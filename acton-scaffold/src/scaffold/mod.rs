//! Scaffold generator implementation
//!
//! Field tokens flow through the tokenizer, the modifier and type resolvers
//! and the field builder into a [`ResourceDescriptor`]; the [`Generator`]
//! renders its artifacts and registers them in their aggregator files.

pub mod action;
pub mod field;
pub mod field_type;
pub mod generator;
pub mod helpers;
pub mod index;
pub mod locator;
pub mod modifiers;
pub mod renderer;
pub mod resource;
pub mod templates;
pub mod token;

pub use action::{ControllerAction, HttpMethod};
pub use field::{FieldSpec, FieldSpecBuilder};
pub use field_type::{BaseType, FieldKind, FieldType, Multiplicity, Relation};
pub use generator::{
    FileAction, FileOutcome, FileRole, GenerateRequest, GenerationPhase, GenerationPlan,
    GenerationReport, Generator, PlannedWrite, ResourceKind,
};
pub use helpers::TemplateHelpers;
pub use index::{IndexPatcher, Patched, RegistrationPattern};
pub use locator::{ArtifactId, ArtifactKind, ArtifactLocator, ConventionalLocator};
pub use modifiers::{Modifiers, SecurityTransform};
pub use renderer::{RenderOptions, TemplateRenderer};
pub use resource::{ResourceBuilder, ResourceDescriptor, ResourceNames};
pub use token::Token;
