//! acton-scaffold library
//!
//! Parses compact field specifications (`title:str`, `email_:str`,
//! `author:ref:User`, `password_hashed:str`) and generates model and
//! controller modules for an acton-htmx project, registering them in the
//! project's `mod.rs` aggregators.

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod scaffold;

pub use config::{ProjectContext, ScaffoldConfig};
pub use error::{FieldError, GenerationError, ValidationError};
pub use scaffold::{FieldSpec, GenerateRequest, Generator, ResourceDescriptor, ResourceKind};
