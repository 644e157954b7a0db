//! Configuration for acton-scaffold
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_SCAFFOLD_` prefix, `__` for nesting)
//! 2. `--config FILE`, or `<project_root>/acton-scaffold.toml` when present
//! 3. Hardcoded defaults (fallback)
//!
//! Environment variable format: `ACTON_SCAFFOLD_SECTION__FIELD_NAME`
//! - Example: `ACTON_SCAFFOLD_LAYOUT__CONTROLLERS_DIR=src/routes`
//!
//! # Example Configuration
//!
//! ```toml
//! # acton-scaffold.toml
//! [layout]
//! models_dir = "src/models"
//! controllers_dir = "src/handlers"
//! index_file = "mod.rs"
//! models_module = "crate::models"
//! state_type = "crate::state::AppState"
//! record_module = "acton_htmx::record"
//!
//! [templates]
//! dir = "templates/scaffold"
//!
//! [generate]
//! force = false
//! ```

use std::path::{Component, Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scaffold::helpers::TemplateHelpers;

/// File looked up in the project root when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "acton-scaffold.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ACTON_SCAFFOLD_";

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Defaults could not be serialized for the base layer
    #[error("failed to serialize default configuration: {0}")]
    Defaults(#[from] toml::ser::Error),

    /// Explicit `--config` file does not exist
    #[error("configuration file not found: {}", .path.display())]
    NotFound {
        /// Path given on the command line
        path: PathBuf,
    },

    /// A source could not be parsed or merged
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Complete scaffold configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Where artifacts and aggregators live
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Template overrides
    #[serde(default)]
    pub templates: TemplateSettings,

    /// Generation defaults
    #[serde(default)]
    pub generate: GenerateSettings,
}

/// Project layout conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Directory holding model modules, relative to the project root
    pub models_dir: PathBuf,

    /// Directory holding controller modules, relative to the project root
    pub controllers_dir: PathBuf,

    /// Aggregator file name inside each directory
    pub index_file: String,

    /// Module path controllers import models from
    pub models_module: String,

    /// Application state type handlers extract
    pub state_type: String,

    /// Module providing `Record`, `RecordError`, `Hashed` and `Encrypted`
    pub record_module: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("src/models"),
            controllers_dir: PathBuf::from("src/handlers"),
            index_file: "mod.rs".to_string(),
            models_module: "crate::models".to_string(),
            state_type: "crate::state::AppState".to_string(),
            record_module: "acton_htmx::record".to_string(),
        }
    }
}

impl LayoutSettings {
    /// Crate-relative Rust path of a controller module (`handlers::posts`)
    ///
    /// `None` when `controllers_dir` is not a module directory under `src/`.
    ///
    /// ```
    /// # use acton_scaffold::config::LayoutSettings;
    /// let layout = LayoutSettings::default();
    /// assert_eq!(layout.controller_module_path("posts").as_deref(), Some("handlers::posts"));
    /// ```
    #[must_use]
    pub fn controller_module_path(&self, module: &str) -> Option<String> {
        let mut segments = self.controllers_dir.components().filter_map(|c| match c {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        });
        if segments.next() != Some("src") {
            return None;
        }

        let mut path = Vec::new();
        for segment in segments {
            if !TemplateHelpers::is_identifier(segment) {
                return None;
            }
            path.push(TemplateHelpers::to_rust_ident(segment));
        }
        path.push(TemplateHelpers::to_rust_ident(module));
        Some(path.join("::"))
    }
}

/// Template override settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Directory with `model.rs.jinja` / `controller.rs.jinja` overrides,
    /// relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Generation defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    /// Overwrite artifacts that differ from the rendered output
    pub force: bool,
}

impl ScaffoldConfig {
    /// Load configuration for a project
    ///
    /// Reads `<project_root>/acton-scaffold.toml` when it exists, or the
    /// explicit `config_file`, then applies `ACTON_SCAFFOLD_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - `config_file` is given but does not exist
    /// - A configuration source contains invalid TOML or mistyped values
    pub fn load(project_root: &Path, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new()
            // 3. Start with defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 2. Explicit file, or the project file when present
        match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let project_config = project_root.join(CONFIG_FILE_NAME);
                if project_config.exists() {
                    figment = figment.merge(Toml::file(project_config));
                }
            }
        }

        // 1. Environment variables (highest priority, double underscore for nesting)
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }
}

/// Project root plus the configuration that applies to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Directory every relative path is resolved against
    pub root: PathBuf,
    /// Effective configuration
    pub config: ScaffoldConfig,
}

impl ProjectContext {
    /// Wrap a root and a configuration
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: ScaffoldConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Load the configuration for `root`
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`ScaffoldConfig::load`].
    pub fn load(root: impl Into<PathBuf>, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = ScaffoldConfig::load(&root, config_file)?;
        Ok(Self { root, config })
    }

    /// Template override directory, resolved against the root
    #[must_use]
    pub fn template_dir(&self) -> Option<PathBuf> {
        self.config.templates.dir.as_ref().map(|dir| self.root.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = ScaffoldConfig::default();
        assert_eq!(config.layout.models_dir, PathBuf::from("src/models"));
        assert_eq!(config.layout.controllers_dir, PathBuf::from("src/handlers"));
        assert_eq!(config.layout.index_file, "mod.rs");
        assert_eq!(config.layout.models_module, "crate::models");
        assert_eq!(config.layout.state_type, "crate::state::AppState");
        assert_eq!(config.layout.record_module, "acton_htmx::record");
        assert!(config.templates.dir.is_none());
        assert!(!config.generate.force);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScaffoldConfig::load(dir.path(), None).unwrap();
        assert_eq!(config, ScaffoldConfig::default());
    }

    #[test]
    fn test_load_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[layout]\ncontrollers_dir = \"src/routes\"\n\n[generate]\nforce = true\n",
        )
        .unwrap();

        let config = ScaffoldConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.layout.controllers_dir, PathBuf::from("src/routes"));
        assert_eq!(config.layout.models_dir, PathBuf::from("src/models"));
        assert!(config.generate.force);
    }

    #[test]
    fn test_controller_module_path_follows_layout() {
        let mut layout = LayoutSettings::default();
        assert_eq!(layout.controller_module_path("posts").as_deref(), Some("handlers::posts"));

        layout.controllers_dir = PathBuf::from("./src/web/routes");
        assert_eq!(layout.controller_module_path("posts").as_deref(), Some("web::routes::posts"));

        layout.controllers_dir = PathBuf::from("src");
        assert_eq!(layout.controller_module_path("posts").as_deref(), Some("posts"));

        layout.controllers_dir = PathBuf::from("crates/web/src/handlers");
        assert_eq!(layout.controller_module_path("posts"), None);

        layout.controllers_dir = PathBuf::from("src/http-handlers");
        assert_eq!(layout.controller_module_path("posts"), None);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ScaffoldConfig::load(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[generate]\nforce = \"maybe\"\n").unwrap();
        let err = ScaffoldConfig::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_template_dir_is_resolved_against_root() {
        let mut config = ScaffoldConfig::default();
        config.templates.dir = Some(PathBuf::from("templates/scaffold"));
        let context = ProjectContext::new("/work/app", config);
        assert_eq!(
            context.template_dir(),
            Some(PathBuf::from("/work/app/templates/scaffold"))
        );
    }
}
