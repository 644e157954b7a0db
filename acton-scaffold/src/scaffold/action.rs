//! Custom controller actions
//!
//! `--action get:search` adds a stub handler `search` routed at
//! `GET <route>/search` next to the five CRUD handlers.

use std::fmt;

use super::helpers::TemplateHelpers;
use crate::error::{FieldError, TokenError, ValidationError};

/// Names already taken inside a generated controller module
const TAKEN_NAMES: &[&str] = &["list", "show", "create", "update", "delete", "routes", "get"];

/// HTTP method of a custom action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// axum routing function (`get`, `post`, ...)
    #[must_use]
    pub const fn routing_fn(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.routing_fn().to_uppercase())
    }
}

/// One custom handler of a controller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerAction {
    /// HTTP method
    pub method: HttpMethod,
    /// Handler name
    pub name: String,
}

impl ControllerAction {
    /// Parse `method:name`
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::action::{ControllerAction, HttpMethod};
    /// let action = ControllerAction::parse("get:search").unwrap();
    /// assert_eq!(action.method, HttpMethod::Get);
    /// assert_eq!(action.name, "search");
    /// assert_eq!(action.path_segment(), "search");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidAction`] if the method is unknown, the
    /// name is not a `snake_case` identifier, or the name is taken by a CRUD
    /// handler.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let raw = raw.trim();
        let invalid = |reason: String| FieldError::InvalidAction {
            action: raw.to_string(),
            reason,
        };

        let (method, name) = raw
            .split_once(':')
            .ok_or_else(|| invalid("expected format method:name".to_string()))?;

        let method = HttpMethod::parse(method.trim()).ok_or_else(|| {
            invalid(format!(
                "unknown method '{}'. Supported: get, post, put, patch, delete",
                method.trim()
            ))
        })?;

        let name = name.trim();
        if !TemplateHelpers::is_identifier(name) || TemplateHelpers::is_reserved(name) {
            return Err(invalid(format!(
                "'{name}' is not a valid handler name"
            )));
        }
        if !is_snake_case(name) {
            return Err(invalid(format!(
                "handler names must be snake_case, e.g. '{}'",
                TemplateHelpers::to_snake_case(name)
            )));
        }
        if TAKEN_NAMES.contains(&name) {
            return Err(invalid(format!(
                "'{name}' collides with a generated handler"
            )));
        }

        Ok(Self {
            method,
            name: name.to_string(),
        })
    }

    /// Parse every action, collecting all problems
    ///
    /// # Errors
    ///
    /// Returns one [`ValidationError`] per failing action (1-based position
    /// among the actions), including actions that reuse an earlier name or
    /// route segment.
    pub fn parse_all(raw: &[String]) -> Result<Vec<Self>, Vec<ValidationError>> {
        let mut actions: Vec<Self> = Vec::with_capacity(raw.len());
        let mut errors = Vec::new();

        for (idx, token) in raw.iter().enumerate() {
            let result = Self::parse(token).and_then(|action| {
                let segment = action.path_segment();
                if actions.iter().any(|existing| existing.path_segment() == segment) {
                    Err(FieldError::InvalidAction {
                        action: token.trim().to_string(),
                        reason: format!(
                            "handler '{}' is declared twice (route '{segment}')",
                            action.name
                        ),
                    })
                } else {
                    Ok(action)
                }
            });

            match result {
                Ok(action) => actions.push(action),
                Err(error) => errors.push(ValidationError::Token(TokenError {
                    position: idx + 1,
                    token: token.clone(),
                    error,
                })),
            }
        }

        if errors.is_empty() {
            Ok(actions)
        } else {
            Err(errors)
        }
    }

    /// Path segment under the resource route (`bulk-import`)
    ///
    /// Names are `snake_case`, so distinct names give distinct segments.
    #[must_use]
    pub fn path_segment(&self) -> String {
        self.name.replace('_', "-")
    }
}

/// Lowercase words joined by single underscores
fn is_snake_case(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.contains("__")
        && !name.ends_with('_')
}

impl fmt::Display for ControllerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method.routing_fn(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_every_method() {
        for (raw, method) in [
            ("get:search", HttpMethod::Get),
            ("POST:publish", HttpMethod::Post),
            ("put:replace", HttpMethod::Put),
            ("patch:archive", HttpMethod::Patch),
            ("delete:purge", HttpMethod::Delete),
        ] {
            assert_eq!(ControllerAction::parse(raw).unwrap().method, method, "{raw}");
        }
    }

    #[test]
    fn test_path_segment_is_kebab_case() {
        let action = ControllerAction::parse("post:bulk_import").unwrap();
        assert_eq!(action.path_segment(), "bulk-import");
        assert_eq!(action.to_string(), "post:bulk_import");
    }

    #[test]
    fn test_rejects_malformed_actions() {
        for raw in ["search", "fetch:search", "get:", "get:2fa", "get:self"] {
            assert!(
                matches!(
                    ControllerAction::parse(raw).unwrap_err(),
                    FieldError::InvalidAction { .. }
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_rejects_crud_collisions() {
        for raw in ["get:list", "post:create", "delete:delete", "get:routes"] {
            assert!(ControllerAction::parse(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_parse_all_reports_duplicates_with_positions() {
        let errors =
            ControllerAction::parse_all(&actions(&["get:search", "post:search", "get:list"]))
                .unwrap_err();
        let positions: Vec<_> = errors
            .iter()
            .map(|error| match error {
                ValidationError::Token(token) => token.position,
                other => panic!("unexpected error {other}"),
            })
            .collect();
        assert_eq!(positions, [2, 3]);
    }

    #[test]
    fn test_rejects_names_that_are_not_snake_case() {
        for raw in [
            "get:Json",
            "get:Path",
            "get:StatusCode",
            "post:CreatePost",
            "post:bulkImport",
            "get:search_",
            "get:bulk__import",
        ] {
            let err = ControllerAction::parse(raw).unwrap_err();
            assert!(err.to_string().contains("snake_case"), "{raw}: {err}");
        }
        assert!(ControllerAction::parse("get:search2").is_ok());
    }

    #[test]
    fn test_distinct_names_get_distinct_routes() {
        let parsed =
            ControllerAction::parse_all(&actions(&["get:search2", "get:search_2", "post:bulk_import"]))
                .unwrap();
        let segments: Vec<_> = parsed.iter().map(ControllerAction::path_segment).collect();
        assert_eq!(segments, ["search2", "search-2", "bulk-import"]);

        let errors = ControllerAction::parse_all(&actions(&["post:bulk_import", "post:bulkImport"]))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("snake_case"));
    }

    #[test]
    fn test_parse_all_keeps_order() {
        let parsed =
            ControllerAction::parse_all(&actions(&["get:search", "post:publish"])).unwrap();
        let names: Vec<_> = parsed.iter().map(|action| action.name.as_str()).collect();
        assert_eq!(names, ["search", "publish"]);
    }
}
