//! Resource descriptors
//!
//! A [`ResourceDescriptor`] is the ordered set of fields of one resource plus
//! the naming variants the templates need. Declaration order is preserved so
//! generated code reads in the order the fields were typed.

use std::collections::HashMap;

use serde::Serialize;

use super::field::FieldSpec;
use super::helpers::TemplateHelpers;
use super::locator::{ArtifactId, ArtifactKind};
use crate::error::{FieldError, TokenError, ValidationError};

/// Naming variants derived from a resource name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNames {
    /// `BlogPost`
    pub type_name: String,
    /// `blog_post`
    pub module_name: String,
    /// `blog_posts`
    pub plural_module: String,
    /// `BlogPosts`
    pub plural_type: String,
    /// `/blog-posts`
    pub route_path: String,
    /// `Blog Post`
    pub title: String,
    /// `Blog Posts`
    pub plural_title: String,
}

impl ResourceNames {
    /// Derive every variant from a resource name in any casing
    #[must_use]
    pub fn derive(name: &str) -> Self {
        let type_name = TemplateHelpers::to_pascal_case(name);
        let module_name = TemplateHelpers::to_module_name(&type_name);
        let plural_module = TemplateHelpers::to_table_name(&type_name);

        Self {
            plural_type: TemplateHelpers::to_pascal_case(&plural_module),
            route_path: TemplateHelpers::to_route_path(&type_name),
            title: TemplateHelpers::to_title(&type_name),
            plural_title: TemplateHelpers::to_plural_title(&type_name),
            type_name,
            module_name,
            plural_module,
        }
    }
}

/// Validated resource: name plus ordered fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    name: String,
    names: ResourceNames,
    fields: Vec<FieldSpec>,
}

impl ResourceDescriptor {
    /// Parse a resource name and its field tokens, collecting every problem
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::resource::ResourceDescriptor;
    /// let fields = ["title:str".to_string(), "author:ref:User".to_string()];
    /// let resource = ResourceDescriptor::parse("Post", &fields).unwrap();
    /// assert_eq!(resource.fields().len(), 2);
    /// assert_eq!(resource.model_file_id().to_string(), "models/post");
    /// assert_eq!(resource.controller_file_id().to_string(), "controllers/posts");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns every [`ValidationError`] found: an invalid resource name and
    /// one entry per failing token, in input order.
    pub fn parse(name: &str, tokens: &[String]) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut builder = ResourceBuilder::new(name);

        if !is_resource_name(name) {
            errors.push(ValidationError::InvalidResourceName {
                name: name.to_string(),
            });
        }

        for (idx, token) in tokens.iter().enumerate() {
            let result = FieldSpec::parse(token).and_then(|field| builder.push(token, field));
            if let Err(error) = result {
                errors.push(ValidationError::Token(TokenError {
                    position: idx + 1,
                    token: token.clone(),
                    error,
                }));
            }
        }

        if errors.is_empty() {
            builder.build().map_err(|error| vec![error])
        } else {
            Err(errors)
        }
    }

    /// Resource name as given
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Naming variants
    #[must_use]
    pub const fn names(&self) -> &ResourceNames {
        &self.names
    }

    /// Fields in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Logical id of the model artifact (`models/post`)
    #[must_use]
    pub fn model_file_id(&self) -> ArtifactId {
        ArtifactId::new(ArtifactKind::Model, &self.names.module_name)
    }

    /// Logical id of the controller artifact (`controllers/posts`)
    #[must_use]
    pub fn controller_file_id(&self) -> ArtifactId {
        ArtifactId::new(ArtifactKind::Controller, &self.names.plural_module)
    }
}

/// Accumulates fields for one resource, rejecting duplicate names
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    claimed: HashMap<String, String>,
}

impl ResourceBuilder {
    /// Start a resource
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            claimed: HashMap::new(),
        }
    }

    /// Add a field parsed from `token`
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::DuplicateFieldName`] if another token already
    /// resolved to the same canonical name. The builder is left unchanged.
    pub fn push(&mut self, token: &str, field: FieldSpec) -> Result<(), FieldError> {
        if let Some(first_token) = self.claimed.get(field.name()) {
            return Err(FieldError::DuplicateFieldName {
                name: field.name().to_string(),
                first_token: first_token.clone(),
            });
        }

        self.claimed
            .insert(field.name().to_string(), token.trim().to_string());
        self.fields.push(field);
        Ok(())
    }

    /// Finish the resource
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidResourceName`] if the name is not an
    /// identifier.
    pub fn build(self) -> Result<ResourceDescriptor, ValidationError> {
        if !is_resource_name(&self.name) {
            return Err(ValidationError::InvalidResourceName { name: self.name });
        }

        Ok(ResourceDescriptor {
            names: ResourceNames::derive(&self.name),
            name: self.name,
            fields: self.fields,
        })
    }
}

fn is_resource_name(name: &str) -> bool {
    TemplateHelpers::is_identifier(name) && !TemplateHelpers::is_reserved(name)
}
