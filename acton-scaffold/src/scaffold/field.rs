//! Field specifications
//!
//! A [`FieldSpec`] is the validated, immutable form of one field token.
//! Combinations the generated code could not honour (a hashed relation, an
//! encrypted integer) are rejected here rather than at render time.

use std::fmt;

use super::field_type::{BaseType, FieldKind, FieldType, Relation};
use super::modifiers::{Modifiers, SecurityTransform};
use super::token::Token;
use crate::error::{ConflictReason, FieldError};

/// One validated field of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    optional: bool,
    unique: bool,
    transform: SecurityTransform,
}

impl FieldSpec {
    /// Parse a field token
    ///
    /// Format: `name[^][_][_hashed|_encrypted]:type`
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::field::FieldSpec;
    /// # use acton_scaffold::scaffold::modifiers::SecurityTransform;
    /// let field = FieldSpec::parse("email_:str").unwrap();
    /// assert_eq!(field.name(), "email");
    /// assert!(field.optional());
    ///
    /// let field = FieldSpec::parse("password_hashed:str").unwrap();
    /// assert_eq!(field.name(), "password");
    /// assert_eq!(field.transform(), SecurityTransform::Hashed);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first [`FieldError`] found by the tokenizer, the modifier
    /// resolver, the type resolver or the conflict checks, in that order.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let token = Token::split(raw)?;
        let modifiers = Modifiers::resolve(token.name_segment)?;
        let kind = FieldType::parse(token.type_segment)?;

        FieldSpecBuilder::new(modifiers.name, kind)
            .optional(modifiers.optional)
            .unique(modifiers.unique)
            .transform(modifiers.transform)
            .build()
    }

    /// Start building a field by hand
    #[must_use]
    pub fn builder(name: impl Into<String>, kind: FieldKind) -> FieldSpecBuilder {
        FieldSpecBuilder::new(name, kind)
    }

    /// Canonical name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value or relation
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Base type, `None` for relations
    #[must_use]
    pub const fn base_type(&self) -> Option<&BaseType> {
        match &self.kind {
            FieldKind::Scalar(base) => Some(base),
            FieldKind::Relation(_) => None,
        }
    }

    /// Relation, `None` for plain values
    #[must_use]
    pub const fn relation(&self) -> Option<&Relation> {
        match &self.kind {
            FieldKind::Relation(relation) => Some(relation),
            FieldKind::Scalar(_) => None,
        }
    }

    /// Whether the value may be absent
    #[must_use]
    pub const fn optional(&self) -> bool {
        self.optional
    }

    /// Whether values must be unique across records
    #[must_use]
    pub const fn unique(&self) -> bool {
        self.unique
    }

    /// Transform applied before persistence
    #[must_use]
    pub const fn transform(&self) -> SecurityTransform {
        self.transform
    }

    /// Rust type of the stored value, including `Option` for optional fields
    #[must_use]
    pub fn rust_type(&self) -> String {
        let base = match self.transform {
            SecurityTransform::None => self.kind.rust_type(),
            SecurityTransform::Hashed => "Hashed".to_string(),
            SecurityTransform::Encrypted => "Encrypted".to_string(),
        };
        self.wrap_optional(base)
    }

    /// Rust type accepted from clients; transformed fields take plaintext
    #[must_use]
    pub fn input_type(&self) -> String {
        self.wrap_optional(self.kind.rust_type())
    }

    fn wrap_optional(&self, base: String) -> String {
        if self.optional {
            format!("Option<{base}>")
        } else {
            base
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        write!(f, "{name}")?;
        if self.unique {
            write!(f, "^")?;
        }
        if self.optional {
            write!(f, "_")?;
        }
        let suffix = self.transform.suffix();
        let kind = &self.kind;
        write!(f, "{suffix}:{kind}")
    }
}

/// Builder for [`FieldSpec`] that enforces the per-field invariants
#[derive(Debug, Clone)]
pub struct FieldSpecBuilder {
    name: String,
    kind: FieldKind,
    optional: bool,
    unique: bool,
    transforms: Vec<SecurityTransform>,
}

impl FieldSpecBuilder {
    /// Start a field with a name and kind
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            unique: false,
            transforms: Vec::new(),
        }
    }

    /// Mark the field optional
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Mark the field unique
    #[must_use]
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Request a security transform; `None` is ignored
    #[must_use]
    pub fn transform(mut self, transform: SecurityTransform) -> Self {
        if transform.is_applied() && !self.transforms.contains(&transform) {
            self.transforms.push(transform);
        }
        self
    }

    /// Validate and build the field
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ConflictingFieldAttributes`] if more than one
    /// transform is requested, or a transform is requested on a relation or
    /// a non-string value.
    pub fn build(self) -> Result<FieldSpec, FieldError> {
        let conflict = |reason| FieldError::ConflictingFieldAttributes {
            field: self.name.clone(),
            reason,
        };

        let transform = match self.transforms.as_slice() {
            [] => SecurityTransform::None,
            [single] => *single,
            _ => return Err(conflict(ConflictReason::MultipleTransforms)),
        };

        if transform.is_applied() {
            match &self.kind {
                FieldKind::Relation(_) => {
                    return Err(conflict(ConflictReason::TransformOnRelation));
                }
                FieldKind::Scalar(BaseType::String) => {}
                FieldKind::Scalar(other) => {
                    return Err(conflict(ConflictReason::TransformOnNonString(other.clone())));
                }
            }
        }

        Ok(FieldSpec {
            name: self.name,
            kind: self.kind,
            optional: self.optional,
            unique: self.unique,
            transform,
        })
    }
}
