//! Field type definitions and parser for scaffolding
//!
//! # Supported Field Types
//!
//! ## Primitive Types
//! - `str` - Rust `String`
//! - `int` - Rust `i64`
//! - `float` - Rust `f64`
//! - `bool` - Rust `bool`
//! - `datetime` - Rust `chrono::DateTime<chrono::Utc>`
//! - `date` - Rust `chrono::NaiveDate`
//! - `dict` - Rust `serde_json::Map<String, serde_json::Value>`
//! - `list` - Rust `Vec<serde_json::Value>`
//!
//! ## Collections
//! - `list:type` - List of a primitive type
//!
//! ## Relationships
//! - `ref:Model` - Reference to one `Model`
//! - `list:ref:Model` - References to many `Model`s
//!
//! # Examples
//!
//! ```text
//! title:str                 → String
//! views:int                 → i64
//! tags:list:str             → Vec<String>
//! author:ref:User           → UserId
//! courses:list:ref:Course   → Vec<CourseId>
//! ```

use std::fmt;

use super::helpers::TemplateHelpers;
use crate::error::FieldError;

const LIST_PREFIX: &str = "list:";
const REF_PREFIX: &str = "ref:";

/// Non-relation value type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `str`
    String,
    /// `int`
    Integer,
    /// `float`
    Float,
    /// `bool`
    Boolean,
    /// `datetime`
    DateTime,
    /// `date`
    Date,
    /// `dict`
    Map,
    /// `list` or `list:<primitive>`
    List {
        /// Element type, `None` for an untyped list
        element: Option<Box<BaseType>>,
    },
}

/// How many targets a relation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// `ref:Model`
    One,
    /// `list:ref:Model`
    Many,
}

/// Name reference to another resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    /// One or many
    pub multiplicity: Multiplicity,
    /// Target resource name, verbatim
    pub target_model: String,
}

/// What a field holds: a plain value or a relation, never both
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Plain value
    Scalar(BaseType),
    /// Reference to another resource
    Relation(Relation),
}

/// Type-segment parser
pub struct FieldType;

impl FieldType {
    /// Parse a type segment
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::field_type::{BaseType, FieldKind, FieldType, Multiplicity};
    /// assert_eq!(FieldType::parse("str").unwrap(), FieldKind::Scalar(BaseType::String));
    ///
    /// let FieldKind::Relation(relation) = FieldType::parse("list:ref:Course").unwrap() else {
    ///     panic!("expected a relation");
    /// };
    /// assert_eq!(relation.multiplicity, Multiplicity::Many);
    /// assert_eq!(relation.target_model, "Course");
    /// ```
    ///
    /// # Errors
    ///
    /// - [`FieldError::InvalidModelReference`] if the target of `ref:` is not
    ///   a simple identifier
    /// - [`FieldError::UnknownType`] for anything else outside the grammar
    pub fn parse(segment: &str) -> Result<FieldKind, FieldError> {
        if let Some(inner) = segment.strip_prefix(LIST_PREFIX) {
            if let Some(target) = inner.strip_prefix(REF_PREFIX) {
                return Self::parse_reference(target, Multiplicity::Many);
            }

            let element = Self::parse_primitive(inner).ok_or_else(|| FieldError::UnknownType {
                segment: segment.to_string(),
            })?;
            return Ok(FieldKind::Scalar(BaseType::List {
                element: Some(Box::new(element)),
            }));
        }

        if let Some(target) = segment.strip_prefix(REF_PREFIX) {
            return Self::parse_reference(target, Multiplicity::One);
        }

        Self::parse_primitive(segment)
            .map(FieldKind::Scalar)
            .ok_or_else(|| FieldError::UnknownType {
                segment: segment.to_string(),
            })
    }

    fn parse_reference(target: &str, multiplicity: Multiplicity) -> Result<FieldKind, FieldError> {
        if !TemplateHelpers::is_identifier(target) {
            return Err(FieldError::InvalidModelReference {
                reference: target.to_string(),
            });
        }

        Ok(FieldKind::Relation(Relation {
            multiplicity,
            target_model: target.to_string(),
        }))
    }

    fn parse_primitive(keyword: &str) -> Option<BaseType> {
        match keyword.to_lowercase().as_str() {
            "str" => Some(BaseType::String),
            "int" => Some(BaseType::Integer),
            "float" => Some(BaseType::Float),
            "bool" => Some(BaseType::Boolean),
            "datetime" => Some(BaseType::DateTime),
            "date" => Some(BaseType::Date),
            "dict" => Some(BaseType::Map),
            "list" => Some(BaseType::List { element: None }),
            _ => None,
        }
    }
}

impl BaseType {
    /// Rust type used in generated code
    #[must_use]
    pub fn rust_type(&self) -> String {
        match self {
            Self::String => "String".to_string(),
            Self::Integer => "i64".to_string(),
            Self::Float => "f64".to_string(),
            Self::Boolean => "bool".to_string(),
            Self::DateTime => "chrono::DateTime<chrono::Utc>".to_string(),
            Self::Date => "chrono::NaiveDate".to_string(),
            Self::Map => "serde_json::Map<String, serde_json::Value>".to_string(),
            Self::List { element: None } => "Vec<serde_json::Value>".to_string(),
            Self::List {
                element: Some(element),
            } => {
                let inner = element.rust_type();
                format!("Vec<{inner}>")
            }
        }
    }
}

impl Relation {
    /// Identifier type of the target (`UserId`)
    #[must_use]
    pub fn target_id_type(&self) -> String {
        let target = TemplateHelpers::to_pascal_case(&self.target_model);
        format!("{target}Id")
    }

    /// Rust type used in generated code
    #[must_use]
    pub fn rust_type(&self) -> String {
        let id = self.target_id_type();
        match self.multiplicity {
            Multiplicity::One => id,
            Multiplicity::Many => format!("Vec<{id}>"),
        }
    }
}

impl FieldKind {
    /// Rust type used in generated code
    #[must_use]
    pub fn rust_type(&self) -> String {
        match self {
            Self::Scalar(base) => base.rust_type(),
            Self::Relation(relation) => relation.rust_type(),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "str"),
            Self::Integer => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "bool"),
            Self::DateTime => write!(f, "datetime"),
            Self::Date => write!(f, "date"),
            Self::Map => write!(f, "dict"),
            Self::List { element: None } => write!(f, "list"),
            Self::List {
                element: Some(element),
            } => write!(f, "list:{element}"),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(base) => write!(f, "{base}"),
            Self::Relation(Relation {
                multiplicity: Multiplicity::One,
                target_model,
            }) => write!(f, "ref:{target_model}"),
            Self::Relation(Relation {
                multiplicity: Multiplicity::Many,
                target_model,
            }) => write!(f, "list:ref:{target_model}"),
        }
    }
}
