//! Name-segment modifier resolution
//!
//! Markers are stripped from the end of the name segment in a fixed order so
//! that the optional marker (`_`) and the transform suffixes (`_hashed`,
//! `_encrypted`) never compete for the same underscore:
//!
//! 1. `_hashed` or `_encrypted` suffix → security transform
//! 2. trailing `^` → unique
//! 3. trailing `_` → optional
//!
//! ```text
//! password_hashed  → password   (hashed)
//! username^        → username   (unique)
//! email_           → email      (optional)
//! slug^_           → slug       (unique, optional)
//! ```

use std::fmt;

use tracing::warn;

use super::helpers::TemplateHelpers;
use crate::error::FieldError;

const HASHED_SUFFIX: &str = "_hashed";
const ENCRYPTED_SUFFIX: &str = "_encrypted";

/// Words that only exist as transform suffixes
const RESERVED_WORDS: &[&str] = &["hashed", "encrypted"];

/// Fields every generated record already declares
const GENERATED_FIELDS: &[&str] = &["id"];

/// Transform applied to a value before it is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SecurityTransform {
    /// Stored as given
    #[default]
    None,
    /// One-way hash; the plaintext is never stored
    Hashed,
    /// Reversible encryption
    Encrypted,
}

impl SecurityTransform {
    /// Name-segment suffix that requests this transform
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Hashed => HASHED_SUFFIX,
            Self::Encrypted => ENCRYPTED_SUFFIX,
        }
    }

    /// Whether a transform is applied at all
    #[must_use]
    pub const fn is_applied(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for SecurityTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Hashed => write!(f, "hashed"),
            Self::Encrypted => write!(f, "encrypted"),
        }
    }
}

/// Canonical name and modifiers extracted from a name segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifiers {
    /// Name with every marker stripped
    pub name: String,
    /// Trailing `_`
    pub optional: bool,
    /// Trailing `^`
    pub unique: bool,
    /// `_hashed` / `_encrypted` suffix
    pub transform: SecurityTransform,
}

impl Modifiers {
    /// Strip markers from a name segment
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::modifiers::{Modifiers, SecurityTransform};
    /// let modifiers = Modifiers::resolve("password_hashed").unwrap();
    /// assert_eq!(modifiers.name, "password");
    /// assert_eq!(modifiers.transform, SecurityTransform::Hashed);
    ///
    /// let modifiers = Modifiers::resolve("email_").unwrap();
    /// assert_eq!(modifiers.name, "email");
    /// assert!(modifiers.optional);
    /// ```
    ///
    /// # Errors
    ///
    /// - [`FieldError::UnknownModifier`] if a character other than a letter,
    ///   digit or underscore remains after stripping
    /// - [`FieldError::MalformedToken`] if the remaining name is empty, does
    ///   not start with a letter, or is a reserved word
    pub fn resolve(segment: &str) -> Result<Self, FieldError> {
        let mut rest = segment;

        let mut transform = SecurityTransform::None;
        if let Some(stripped) = rest.strip_suffix(HASHED_SUFFIX) {
            rest = stripped;
            transform = SecurityTransform::Hashed;
        } else if let Some(stripped) = rest.strip_suffix(ENCRYPTED_SUFFIX) {
            rest = stripped;
            transform = SecurityTransform::Encrypted;
        }

        let mut unique = false;
        if let Some(stripped) = rest.strip_suffix('^') {
            rest = stripped;
            unique = true;
        }

        let mut optional = false;
        if let Some(stripped) = rest.strip_suffix('_') {
            rest = stripped;
            optional = true;

            // `name^_` is the documented spelling of unique + optional
            if !unique {
                if let Some(stripped) = rest.strip_suffix('^') {
                    rest = stripped;
                    unique = true;
                }
            }
        }

        if unique && optional {
            warn!(
                segment,
                "field combines the unique (^) and optional (_) markers; check this is intended"
            );
        }

        Self::validate_name(segment, rest)?;

        Ok(Self {
            name: rest.to_string(),
            optional,
            unique,
            transform,
        })
    }

    fn validate_name(segment: &str, name: &str) -> Result<(), FieldError> {
        if name.is_empty() {
            return Err(FieldError::MalformedToken {
                token: segment.to_string(),
                reason: "field name is empty once modifiers are stripped".to_string(),
            });
        }

        if let Some(found) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(FieldError::UnknownModifier {
                segment: segment.to_string(),
                found,
            });
        }

        if !TemplateHelpers::is_identifier(name) {
            return Err(FieldError::MalformedToken {
                token: segment.to_string(),
                reason: format!("field name '{name}' must start with a letter"),
            });
        }

        if RESERVED_WORDS.contains(&name) || TemplateHelpers::is_reserved(name) {
            return Err(FieldError::MalformedToken {
                token: segment.to_string(),
                reason: format!("'{name}' is reserved and cannot be used as a field name"),
            });
        }

        if GENERATED_FIELDS.contains(&name) {
            return Err(FieldError::MalformedToken {
                token: segment.to_string(),
                reason: format!("'{name}' is generated for every record and cannot be declared"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(segment: &str) -> Modifiers {
        Modifiers::resolve(segment).unwrap()
    }

    #[test]
    fn test_plain_name() {
        let modifiers = resolve("title");
        assert_eq!(modifiers.name, "title");
        assert!(!modifiers.optional);
        assert!(!modifiers.unique);
        assert_eq!(modifiers.transform, SecurityTransform::None);
    }

    #[test]
    fn test_optional_marker() {
        let modifiers = resolve("email_");
        assert_eq!(modifiers.name, "email");
        assert!(modifiers.optional);
        assert!(!modifiers.unique);
    }

    #[test]
    fn test_unique_marker() {
        let modifiers = resolve("username^");
        assert_eq!(modifiers.name, "username");
        assert!(modifiers.unique);
        assert!(!modifiers.optional);
    }

    #[test]
    fn test_transform_suffixes() {
        let hashed = resolve("password_hashed");
        assert_eq!(hashed.name, "password");
        assert_eq!(hashed.transform, SecurityTransform::Hashed);
        assert!(!hashed.optional);

        let encrypted = resolve("ssn_encrypted");
        assert_eq!(encrypted.name, "ssn");
        assert_eq!(encrypted.transform, SecurityTransform::Encrypted);
    }

    #[test]
    fn test_transform_with_other_markers() {
        let modifiers = resolve("token^_hashed");
        assert_eq!(modifiers.name, "token");
        assert!(modifiers.unique);
        assert_eq!(modifiers.transform, SecurityTransform::Hashed);

        let modifiers = resolve("secret__encrypted");
        assert_eq!(modifiers.name, "secret");
        assert!(modifiers.optional);
        assert_eq!(modifiers.transform, SecurityTransform::Encrypted);
    }

    #[test]
    fn test_unique_and_optional_in_either_order() {
        for segment in ["slug^_", "slug_^"] {
            let modifiers = resolve(segment);
            assert_eq!(modifiers.name, "slug", "segment {segment}");
            assert!(modifiers.unique, "segment {segment}");
            assert!(modifiers.optional, "segment {segment}");
        }
    }

    #[test]
    fn test_trailing_underscore_after_transform_word_is_optional() {
        // suffix priority: `_hashed_` does not end with `_hashed`
        let modifiers = resolve("x_hashed_");
        assert_eq!(modifiers.name, "x_hashed");
        assert!(modifiers.optional);
        assert_eq!(modifiers.transform, SecurityTransform::None);
    }

    #[test]
    fn test_unknown_modifier() {
        let err = Modifiers::resolve("na-me").unwrap_err();
        assert_eq!(
            err,
            FieldError::UnknownModifier {
                segment: "na-me".to_string(),
                found: '-',
            }
        );

        let err = Modifiers::resolve("title^^").unwrap_err();
        assert!(matches!(err, FieldError::UnknownModifier { found: '^', .. }));
    }

    #[test]
    fn test_empty_after_stripping() {
        for segment in ["^", "_hashed", "^_"] {
            let err = Modifiers::resolve(segment).unwrap_err();
            assert!(
                matches!(err, FieldError::MalformedToken { .. }),
                "segment {segment}"
            );
        }
    }

    #[test]
    fn test_invalid_leading_character() {
        assert!(matches!(
            Modifiers::resolve("2fa").unwrap_err(),
            FieldError::MalformedToken { .. }
        ));
    }

    #[test]
    fn test_reserved_words() {
        for segment in ["hashed", "encrypted", "self", "id", "id_"] {
            assert!(
                matches!(
                    Modifiers::resolve(segment).unwrap_err(),
                    FieldError::MalformedToken { .. }
                ),
                "segment {segment}"
            );
        }
    }
}
