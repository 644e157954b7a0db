//! Field token splitting
//!
//! A token is `name_segment:type_segment`. Only the first unescaped `:` is a
//! separator; the type segment keeps any further colons (`list:ref:Course`).

use crate::error::FieldError;

/// A raw field token split into its two segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Field name with modifier markers still attached
    pub name_segment: &'a str,
    /// Type expression consumed by the type resolver
    pub type_segment: &'a str,
}

impl<'a> Token<'a> {
    /// Split a raw token on its first unescaped `:`
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::token::Token;
    /// let token = Token::split("courses:list:ref:Course").unwrap();
    /// assert_eq!(token.name_segment, "courses");
    /// assert_eq!(token.type_segment, "list:ref:Course");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::MalformedToken`] if there is no separator or the
    /// name segment is empty.
    pub fn split(raw: &'a str) -> Result<Self, FieldError> {
        let raw = raw.trim();
        let separator = find_separator(raw).ok_or_else(|| FieldError::MalformedToken {
            token: raw.to_string(),
            reason: "expected format name:type".to_string(),
        })?;

        let name_segment = raw[..separator].trim();
        if name_segment.is_empty() {
            return Err(FieldError::MalformedToken {
                token: raw.to_string(),
                reason: "field name is empty".to_string(),
            });
        }

        Ok(Self {
            name_segment,
            type_segment: raw[separator + 1..].trim(),
        })
    }
}

/// Byte offset of the first `:` not preceded by a backslash
fn find_separator(raw: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in raw.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ':' if !escaped => return Some(idx),
            _ => escaped = false,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let token = Token::split("title:str").unwrap();
        assert_eq!(token.name_segment, "title");
        assert_eq!(token.type_segment, "str");
    }

    #[test]
    fn test_split_keeps_nested_type() {
        let token = Token::split("author:ref:User").unwrap();
        assert_eq!(token.name_segment, "author");
        assert_eq!(token.type_segment, "ref:User");
    }

    #[test]
    fn test_split_trims_whitespace() {
        let token = Token::split("  email_ : str ").unwrap();
        assert_eq!(token.name_segment, "email_");
        assert_eq!(token.type_segment, "str");
    }

    #[test]
    fn test_split_skips_escaped_colon() {
        let token = Token::split(r"odd\:name:str").unwrap();
        assert_eq!(token.name_segment, r"odd\:name");
        assert_eq!(token.type_segment, "str");
    }

    #[test]
    fn test_missing_separator() {
        let err = Token::split("title").unwrap_err();
        assert!(matches!(err, FieldError::MalformedToken { .. }));
    }

    #[test]
    fn test_empty_name() {
        let err = Token::split(":str").unwrap_err();
        assert_eq!(
            err,
            FieldError::MalformedToken {
                token: ":str".to_string(),
                reason: "field name is empty".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_type_is_left_to_type_resolver() {
        let token = Token::split("title:").unwrap();
        assert_eq!(token.type_segment, "");
    }
}
