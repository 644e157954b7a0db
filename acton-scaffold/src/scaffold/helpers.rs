//! Naming helpers for code generation
//!
//! Casing, pluralisation and identifier checks shared by the field parser,
//! the resource builder and the templates.

use inflector::Inflector;

/// Words that must be emitted as raw identifiers (`r#type`) in generated Rust
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers either
const RESERVED_IDENTS: &[&str] = &["crate", "self", "Self", "super"];

/// Naming helpers for templates and validation
pub struct TemplateHelpers;

impl TemplateHelpers {
    /// `BlogPost` → `blog_post`
    ///
    /// ```
    /// # use acton_scaffold::scaffold::helpers::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_snake_case("BlogPost"), "blog_post");
    /// ```
    #[must_use]
    pub fn to_snake_case(input: &str) -> String {
        input.to_snake_case()
    }

    /// `blog_post` → `BlogPost`
    #[must_use]
    pub fn to_pascal_case(input: &str) -> String {
        input.to_pascal_case()
    }

    /// `BulkImport` → `bulk-import`
    #[must_use]
    pub fn to_kebab_case(input: &str) -> String {
        input.to_kebab_case()
    }

    /// English plural of the last word
    ///
    /// Irregular nouns follow Inflector's rules, which cover the common ones.
    #[must_use]
    pub fn pluralize(input: &str) -> String {
        input.to_plural()
    }

    /// Record collection and controller module name
    ///
    /// ```
    /// # use acton_scaffold::scaffold::helpers::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_table_name("BlogPost"), "blog_posts");
    /// ```
    #[must_use]
    pub fn to_table_name(model: &str) -> String {
        Self::pluralize(&Self::to_module_name(model))
    }

    /// Model module name
    #[must_use]
    pub fn to_module_name(model: &str) -> String {
        Self::to_snake_case(model)
    }

    /// Collection route, `/blog-posts` for `BlogPost`
    #[must_use]
    pub fn to_route_path(model: &str) -> String {
        let segment = Self::pluralize(&Self::to_kebab_case(model));
        format!("/{segment}")
    }

    /// `BlogPost` → `Blog Post`
    #[must_use]
    pub fn to_title(model: &str) -> String {
        model.to_title_case()
    }

    /// `BlogPost` → `Blog Posts`
    #[must_use]
    pub fn to_plural_title(model: &str) -> String {
        Self::to_title(model).to_plural()
    }

    /// Whether `input` is a simple identifier: a letter, then letters, digits
    /// or underscores
    ///
    /// ```
    /// # use acton_scaffold::scaffold::helpers::TemplateHelpers;
    /// assert!(TemplateHelpers::is_identifier("published_at"));
    /// assert!(!TemplateHelpers::is_identifier("2fa"));
    /// assert!(!TemplateHelpers::is_identifier("user-name"));
    /// ```
    #[must_use]
    pub fn is_identifier(input: &str) -> bool {
        let mut chars = input.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Whether `input` can never be used as a Rust item or field name
    #[must_use]
    pub fn is_reserved(input: &str) -> bool {
        RESERVED_IDENTS.contains(&input)
    }

    /// Spell `name` as a Rust identifier, using raw syntax for keywords
    ///
    /// ```
    /// # use acton_scaffold::scaffold::helpers::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_rust_ident("title"), "title");
    /// assert_eq!(TemplateHelpers::to_rust_ident("type"), "r#type");
    /// ```
    #[must_use]
    pub fn to_rust_ident(name: &str) -> String {
        if RUST_KEYWORDS.contains(&name) {
            format!("r#{name}")
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateHelpers as H;

    #[test]
    fn test_resource_casing() {
        for (input, snake, pascal, kebab) in [
            ("Post", "post", "Post", "post"),
            ("BlogPost", "blog_post", "BlogPost", "blog-post"),
            ("HTTPRequest", "http_request", "HttpRequest", "http-request"),
            ("order_item", "order_item", "OrderItem", "order-item"),
        ] {
            assert_eq!(H::to_snake_case(input), snake, "{input}");
            assert_eq!(H::to_pascal_case(input), pascal, "{input}");
            assert_eq!(H::to_kebab_case(input), kebab, "{input}");
        }
    }

    #[test]
    fn test_derived_resource_names() {
        assert_eq!(H::to_module_name("OrderItem"), "order_item");
        assert_eq!(H::to_table_name("Category"), "categories");
        assert_eq!(H::to_table_name("OrderItem"), "order_items");
        assert_eq!(H::to_route_path("OrderItem"), "/order-items");
        assert_eq!(H::to_route_path("Category"), "/categories");
        assert_eq!(H::to_title("OrderItem"), "Order Item");
        assert_eq!(H::to_plural_title("OrderItem"), "Order Items");
        assert_eq!(H::pluralize("session"), "sessions");
    }

    #[test]
    fn test_identifiers() {
        assert!(H::is_identifier("a"));
        assert!(H::is_identifier("Course2"));
        assert!(!H::is_identifier(""));
        assert!(!H::is_identifier("_private"));
        assert!(!H::is_identifier("na me"));
        assert!(H::is_reserved("self"));
        assert!(!H::is_reserved("type"));
    }

    #[test]
    fn test_rust_ident() {
        assert_eq!(H::to_rust_ident("match"), "r#match");
        assert_eq!(H::to_rust_ident("matches"), "matches");
    }
}
