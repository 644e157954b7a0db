//! Aggregator file patching
//!
//! An aggregator (`mod.rs`) registers every module of a directory. Patching
//! adds one registration line if it is missing and leaves everything else in
//! the file exactly where it was.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::Builder;
use tracing::{debug, info, instrument};

use super::helpers::TemplateHelpers;
use crate::error::IndexPatchError;

/// Shape of a registration line: `<prefix><identifier><suffix>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPattern {
    prefix: String,
    suffix: String,
}

impl RegistrationPattern {
    /// Pattern with a custom prefix and suffix
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// `pub mod <ident>;`
    #[must_use]
    pub fn rust_module() -> Self {
        Self::new("pub mod ", ";")
    }

    /// Registration line for a module
    #[must_use]
    pub fn line_for(&self, module: &str) -> String {
        let ident = TemplateHelpers::to_rust_ident(module);
        format!("{}{ident}{}", self.prefix, self.suffix)
    }

    /// Whether a line is a registration line
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.module_of(line).is_some()
    }

    /// Module registered by a line, without any `r#` prefix
    #[must_use]
    pub fn module_of<'l>(&self, line: &'l str) -> Option<&'l str> {
        line.trim()
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .map(|ident| ident.strip_prefix("r#").unwrap_or(ident))
            .filter(|ident| TemplateHelpers::is_identifier(ident))
    }
}

/// A top-level registration and the attribute or doc lines attached to it
#[derive(Debug)]
struct Registration<'l> {
    /// First line of the item, attributes included
    start: usize,
    /// The registration line itself
    line: usize,
    module: &'l str,
}

/// Result of patching an aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// Full new content
    pub content: String,
    /// Whether the content differs from the input
    pub changed: bool,
}

/// Inserts registration lines into aggregator files
#[derive(Debug, Clone)]
pub struct IndexPatcher {
    pattern: RegistrationPattern,
}

impl IndexPatcher {
    /// Patcher recognising registration lines by `pattern`
    #[must_use]
    pub const fn new(pattern: RegistrationPattern) -> Self {
        Self { pattern }
    }

    /// Ensure `line` is registered in `existing`
    ///
    /// An absent file becomes `header`, a blank line and `line`. Otherwise the
    /// line is placed before the first top-level registration whose module
    /// sorts after it (above that registration's attributes and doc comments),
    /// after the last top-level registration, or at the end of a file that
    /// has none. Registrations inside inline `mod { ... }` blocks are ignored.
    /// Line endings of the existing file are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_scaffold::scaffold::index::{IndexPatcher, RegistrationPattern};
    /// let patcher = IndexPatcher::new(RegistrationPattern::rust_module());
    /// let patched = patcher.patch(Some("pub mod comment;\npub mod user;\n"), "pub mod post;", "//! Models");
    /// assert_eq!(patched.content, "pub mod comment;\npub mod post;\npub mod user;\n");
    /// assert!(patched.changed);
    /// ```
    #[must_use]
    pub fn patch(&self, existing: Option<&str>, line: &str, header: &str) -> Patched {
        let target = line.trim();

        let Some(existing) = existing else {
            let header = header.trim_end();
            return Patched {
                content: format!("{header}\n\n{target}\n"),
                changed: true,
            };
        };

        let newline = if existing.contains("\r\n") { "\r\n" } else { "\n" };
        let mut lines: Vec<String> = existing.split_inclusive('\n').map(str::to_string).collect();
        let inserted = format!("{target}{newline}");

        let Some(module) = self.pattern.module_of(target) else {
            if lines.iter().any(|l| l.trim() == target) {
                return unchanged(existing);
            }
            append(&mut lines, inserted, newline);
            return Patched {
                content: lines.concat(),
                changed: true,
            };
        };

        let registrations = self.registrations(&lines);
        if registrations.iter().any(|r| r.module == module) {
            return unchanged(existing);
        }

        let before = registrations.iter().find(|r| r.module > module).map(|r| r.start);
        let last = registrations.last().map(|r| r.line);

        match (before, last) {
            (Some(idx), _) => lines.insert(idx, inserted),
            (None, Some(last)) => {
                terminate(&mut lines[last], newline);
                lines.insert(last + 1, inserted);
            }
            (None, None) => append(&mut lines, inserted, newline),
        }

        Patched {
            content: lines.concat(),
            changed: true,
        }
    }

    /// Registration lines outside any `{ ... }` block, in file order
    fn registrations<'l>(&self, lines: &'l [String]) -> Vec<Registration<'l>> {
        let mut found = Vec::new();
        let mut braces = 0usize;
        let mut brackets = 0usize;
        let mut start = None;

        for (idx, line) in lines.iter().enumerate() {
            let code = line.split("//").next().unwrap_or_default();
            let trimmed = line.trim();

            if braces == 0 {
                if brackets > 0 {
                    brackets = balance(brackets, code, '[', ']');
                } else if trimmed.starts_with("#[") {
                    start.get_or_insert(idx);
                    brackets = balance(0, code, '[', ']');
                } else if trimmed.starts_with("//") {
                    // Doc comments attach to the next item, plain comments are skipped
                    if trimmed.starts_with("///") {
                        start.get_or_insert(idx);
                    }
                } else if let Some(module) = self.pattern.module_of(line) {
                    found.push(Registration {
                        start: start.take().unwrap_or(idx),
                        line: idx,
                        module,
                    });
                } else {
                    start = None;
                }
            }

            braces = balance(braces, code, '{', '}');
        }

        found
    }
}

fn unchanged(existing: &str) -> Patched {
    Patched {
        content: existing.to_string(),
        changed: false,
    }
}

fn append(lines: &mut Vec<String>, inserted: String, newline: &str) {
    if let Some(tail) = lines.last_mut() {
        terminate(tail, newline);
    }
    lines.push(inserted);
}

fn balance(depth: usize, code: &str, open: char, close: char) -> usize {
    code.chars().fold(depth, |depth, c| {
        if c == open {
            depth + 1
        } else if c == close {
            depth.saturating_sub(1)
        } else {
            depth
        }
    })
}

fn terminate(line: &mut String, newline: &str) {
    if !line.ends_with('\n') {
        line.push_str(newline);
    }
}

/// Read a file, `None` if it does not exist
///
/// # Errors
///
/// Returns [`IndexPatchError::Io`] for any failure other than a missing file.
pub fn read_optional(path: &Path) -> Result<Option<String>, IndexPatchError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IndexPatchError::io("read", path, e)),
    }
}

/// Replace a file atomically
///
/// Content goes to a temporary file in the target directory, which is then
/// renamed over the target. Readers see either the old or the new content.
/// A replaced file keeps its permissions; a new file gets the permissions a
/// plain create would give it under the current umask.
///
/// # Errors
///
/// Returns [`IndexPatchError::Io`] if the directory cannot be created or the
/// temporary file cannot be written or persisted.
#[instrument(skip(content), fields(file = %path.display()))]
pub fn write_atomic(path: &Path, content: &str) -> Result<(), IndexPatchError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    if !parent.as_os_str().is_empty() && !parent.exists() {
        debug!("Creating parent directory: {:?}", parent);
        fs::create_dir_all(parent).map_err(|e| IndexPatchError::io("create directory", parent, e))?;
    }

    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let temp_file = temp_builder()
        .tempfile_in(dir)
        .map_err(|e| IndexPatchError::io("write", path, e))?;
    fs::write(temp_file.path(), content).map_err(|e| IndexPatchError::io("write", path, e))?;

    match fs::metadata(path) {
        Ok(metadata) => fs::set_permissions(temp_file.path(), metadata.permissions())
            .map_err(|e| IndexPatchError::io("write", path, e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(IndexPatchError::io("read", path, e)),
    }

    temp_file
        .persist(path)
        .map_err(|e| IndexPatchError::io("replace", path, e.error))?;

    info!(bytes = content.len(), "File written");
    Ok(())
}

#[cfg(unix)]
fn temp_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    // Mode passed to open(2), so the umask applies as for `fs::write`
    let mut builder = Builder::new();
    builder.permissions(fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_builder() -> Builder<'static, 'static> {
    Builder::new()
}
