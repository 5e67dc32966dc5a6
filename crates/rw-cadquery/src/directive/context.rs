//! Per-block context handed to directives.

use std::io;
use std::path::{Path, PathBuf};

/// Source location and file access for one directive block.
///
/// ```
/// use std::path::Path;
/// use rw_cadquery::directive::DirectiveContext;
///
/// let ctx = DirectiveContext {
///     source_path: Some(Path::new("docs/guide/parts.md")),
///     source_root: Path::new("docs"),
///     line: 12,
///     read_file: &|path| std::fs::read_to_string(path),
/// };
///
/// assert_eq!(ctx.resolve_path("models/bracket.py"), Path::new("docs/models/bracket.py"));
/// assert_eq!(ctx.location(), "docs/guide/parts.md:12");
/// ```
pub struct DirectiveContext<'a> {
    /// Page being rendered (if known).
    pub source_path: Option<&'a Path>,
    /// Documentation source root; script file arguments resolve against it.
    pub source_root: &'a Path,
    /// Line of the directive opening (1-indexed).
    pub line: usize,
    /// Callback to read a file from the file system.
    pub read_file: &'a dyn Fn(&Path) -> io::Result<String>,
}

impl DirectiveContext<'_> {
    /// Resolve a path argument against the source root.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.source_root.join(relative)
    }

    /// Read a file using the context's callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(&self, path: &Path) -> io::Result<String> {
        (self.read_file)(path)
    }

    /// `page:line` for log entries.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}", self.page_name(), self.line)
    }

    /// Page path for messages, `<unknown>` when not set.
    #[must_use]
    pub fn page_name(&self) -> String {
        self.source_path
            .map_or_else(|| "<unknown>".to_owned(), |p| p.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let ctx = DirectiveContext {
            source_path: None,
            source_root: Path::new("/srv/docs"),
            line: 1,
            read_file: &|_| Ok(String::new()),
        };

        assert_eq!(
            ctx.resolve_path("models/bracket.py"),
            PathBuf::from("/srv/docs/models/bracket.py")
        );
    }

    #[test]
    fn test_read_uses_callback() {
        let ctx = DirectiveContext {
            source_path: None,
            source_root: Path::new("."),
            line: 1,
            read_file: &|_| Ok("result = box()".to_owned()),
        };

        assert_eq!(ctx.read(Path::new("part.py")).unwrap(), "result = box()");
    }

    #[test]
    fn test_location_without_page() {
        let ctx = DirectiveContext {
            source_path: None,
            source_root: Path::new("."),
            line: 7,
            read_file: &|_| Ok(String::new()),
        };

        assert_eq!(ctx.location(), "<unknown>:7");
    }
}
