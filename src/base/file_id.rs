//! Interned source identifiers.
//!
//! Every diagnostic and every [`Position`](super::Position) names its file by
//! a small [`FileId`] rather than a `String` or `PathBuf`, so frames on the
//! context stack and errors raised deep in a nested `!include` stay cheap to
//! copy. The mapping back to a displayable path or URL lives in a
//! [`FileRegistry`], following the same arena-with-indices pattern a
//! symbol table uses for its own interned ids.

use std::path::{Path, PathBuf};

/// An interned source identifier: either a filesystem path or an `https://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    Path(PathBuf),
    Url(String),
    /// A parse that was never attached to a file (e.g. an in-memory fragment
    /// handed to `Parser::parse_str` with no enclosing include).
    Inline,
}

impl std::fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => write!(f, "{u}"),
            Self::Inline => write!(f, "<inline>"),
        }
    }
}

/// Compact handle to a [`SourceOrigin`] registered in a [`FileRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(u32);

impl FileId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of [`SourceOrigin`]s, deduplicated by equality.
///
/// Paths are compared after canonicalisation where possible so that the
/// include cycle detector can compare `FileId`s instead of
/// re-normalising strings at every nesting level.
#[derive(Debug, Default)]
pub struct FileRegistry {
    origins: Vec<SourceOrigin>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_path(&mut self, path: &Path) -> FileId {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.intern(SourceOrigin::Path(canonical))
    }

    pub fn intern_url(&mut self, url: &str) -> FileId {
        self.intern(SourceOrigin::Url(url.to_string()))
    }

    pub fn intern_inline(&mut self) -> FileId {
        self.intern(SourceOrigin::Inline)
    }

    fn intern(&mut self, origin: SourceOrigin) -> FileId {
        if let Some(pos) = self.origins.iter().position(|o| o == &origin) {
            return FileId(pos as u32);
        }
        let id = FileId(self.origins.len() as u32);
        self.origins.push(origin);
        id
    }

    pub fn origin(&self, id: FileId) -> &SourceOrigin {
        &self.origins[id.index()]
    }

    pub fn display(&self, id: FileId) -> String {
        self.origin(id).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_path_twice_returns_same_id() {
        let mut reg = FileRegistry::new();
        let a = reg.intern_path(Path::new("/tmp/does-not-exist-a.dsl"));
        let b = reg.intern_path(Path::new("/tmp/does-not-exist-a.dsl"));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_paths_get_distinct_ids() {
        let mut reg = FileRegistry::new();
        let a = reg.intern_path(Path::new("/tmp/does-not-exist-a.dsl"));
        let b = reg.intern_path(Path::new("/tmp/does-not-exist-b.dsl"));
        assert_ne!(a, b);
    }

    #[test]
    fn url_and_path_are_distinct_origins() {
        let mut reg = FileRegistry::new();
        let a = reg.intern_url("https://example.com/a.dsl");
        let b = reg.intern_path(Path::new("https://example.com/a.dsl"));
        assert_ne!(a, b);
    }
}
