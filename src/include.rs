//! `!include` resolution: filesystem paths (file or directory,
//! relative to the currently parsing file) and `https://` URLs, nested to
//! any depth, with cycle detection by path equality.
//!
//! Filesystem traversal uses `walkdir` as a runtime dependency, since this
//! crate needs recursive, sorted directory includes at parse time, not
//! just in tests. URL fetches use `ureq`, a blocking HTTP client matching
//! the rest of this module's synchronous, one-call-at-a-time resolution.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeError {
    NotFound(String),
    Io(String),
    Cycle(String),
    Http(String),
}

impl std::fmt::Display for IncludeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(s) => write!(f, "include target not found: {s}"),
            Self::Io(s) => write!(f, "include I/O error: {s}"),
            Self::Cycle(s) => write!(f, "include cycle detected: {s}"),
            Self::Http(s) => write!(f, "HTTP fetch error: {s}"),
        }
    }
}

/// One resolved include unit: a displayable origin and its full text.
pub struct IncludeUnit {
    pub origin: String,
    pub content: String,
}

/// Resolves a `!include` target that isn't an `https://` URL.
///
/// `base_dir` is the directory of the file containing the `!include` line.
/// A directory target expands to every regular file beneath it, visited in
/// stable lexicographic path order.
pub fn resolve_filesystem(base_dir: &Path, target: &str) -> Result<Vec<IncludeUnit>, IncludeError> {
    let resolved = base_dir.join(target);

    if resolved.is_dir() {
        let mut paths: Vec<PathBuf> = WalkDir::new(&resolved)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| IncludeError::Io(format!("{}: {e}", path.display())))?;
                Ok(IncludeUnit { origin: path.display().to_string(), content })
            })
            .collect()
    } else if resolved.exists() {
        let content = std::fs::read_to_string(&resolved)
            .map_err(|e| IncludeError::Io(format!("{}: {e}", resolved.display())))?;
        Ok(vec![IncludeUnit { origin: resolved.display().to_string(), content }])
    } else {
        Err(IncludeError::NotFound(resolved.display().to_string()))
    }
}

/// Resolves an `https://` `!include` target.
pub fn resolve_url(url: &str) -> Result<IncludeUnit, IncludeError> {
    let response = ureq::get(url).call().map_err(|e| IncludeError::Http(e.to_string()))?;
    let content = response.into_string().map_err(|e| IncludeError::Http(e.to_string()))?;
    Ok(IncludeUnit { origin: url.to_string(), content })
}

/// Tracks the chain of filesystem includes currently being parsed, so a
/// file that (directly or transitively) includes itself is caught rather
/// than recursing until the stack overflows.
///
/// `enter`/`leave` are a matched pair rather than an RAII guard: the file
/// being entered stays "active" for the whole nested `process_source`
/// call that parses it, and that call needs an unencumbered `&mut Parser`
/// of its own to recurse through further `!include`s — a guard borrowing
/// only the `include_stack` field can't be held alive across it. Callers
/// must call `leave` exactly once for every successful `enter`, including
/// on the error path.
#[derive(Debug, Default)]
pub struct IncludeStack {
    active: Vec<PathBuf>,
}

impl IncludeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `path` active. Fails with [`IncludeError::Cycle`] if `path` is
    /// already being parsed somewhere up the current include chain.
    pub fn enter(&mut self, path: &Path) -> Result<(), IncludeError> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if self.active.contains(&canonical) {
            return Err(IncludeError::Cycle(canonical.display().to_string()));
        }
        self.active.push(canonical);
        Ok(())
    }

    /// Marks the most recently entered path inactive again.
    pub fn leave(&mut self) {
        self.active.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_single_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.dsl"), "model {\n}\n").unwrap();

        let units = resolve_filesystem(dir.path(), "a.dsl").unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].content.contains("model"));
    }

    #[test]
    fn resolves_directory_in_lexicographic_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.dsl"), "b").unwrap();
        fs::write(dir.path().join("a.dsl"), "a").unwrap();

        let units = resolve_filesystem(dir.path(), ".").unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.content.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn missing_target_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_filesystem(dir.path(), "missing.dsl").unwrap_err();
        assert!(matches!(err, IncludeError::NotFound(_)));
    }

    #[test]
    fn re_entering_same_path_is_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("self.dsl");
        fs::write(&file, "!include self.dsl\n").unwrap();

        let mut stack = IncludeStack::new();
        stack.enter(&file).unwrap();
        let err = stack.enter(&file).unwrap_err();
        assert!(matches!(err, IncludeError::Cycle(_)));
    }

    #[test]
    fn leaving_allows_re_entry() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("once.dsl");
        fs::write(&file, "model {\n}\n").unwrap();

        let mut stack = IncludeStack::new();
        stack.enter(&file).unwrap();
        stack.leave();
        assert!(stack.enter(&file).is_ok());
    }
}
