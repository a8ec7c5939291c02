use super::FileId;

/// A source location: which file, and which 1-based line within it.
///
/// Every diagnostic here needs is file + 1-based line number + the raw
/// source line text; there is no need for byte or column ranges, so unlike
/// a `Position`/`Span` pair built for LSP hover/goto-definition, this crate
/// only tracks the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: FileId,
    pub line: u32,
}

impl Position {
    pub fn new(file: FileId, line: u32) -> Self {
        Self { file, line }
    }
}
