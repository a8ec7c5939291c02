//! Line-level parse error with full provenance.
//!
//! A builder-style diagnostic type (hint, severity, provenance) trimmed to
//! what every failure here actually needs to carry: source file, 1-based
//! line number, and the raw source line text, plus an [`ErrorCode`] and a
//! human-readable message. `related` spans and `Severity::Warning`/`Hint`
//! are not used by this parser — every raised error is fatal at the line
//! level — but the fields are kept so a future caller (e.g. a
//! `!plugin` that wants to surface a warning through the same channel)
//! has somewhere to put one.

use super::codes::ErrorCode;
use crate::base::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Hint,
}

/// A fully-attributed parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub position: Position,
    pub source_line: String,
    pub code: ErrorCode,
    pub message: String,
    pub severity: Severity,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(
        position: Position,
        source_line: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            position,
            source_line: source_line.into(),
            code,
            message: message.into(),
            severity: Severity::Error,
            hint: None,
        }
    }

    pub fn builder(position: Position, source_line: impl Into<String>, code: ErrorCode) -> ParseErrorBuilder {
        ParseErrorBuilder {
            position,
            source_line: source_line.into(),
            code,
            message: None,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Render as `file:line: error[CODE]: message (hint: ...)`.
    pub fn format(&self, file_display: &str) -> String {
        let mut out = format!(
            "{file}:{line}: {sev}[{code}]: {msg}",
            file = file_display,
            line = self.position.line,
            sev = match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Hint => "hint",
            },
            code = self.code,
            msg = self.message,
        );
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\n  hint: {hint}"));
        }
        out.push_str(&format!("\n  | {}", self.source_line));
        out
    }
}

pub struct ParseErrorBuilder {
    position: Position,
    source_line: String,
    code: ErrorCode,
    message: Option<String>,
    hint: Option<String>,
}

impl ParseErrorBuilder {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn build(self) -> ParseError {
        ParseError {
            message: self
                .message
                .unwrap_or_else(|| self.code.default_message().to_string()),
            position: self.position,
            source_line: self.source_line,
            code: self.code,
            severity: Severity::Error,
            hint: self.hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileRegistry;

    #[test]
    fn builder_falls_back_to_default_message() {
        let mut files = FileRegistry::new();
        let file = files.intern_inline();
        let err = ParseError::builder(Position::new(file, 3), "mdel { }", ErrorCode::E0301).build();
        assert_eq!(err.message, "unexpected tokens");
    }

    #[test]
    fn format_includes_code_line_and_source_text() {
        let mut files = FileRegistry::new();
        let file = files.intern_inline();
        let err = ParseError::new(Position::new(file, 7), "mdel { }", ErrorCode::E0301, "unexpected tokens")
            .with_hint("did you mean 'model'?");
        let rendered = err.format("<inline>");
        assert!(rendered.contains("E0301"));
        assert!(rendered.contains(":7:"));
        assert!(rendered.contains("mdel { }"));
        assert!(rendered.contains("did you mean 'model'?"));
    }
}
