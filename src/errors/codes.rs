//! Error code definitions for parser diagnostics.
//!
//! A categorisation scheme (`E{category}{number}`) for this DSL's own
//! error kinds:
//! - E01xx: tokeniser errors
//! - E02xx: identifier register errors
//! - E03xx: dispatcher / context-stack errors
//! - E04xx: reference and include-resolution errors
//! - E05xx: restricted-mode errors
//! - E09xx: generic / plugin-script errors

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unterminated string literal.
    E0101,

    /// Invalid identifier (doesn't match `\w+`).
    E0201,
    /// Identifier already in use (collision in the register).
    E0202,
    /// Same element registered twice under different identifiers.
    E0203,

    /// Dispatcher saw no matching production for the current line.
    E0301,
    /// A production required a specific parent frame not on top of the stack.
    E0302,
    /// `}` seen with an empty context stack.
    E0303,

    /// `!ref` target not found.
    E0401,
    /// `!include` cycle detected.
    E0402,
    /// Include I/O error (file not found, unreadable, etc).
    E0403,
    /// HTTP fetch error resolving an `https://` include.
    E0404,
    /// `parse(path)` target file or directory not found.
    E0405,

    /// Restricted mode: plugin, script, include, or docs/adrs directive rejected.
    E0501,

    /// Plugin or script execution error.
    E0901,
    /// Fallback for handler errors caught at the dispatcher with no dedicated code.
    E0999,
}

impl ErrorCode {
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "unterminated string literal",
            Self::E0201 => "invalid identifier",
            Self::E0202 => "identifier already in use",
            Self::E0203 => "element already has an identifier",
            Self::E0301 => "unexpected tokens",
            Self::E0302 => "wrong context for this directive",
            Self::E0303 => "unexpected end of context",
            Self::E0401 => "reference not found",
            Self::E0402 => "include cycle detected",
            Self::E0403 => "include I/O error",
            Self::E0404 => "HTTP fetch error",
            Self::E0405 => "file not found",
            Self::E0501 => "feature not available in restricted mode",
            Self::E0901 => "plugin or script execution error",
            Self::E0999 => "parse error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_a_non_empty_default_message() {
        let codes = [
            ErrorCode::E0101,
            ErrorCode::E0201,
            ErrorCode::E0202,
            ErrorCode::E0203,
            ErrorCode::E0301,
            ErrorCode::E0302,
            ErrorCode::E0303,
            ErrorCode::E0401,
            ErrorCode::E0402,
            ErrorCode::E0403,
            ErrorCode::E0404,
            ErrorCode::E0405,
            ErrorCode::E0501,
            ErrorCode::E0901,
            ErrorCode::E0999,
        ];
        for code in codes {
            assert!(!code.default_message().is_empty());
        }
    }

    #[test]
    fn display_matches_debug_name() {
        assert_eq!(ErrorCode::E0301.to_string(), "E0301");
    }
}
