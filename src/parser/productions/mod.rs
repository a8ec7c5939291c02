//! Per-keyword production handlers, split by subject area into one file
//! per concern rather than one God-module; each function here owns the
//! guarded match for its own keyword, checks the top of the context stack
//! itself, and raises `E0302` ("wrong context") when called against a
//! stack it doesn't recognise.

pub mod deployment;
pub mod directives;
pub mod model;
pub mod relationships;
pub mod styles;
pub mod views;

use crate::tokenizer::Token;

/// Splits the tokens *after* the keyword into plain-text arguments and
/// whether the line opens a block (ends in `{`).
pub fn args_and_block(rest: &[Token]) -> (Vec<String>, bool) {
    let opens_block = matches!(rest.last(), Some(Token::ContextStart));
    let body = if opens_block { &rest[..rest.len() - 1] } else { rest };
    let args = body.iter().filter_map(Token::text).map(str::to_string).collect();
    (args, opens_block)
}
