//! Workspace-level productions and the bang-prefixed directives that are
//! legal in any context: `!constant`, `!include`, `!identifiers`,
//! `!impliedRelationships`, `!docs`/`!adrs`, `!plugin`, `!script`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::base::Position;
use crate::context::ContextFrame;
use crate::errors::{ErrorCode, ParseError};
use crate::identifiers::{IdentifierScope, RegisterError};
use crate::model::WorkspaceBuilder;
use crate::tokenizer::Token;

use super::args_and_block;
use crate::parser::Parser;

pub(crate) fn register_error_to_parse_error(position: Position, raw_line: &str, error: RegisterError) -> ParseError {
    match error {
        RegisterError::InvalidIdentifier { identifier } => ParseError::builder(position, raw_line, ErrorCode::E0201)
            .message(format!("'{identifier}' is not a valid identifier"))
            .build(),
        RegisterError::IdentifierInUse { identifier } => ParseError::builder(position, raw_line, ErrorCode::E0202)
            .message(format!("identifier '{identifier}' is already in use"))
            .build(),
        RegisterError::ElementAlreadyHasIdentifier { existing, existing_is_synthetic } => {
            let builder = ParseError::builder(position, raw_line, ErrorCode::E0203)
                .message(format!("this element is already registered as '{existing}'"));
            if existing_is_synthetic {
                builder.hint("name the element before referencing it again with !ref").build()
            } else {
                builder.build()
            }
        }
    }
}

fn restricted_error(position: Position, raw_line: &str, feature: &str) -> ParseError {
    warn!(feature, line = position.line, "rejected in restricted mode");
    ParseError::builder(position, raw_line, ErrorCode::E0501)
        .message(format!("'{feature}' is not available in restricted mode"))
        .build()
}

pub fn workspace_open<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !parser.stack.is_empty() {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0302)
            .message("'workspace' may only appear once, at the top level")
            .build());
    }
    let (args, _) = args_and_block(rest);
    if parser.workspace.is_none() {
        parser.workspace = Some(B::default());
    }
    if let Some(ws) = &mut parser.workspace {
        if let Some(name) = args.first() {
            ws.set_name(name);
        }
        if let Some(description) = args.get(1) {
            ws.set_description(description);
        }
    }
    parser.stack.push(ContextFrame::Workspace);
    Ok(())
}

pub fn workspace_name<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, rest: &[Token]) {
    let (args, _) = args_and_block(rest);
    if let (Some(ws), Some(name)) = (&mut parser.workspace, args.first()) {
        ws.set_name(name);
    }
}

pub fn configuration_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Workspace)) {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0302)
            .message("'configuration' is only valid directly under 'workspace'")
            .build());
    }
    parser.stack.push(ContextFrame::Configuration);
    Ok(())
}

pub fn users_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Configuration)) {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0302)
            .message("'users' is only valid directly under 'configuration'")
            .build());
    }
    parser.stack.push(ContextFrame::Users);
    Ok(())
}

pub fn user_pair<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, _position: Position, _raw_line: &str, tokens: &[Token]) -> Result<(), ParseError> {
    let texts: Vec<&str> = tokens.iter().filter_map(Token::text).collect();
    let username = texts.first().copied().unwrap_or_default().to_string();
    let role = texts.get(1).copied().unwrap_or_default().to_string();
    if let Some(ws) = &mut parser.workspace {
        ws.configuration_mut().users.push((username, role));
    }
    Ok(())
}

pub fn set_identifiers<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    match args.first().map(|s| s.to_lowercase()).as_deref() {
        Some("flat") => parser.set_identifier_scope(IdentifierScope::Flat),
        Some("hierarchical") => parser.set_identifier_scope(IdentifierScope::Hierarchical),
        _ => {
            return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
                .message("'!identifiers' expects 'flat' or 'hierarchical'")
                .build())
        }
    }
    Ok(())
}

pub fn implied_relationships<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, rest: &[Token]) {
    let (args, _) = args_and_block(rest);
    // Last-wins.
    parser.implied_relationships = args.first().cloned();
}

pub fn constant<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let value = args.get(1).cloned().unwrap_or_default();
    if !parser.constants.define(&name, &value) {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
            .message(format!("'{name}' is not a valid constant name"))
            .build());
    }
    Ok(())
}

pub fn docs_or_adrs<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if parser.restricted {
        return Err(restricted_error(position, raw_line, "!docs/!adrs"));
    }
    // The documentation/ADR importer is an external collaborator;
    // this parser only needs to accept and ignore the directive in scope.
    debug!("!docs/!adrs directive accepted (importer is an external collaborator)");
    Ok(())
}

pub fn plugin_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    if parser.restricted {
        return Err(restricted_error(position, raw_line, "!plugin"));
    }
    let (args, _) = args_and_block(rest);
    let fqcn = args.first().cloned().unwrap_or_default();
    parser.stack.push(ContextFrame::Plugin { fqcn, params: Vec::new() });
    Ok(())
}

pub fn plugin_param<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, _position: Position, _raw_line: &str, tokens: &[Token]) -> Result<(), ParseError> {
    let texts: Vec<&str> = tokens.iter().filter_map(Token::text).collect();
    let name = texts.first().copied().unwrap_or_default().to_string();
    let value = texts.get(1..).unwrap_or(&[]).join(" ");
    if let Some(ContextFrame::Plugin { params, .. }) = parser.stack.top_mut() {
        params.push((name, value));
    }
    Ok(())
}

pub fn script_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    if parser.restricted {
        return Err(restricted_error(position, raw_line, "!script"));
    }
    let (args, opens_block) = args_and_block(rest);
    if opens_block {
        let language = args.first().cloned();
        parser.stack.push(ContextFrame::InlineScript { language, body: String::new() });
    } else {
        // `!script <file>` form: the script body lives in an external file;
        // execution is an external collaborator, so this parser
        // only validates the directive shape.
        if args.is_empty() {
            return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
                .message("'!script' expects a language (with a block) or a file path")
                .build());
        }
    }
    Ok(())
}

pub fn include<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    let target = args.first().cloned().unwrap_or_default();
    let is_url = target.starts_with("https://");

    if !is_url && parser.restricted {
        return Err(restricted_error(position, raw_line, "!include"));
    }

    if is_url {
        let unit = crate::include::resolve_url(&target)
            .map_err(|e| ParseError::builder(position, raw_line, ErrorCode::E0404).message(e.to_string()).build())?;
        let file = parser.files.intern_url(&unit.origin);
        info!(url = %target, "entering include");
        let result = parser.process_source(file, &unit.content);
        info!(url = %target, "leaving include");
        return result;
    }

    let base_dir = current_base_dir(parser, position.file);
    let units = crate::include::resolve_filesystem(&base_dir, &target).map_err(|e| match e {
        crate::include::IncludeError::NotFound(s) => {
            ParseError::builder(position, raw_line, ErrorCode::E0405).message(s).build()
        }
        other => ParseError::builder(position, raw_line, ErrorCode::E0403).message(other.to_string()).build(),
    })?;

    for unit in units {
        let path = Path::new(&unit.origin);
        parser
            .include_stack
            .enter(path)
            .map_err(|e| ParseError::builder(position, raw_line, ErrorCode::E0402).message(e.to_string()).build())?;
        let file = parser.files.intern_path(path);
        info!(file = %unit.origin, "entering include");
        let result = parser.process_source(file, &unit.content);
        parser.include_stack.leave();
        info!(file = %unit.origin, "leaving include");
        result?;
    }
    Ok(())
}

fn current_base_dir<B: WorkspaceBuilder + Default>(parser: &Parser<B>, file: crate::base::FileId) -> std::path::PathBuf {
    match parser.files.origin(file) {
        crate::base::SourceOrigin::Path(p) => p.parent().map(Path::to_path_buf).unwrap_or_default(),
        _ => parser.base_dir.clone().unwrap_or_default(),
    }
}
