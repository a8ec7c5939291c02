//! The public parser surface: owns a file registry, accumulates
//! diagnostics, and exposes `parse`/`parse_str`, generic over the
//! external workspace collaborator productions mutate.

mod dispatcher;
mod productions;

use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::base::{FileId, FileRegistry, Position};
use crate::constants::ConstantTable;
use crate::context::ContextStack;
use crate::errors::{ParseError, ParserError};
use crate::identifiers::{IdentifierRegister, IdentifierScope};
use crate::include::IncludeStack;
use crate::listener::{Listener, NullListener};
use crate::model::{Workspace, WorkspaceBuilder};

/// Ingests architecture DSL source and materialises a workspace.
///
/// `B` is the workspace collaborator productions mutate; it defaults to
/// this crate's own in-memory [`Workspace`], but any [`WorkspaceBuilder`]
/// implementation can be substituted.
pub struct Parser<B: WorkspaceBuilder = Workspace> {
    pub(crate) files: FileRegistry,
    pub(crate) constants: ConstantTable,
    pub(crate) register: IdentifierRegister,
    pub(crate) restricted: bool,
    pub(crate) listener: Box<dyn Listener>,
    pub(crate) stack: ContextStack,
    pub(crate) workspace: Option<B>,
    pub(crate) echoed: String,
    pub(crate) include_stack: IncludeStack,
    /// The `!impliedRelationships`/`impliedRelationships` strategy name,
    /// last-wins (see DESIGN.md's Open Question log).
    pub(crate) implied_relationships: Option<String>,
    /// Base directory for resolving a relative `!include` when the
    /// currently parsing source has no file of its own to derive one from
    /// (an in-memory fragment parsed via `parse_str`). Unset, such an
    /// include resolves against the process's current directory.
    pub(crate) base_dir: Option<PathBuf>,
}

impl<B: WorkspaceBuilder + Default> Default for Parser<B>
where
    B: Default,
{
    fn default() -> Self {
        Self {
            files: FileRegistry::new(),
            constants: ConstantTable::new(),
            register: IdentifierRegister::new(),
            restricted: false,
            listener: Box::new(NullListener),
            stack: ContextStack::new(),
            workspace: None,
            echoed: String::new(),
            include_stack: IncludeStack::new(),
            implied_relationships: None,
            base_dir: None,
        }
    }
}

impl Parser<Workspace> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: WorkspaceBuilder + Default> Parser<B> {
    /// Constructs a parser around a workspace that already has a model —
    /// as if loaded via `workspace extends` — so `is_extending()` reports
    /// true from the first line.
    pub fn extending(workspace: B) -> Self {
        let mut parser = Self::default();
        parser.workspace = Some(workspace);
        parser
    }
}

impl<B: WorkspaceBuilder + Default> Parser<B> {
    pub fn set_restricted(&mut self, restricted: bool) {
        self.restricted = restricted;
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn set_identifier_scope(&mut self, scope: IdentifierScope) {
        self.register.set_scope(scope);
    }

    /// Sets the directory a relative `!include` resolves against when the
    /// fragment being parsed (via [`Self::parse_str`]) has no file of its
    /// own to derive one from.
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = Some(dir.into());
    }

    pub fn set_listener(&mut self, listener: impl Listener + 'static) {
        self.listener = Box::new(listener);
    }

    /// Returns the materialised workspace, re-attaching the echoed DSL
    /// before handing it back.
    pub fn workspace(&mut self) -> Option<&B> {
        if let Some(ws) = &mut self.workspace {
            ws.set_echoed_dsl(self.echoed.clone());
        }
        self.workspace.as_ref()
    }

    pub fn into_workspace(mut self) -> Option<B> {
        if let Some(ws) = &mut self.workspace {
            ws.set_echoed_dsl(self.echoed.clone());
        }
        self.workspace
    }

    /// Parses an in-memory DSL fragment with no enclosing file.
    #[instrument(skip(self, text))]
    pub fn parse_str(&mut self, text: &str) -> Result<(), ParserError> {
        let file = self.files.intern_inline();
        info!(lines = text.lines().count(), "parsing inline fragment");
        self.process_source(file, text)
            .map_err(|e| self.into_parser_error(e, file))
    }

    /// Parses a single file or, if `path` is a directory, every file
    /// beneath it in lexicographic order.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_file(&mut self, path: &Path) -> Result<(), ParserError> {
        let units = crate::include::resolve_filesystem(Path::new(""), &path.display().to_string())
            .map_err(|e| {
                let file = self.files.intern_path(path);
                let position = Position::new(file, 0);
                self.into_parser_error(
                    ParseError::builder(position, "", crate::errors::ErrorCode::E0405).message(e.to_string()).build(),
                    file,
                )
            })?;

        for unit in units {
            let entry_path = Path::new(&unit.origin);
            let file = self.files.intern_path(entry_path);
            self.include_stack.enter(entry_path).map_err(|e| {
                let position = Position::new(file, 0);
                self.into_parser_error(
                    ParseError::builder(position, "", crate::errors::ErrorCode::E0402).message(e.to_string()).build(),
                    file,
                )
            })?;
            info!(file = %unit.origin, "entering file");
            let result = self.process_source(file, &unit.content);
            self.include_stack.leave();
            info!(file = %unit.origin, "leaving file");
            result.map_err(|e| self.into_parser_error(e, file))?;
        }
        Ok(())
    }

    fn into_parser_error(&self, error: ParseError, file: FileId) -> ParserError {
        error!(code = ?error.code, line = error.position.line, "parse error");
        ParserError::new(error, &self.files.display(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_workspace_and_exposes_workspace() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
}"#,
            )
            .unwrap();

        let ws = parser.workspace().unwrap();
        assert_eq!(ws.model.elements.len(), 2);
        assert_eq!(ws.model.relationships.len(), 1);
    }

    #[test]
    fn hierarchical_scope_keys_a_container_under_its_system() {
        use crate::identifiers::IdentifierScope;

        let mut parser = Parser::<Workspace>::new();
        parser.set_identifier_scope(IdentifierScope::Hierarchical);
        parser
            .parse_str(
                r#"workspace {
    model {
        ss = softwareSystem "S" {
            web = container "W"
        }
    }
}"#,
            )
            .unwrap();

        assert!(
            parser.register.get_element("web").is_none(),
            "the container should only be reachable under its qualified key"
        );
        let system = parser.register.get_element("ss");
        let container = parser.register.get_element("ss.web");
        assert!(system.is_some());
        assert!(container.is_some());
        assert_ne!(system, container);
    }

    #[test]
    fn hierarchical_scope_via_identifiers_directive_matches_explicit_call() {
        use crate::identifiers::IdentifierScope;

        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    !identifiers hierarchical
    model {
        ss = softwareSystem "S" {
            web = container "W"
        }
    }
}"#,
            )
            .unwrap();

        assert_eq!(parser.register.scope(), IdentifierScope::Hierarchical);
        assert!(parser.register.get_element("ss.web").is_some());
    }

    #[test]
    fn hierarchical_scope_keys_deployment_nodes_under_their_environment() {
        use crate::identifiers::IdentifierScope;

        let mut parser = Parser::<Workspace>::new();
        parser.set_identifier_scope(IdentifierScope::Hierarchical);
        parser
            .parse_str(
                r#"workspace {
    model {
        deploymentEnvironment "Live" {
            node1 = deploymentNode "Server" {
                node2 = deploymentNode "Instance"
            }
        }
    }
}"#,
            )
            .unwrap();

        assert!(parser.register.get_element("node1").is_none());
        assert!(parser.register.get_element("node2").is_none());
        assert!(parser.register.get_element("live.node1").is_some());
        assert!(parser.register.get_element("live.node1.node2").is_some());
    }

    #[test]
    fn entry_file_include_cycle_is_reported_as_e0402() {
        use crate::errors::ErrorCode;

        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.dsl");
        let b = dir.path().join("b.dsl");
        std::fs::write(&a, "workspace {\n    model {\n        u = person \"User\"\n        !include b.dsl\n    }\n}\n").unwrap();
        std::fs::write(&b, "!include a.dsl\n").unwrap();

        let mut parser = Parser::<Workspace>::new();
        let err = parser.parse_file(&a).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0402);
    }

    #[test]
    fn base_dir_resolves_a_relative_include_from_an_inline_fragment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("included.dsl"), "u = person \"User\"\n").unwrap();

        let mut parser = Parser::<Workspace>::new();
        parser.set_base_dir(dir.path());
        parser
            .parse_str(
                r#"workspace {
    model {
        !include included.dsl
    }
}"#,
            )
            .unwrap();

        let ws = parser.workspace().unwrap();
        assert_eq!(ws.model.elements.len(), 1);
    }
}
