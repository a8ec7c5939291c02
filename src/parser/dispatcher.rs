//! Line-by-line dispatch: comment/script/multi-line-comment
//! handling, tokenising, substitution, assignment detection, context-end,
//! and keyword dispatch against the context stack.

use tracing::{debug, trace, warn};

use crate::base::{FileId, Position};
use crate::context::{ContextFrame, ModelItemRef, PendingElementStyle, PendingRelationshipStyle, ViewFrameKind};
use crate::errors::{ErrorCode, ParseError};
use crate::model::WorkspaceBuilder;
use crate::substitution::substitute;
use crate::tokenizer::{tokenize, Token};

use super::productions::{deployment, directives, model, relationships, styles, views};
use super::Parser;

/// Which `name value`-pair-accepting frame is currently open.
enum PairFrame {
    Properties(ModelItemRef),
    Perspectives(ModelItemRef),
    Users,
    Plugin,
}

impl<B: WorkspaceBuilder + Default> Parser<B> {
    pub(crate) fn process_source(&mut self, file: FileId, text: &str) -> Result<(), ParseError> {
        for (index, raw_line) in text.lines().enumerate() {
            let position = Position::new(file, (index + 1) as u32);
            self.process_line(position, raw_line)?;
        }
        Ok(())
    }

    fn process_line(&mut self, position: Position, raw_line: &str) -> Result<(), ParseError> {
        let trimmed = raw_line.trim_end();

        // InlineScript frames swallow every line verbatim until a lone `}`.
        if let Some(ContextFrame::InlineScript { .. }) = self.stack.top() {
            if trimmed.trim_start() == "}" {
                let frame = self.stack.pop().unwrap();
                if let ContextFrame::InlineScript { language, body } = frame {
                    trace!(language = ?language, bytes = body.len(), "inline script frame closed");
                }
                self.stack_end_hook(position, raw_line)?;
            } else if let Some(ContextFrame::InlineScript { body, .. }) = self.stack.top_mut() {
                body.push_str(raw_line);
                body.push('\n');
            }
            self.append_echoed(raw_line);
            return Ok(());
        }

        // Multi-line `/* ... */` comments: lines inside are discarded entirely.
        if let Some(ContextFrame::Comment) = self.stack.top() {
            if trimmed.trim_end().ends_with("*/") {
                self.stack.pop();
            }
            return Ok(());
        }

        let stripped = trimmed.trim_start();
        if stripped.is_empty() || stripped.starts_with("//") || stripped.starts_with('#') {
            self.append_echoed(raw_line);
            return Ok(());
        }
        if stripped.starts_with("/*") && !stripped.trim_end().ends_with("*/") {
            self.stack.push(ContextFrame::Comment);
            self.append_echoed(raw_line);
            return Ok(());
        }

        let tokens = tokenize(stripped).map_err(|_| {
            ParseError::new(position, raw_line, ErrorCode::E0101, ErrorCode::E0101.default_message())
        })?;
        if tokens.is_empty() {
            self.append_echoed(raw_line);
            return Ok(());
        }

        let substituted: Vec<Token> = tokens
            .into_iter()
            .map(|token| match token {
                Token::Bareword(s) => Token::Bareword(substitute(&s, &self.constants, self.restricted)),
                Token::Quoted(s) => Token::Quoted(substitute(&s, &self.constants, self.restricted)),
                operator => operator,
            })
            .collect();
        trace!(line = position.line, tokens = ?substituted, "tokenised and substituted");

        // Assignment detection: `name = rest...`.
        let (pending_identifier, rest): (Option<String>, &[Token]) =
            if substituted.len() > 3 && substituted[1] == Token::Equals {
                let name = substituted[0]
                    .text()
                    .map(str::to_string)
                    .filter(|s| crate::identifiers::is_valid_word(s));
                match name {
                    Some(name) => (Some(name), &substituted[2..]),
                    None => {
                        return Err(ParseError::new(
                            position,
                            raw_line,
                            ErrorCode::E0201,
                            ErrorCode::E0201.default_message(),
                        ))
                    }
                }
            } else {
                (None, substituted.as_slice())
            };

        // Context-end: a sole `}`.
        if rest.len() == 1 && rest[0] == Token::ContextEnd {
            if self.stack.is_empty() {
                return Err(ParseError::new(
                    position,
                    raw_line,
                    ErrorCode::E0303,
                    ErrorCode::E0303.default_message(),
                ));
            }
            self.stack_end_hook(position, raw_line)?;
            self.append_echoed(raw_line);
            return Ok(());
        }

        // A bare `{` inside a dynamic view opens a parallel-sequence block:
        // a nested set of relationship lines that share an animation step
        // instead of being sequenced one after another.
        if rest.len() == 1 && rest[0] == Token::ContextStart {
            let in_dynamic_view = matches!(
                self.stack.top(),
                Some(ContextFrame::View { kind: ViewFrameKind::Dynamic, .. }) | Some(ContextFrame::DynamicViewParallelSequence { .. })
            );
            let view_index = if in_dynamic_view { self.stack.nearest_view_index() } else { None };
            return match view_index {
                Some(view_index) => {
                    self.stack.push(ContextFrame::DynamicViewParallelSequence { view_index });
                    self.append_echoed(raw_line);
                    Ok(())
                }
                None => Err(ParseError::builder(position, raw_line, ErrorCode::E0302)
                    .message("a bare '{' is only valid inside a 'dynamic' view")
                    .build()),
            };
        }

        // Sub-frames that accept bare `name value` pairs rather than
        // keyword productions.
        let pair_frame = match self.stack.top() {
            Some(ContextFrame::ModelItemProperties { target }) => Some(PairFrame::Properties(*target)),
            Some(ContextFrame::ModelItemPerspectives { target }) => Some(PairFrame::Perspectives(*target)),
            Some(ContextFrame::Users) => Some(PairFrame::Users),
            Some(ContextFrame::Plugin { .. }) => Some(PairFrame::Plugin),
            _ => None,
        };
        if let Some(pair_frame) = pair_frame {
            match pair_frame {
                PairFrame::Properties(target) => model::property_pair(self, position, raw_line, target, rest)?,
                PairFrame::Perspectives(target) => model::perspective_pair(self, position, raw_line, target, rest)?,
                PairFrame::Users => directives::user_pair(self, position, raw_line, rest)?,
                PairFrame::Plugin => directives::plugin_param(self, position, raw_line, rest)?,
            }
            self.append_echoed(raw_line);
            return Ok(());
        }

        let is_include = self.dispatch(position, raw_line, rest, pending_identifier.as_deref())?;
        if !is_include {
            self.append_echoed(raw_line);
        }
        Ok(())
    }

    fn append_echoed(&mut self, raw_line: &str) {
        self.echoed.push_str(raw_line);
        self.echoed.push('\n');
    }

    /// Pops the top frame and runs its `end` hook: the frame's close-time
    /// effect, if any, collapsed into a single match expression.
    fn stack_end_hook(&mut self, position: Position, raw_line: &str) -> Result<(), ParseError> {
        let frame = self.stack.pop().expect("checked non-empty by caller");
        let name = frame.name();
        match frame {
            ContextFrame::Model => {
                if let Some(ws) = &mut self.workspace {
                    ws.finalize_enterprise_boundary();
                }
            }
            ContextFrame::Plugin { fqcn, params } => {
                trace!(fqcn = %fqcn, params = params.len(), "plugin frame closed (execution out of scope)");
            }
            ContextFrame::ElementStyle(PendingElementStyle(style)) => {
                if let Some(ws) = &mut self.workspace {
                    ws.add_element_style(style);
                }
            }
            ContextFrame::RelationshipStyle(PendingRelationshipStyle(style)) => {
                if let Some(ws) = &mut self.workspace {
                    ws.add_relationship_style(style);
                }
            }
            _ => {}
        }
        let _ = (position, raw_line);
        self.listener.on_context_end(name);
        Ok(())
    }

    /// Keyword dispatch. Returns `Ok(true)` when the
    /// line was an `!include` directive, so the caller knows to elide it
    /// from the echoed DSL.
    fn dispatch(
        &mut self,
        position: Position,
        raw_line: &str,
        tokens: &[Token],
        pending_identifier: Option<&str>,
    ) -> Result<bool, ParseError> {
        let keyword = match tokens[0].text() {
            Some(text) => text.to_lowercase(),
            None if tokens[0] == Token::Arrow => "->".to_string(),
            None => {
                return Err(ParseError::new(
                    position,
                    raw_line,
                    ErrorCode::E0301,
                    ErrorCode::E0301.default_message(),
                ))
            }
        };

        // `terminology { }` accepts any entity-name keyword as a sub-key
        // (person, softwareSystem, relationship, ...), so it is checked
        // ahead of the keyword table rather than folded into it.
        if matches!(self.stack.top(), Some(ContextFrame::Terminology)) {
            styles::terminology_property(self, position, raw_line, &keyword, &tokens[1..])?;
            return Ok(false);
        }

        let frame = self.stack.top().map(ContextFrame::name).unwrap_or("<top-level>");
        debug!(keyword = %keyword, frame, line = position.line, "dispatching production");

        match keyword.as_str() {
            "->" => {
                relationships::implicit(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "workspace" => {
                directives::workspace_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "model" => {
                model::model_open(self, position, raw_line)?;
                Ok(false)
            }
            "enterprise" => {
                model::enterprise_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "group" => {
                model::group_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "person" => {
                model::person(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "softwaresystem" => {
                model::software_system(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "container" if matches!(self.stack.effective(), crate::context::EffectiveContext::SoftwareSystem(_)) => {
                model::container(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "container" if matches!(self.stack.top(), Some(ContextFrame::Views)) => {
                views::view_open(self, position, raw_line, "container", &tokens[1..])?;
                Ok(false)
            }
            "component" if matches!(self.stack.effective(), crate::context::EffectiveContext::Container(_)) => {
                model::component(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "component" if matches!(self.stack.top(), Some(ContextFrame::Views)) => {
                views::view_open(self, position, raw_line, "component", &tokens[1..])?;
                Ok(false)
            }
            "element" if matches!(self.stack.top(), Some(ContextFrame::Model)) => {
                model::custom_element(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "element" if matches!(self.stack.top(), Some(ContextFrame::Styles)) => {
                styles::element_style(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "relationship" if matches!(self.stack.top(), Some(ContextFrame::Styles)) => {
                styles::relationship_style(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "background" | "color" | "colour" | "stroke" | "border" | "opacity" | "width" | "height" | "fontsize" | "metadata" | "description" | "icon"
                if matches!(self.stack.top(), Some(ContextFrame::ElementStyle(_))) =>
            {
                styles::element_style_property(self, position, raw_line, &keyword, &tokens[1..])?;
                Ok(false)
            }
            "thickness" | "color" | "colour" | "dashed" | "opacity" | "width" | "fontsize" | "position" | "routing"
                if matches!(self.stack.top(), Some(ContextFrame::RelationshipStyle(_))) =>
            {
                styles::relationship_style_property(self, position, raw_line, &keyword, &tokens[1..])?;
                Ok(false)
            }
            "logo" | "font" if matches!(self.stack.top(), Some(ContextFrame::Branding)) => {
                styles::branding_property(self, position, raw_line, &keyword, &tokens[1..])?;
                Ok(false)
            }
            "deploymentenvironment" => {
                deployment::environment_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "deploymentgroup" => {
                deployment::deployment_group(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "deploymentnode" => {
                deployment::deployment_node(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "infrastructurenode" => {
                deployment::infrastructure_node(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "softwaresysteminstance" => {
                deployment::software_system_instance(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "containerinstance" => {
                deployment::container_instance(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "healthcheck" => {
                deployment::health_check(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "!ref" => {
                relationships::resolve_ref(self, position, raw_line, &tokens[1..], pending_identifier)?;
                Ok(false)
            }
            "tags" | "url" | "description" | "technology"
                if self.stack.nearest_model_item().is_some() || matches!(self.stack.top(), Some(ContextFrame::Workspace)) =>
            {
                model::mutate_current(self, position, raw_line, &keyword, &tokens[1..])?;
                Ok(false)
            }
            "name" if matches!(self.stack.top(), Some(ContextFrame::Workspace)) => {
                directives::workspace_name(self, &tokens[1..]);
                Ok(false)
            }
            "properties" => {
                model::properties_open(self, position, raw_line)?;
                Ok(false)
            }
            "perspectives" => {
                model::perspectives_open(self, position, raw_line)?;
                Ok(false)
            }
            "views" => {
                views::views_open(self, position, raw_line)?;
                Ok(false)
            }
            "systemlandscape" => {
                views::view_open(self, position, raw_line, "systemlandscape", &tokens[1..])?;
                Ok(false)
            }
            "systemcontext" => {
                views::view_open(self, position, raw_line, "systemcontext", &tokens[1..])?;
                Ok(false)
            }
            "dynamic" => {
                views::view_open(self, position, raw_line, "dynamic", &tokens[1..])?;
                Ok(false)
            }
            "deployment" if matches!(self.stack.top(), Some(ContextFrame::Views)) => {
                views::view_open(self, position, raw_line, "deployment", &tokens[1..])?;
                Ok(false)
            }
            "filtered" => {
                views::view_open(self, position, raw_line, "filtered", &tokens[1..])?;
                Ok(false)
            }
            "customview" => {
                views::view_open(self, position, raw_line, "custom", &tokens[1..])?;
                Ok(false)
            }
            "include" => {
                views::include_expr(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "exclude" => {
                views::exclude_expr(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "autolayout" => {
                views::auto_layout(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "title" => {
                views::title(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "animation" => {
                views::animation_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "animationstep" => {
                views::animation_step(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "styles" => {
                styles::styles_open(self, position, raw_line)?;
                Ok(false)
            }
            "branding" => {
                styles::branding_open(self, position, raw_line)?;
                Ok(false)
            }
            "theme" | "themes" => {
                styles::theme(self, position, raw_line, &tokens[1..]);
                Ok(false)
            }
            "terminology" => {
                styles::terminology_open(self, position, raw_line)?;
                Ok(false)
            }
            "configuration" => {
                directives::configuration_open(self, position, raw_line)?;
                Ok(false)
            }
            "users" => {
                directives::users_open(self, position, raw_line)?;
                Ok(false)
            }
            "!identifiers" => {
                directives::set_identifiers(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "!impliedrelationships" | "impliedrelationships" => {
                directives::implied_relationships(self, &tokens[1..]);
                Ok(false)
            }
            "!constant" => {
                directives::constant(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "!include" => {
                directives::include(self, position, raw_line, &tokens[1..])?;
                Ok(true)
            }
            "!docs" | "!adrs" => {
                directives::docs_or_adrs(self, position, raw_line)?;
                Ok(false)
            }
            "!plugin" => {
                directives::plugin_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            "!script" => {
                directives::script_open(self, position, raw_line, &tokens[1..])?;
                Ok(false)
            }
            _ if tokens.len() >= 2 && tokens[1] == Token::Arrow => {
                relationships::explicit(self, position, raw_line, tokens, pending_identifier)?;
                Ok(false)
            }
            _ => {
                warn!(keyword = %keyword, line = position.line, "no production matched");
                Err(ParseError::new(position, raw_line, ErrorCode::E0301, ErrorCode::E0301.default_message()))
            }
        }
    }
}

/// Resolves an implicit-relationship or `tags`/`url`/... target against the
/// nearest model-item frame, raising *wrong context* if there isn't one.
pub(crate) fn require_model_item(
    stack: &crate::context::ContextStack,
    position: Position,
    raw_line: &str,
) -> Result<ModelItemRef, ParseError> {
    stack.nearest_model_item().ok_or_else(|| {
        ParseError::builder(position, raw_line, ErrorCode::E0302)
            .message("no element or relationship is currently open")
            .build()
    })
}
