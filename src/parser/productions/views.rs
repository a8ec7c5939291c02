//! `views`, the seven view-opener productions, and the productions legal
//! inside a view body: `include`/`exclude`, `autoLayout`, `title`,
//! `animation`/`animationStep`, and the `DynamicViewParallelSequence`
//! block a bare `{` opens inside a dynamic view.

use crate::base::Position;
use crate::context::{ContextFrame, ViewFrameKind};
use crate::errors::{ErrorCode, ParseError};
use crate::model::{AutoLayout, ElementId, ViewKind, WorkspaceBuilder};
use crate::tokenizer::Token;

use super::args_and_block;

fn wrong_context(position: Position, raw_line: &str, message: impl Into<String>) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0302).message(message).build()
}

fn missing_arg(position: Position, raw_line: &str, message: impl Into<String>) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0301).message(message).build()
}

fn resolve_element<B: WorkspaceBuilder + Default>(
    parser: &crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    identifier: &str,
) -> Result<ElementId, ParseError> {
    parser.register.get_element(identifier).ok_or_else(|| {
        ParseError::builder(position, raw_line, ErrorCode::E0401)
            .message(format!("'{identifier}' does not refer to a known element"))
            .build()
    })
}

pub fn views_open<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Workspace)) {
        return Err(wrong_context(position, raw_line, "'views' is only valid directly under 'workspace'"));
    }
    parser.stack.push(ContextFrame::Views);
    Ok(())
}

fn frame_kind_for(kind: &ViewKind) -> ViewFrameKind {
    match kind {
        ViewKind::SystemLandscape => ViewFrameKind::SystemLandscape,
        ViewKind::SystemContext { .. } => ViewFrameKind::SystemContext,
        ViewKind::Container { .. } => ViewFrameKind::Container,
        ViewKind::Component { .. } => ViewFrameKind::Component,
        ViewKind::Dynamic { .. } => ViewFrameKind::Dynamic,
        ViewKind::Deployment { .. } => ViewFrameKind::Deployment,
        ViewKind::Filtered { .. } => ViewFrameKind::Filtered,
        ViewKind::Custom => ViewFrameKind::Custom,
    }
}

/// Any of the seven view-opener keywords: `customView`,
/// `systemLandscape`, `systemContext`, `container`, `component`,
/// `dynamic`, `deployment`, `filtered`. `keyword` selects which; it is
/// the dispatcher's already-lower-cased keyword text, except `"custom"`
/// standing in for `customView`.
pub fn view_open<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    keyword: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Views)) {
        return Err(wrong_context(position, raw_line, format!("'{keyword}' is only valid directly under 'views'")));
    }
    let (args, opens_block) = args_and_block(rest);
    let mut args = args.into_iter();

    let kind = match keyword {
        "systemlandscape" => ViewKind::SystemLandscape,
        "systemcontext" => {
            let target = args.next().ok_or_else(|| missing_arg(position, raw_line, "'systemContext' requires a software system reference"))?;
            ViewKind::SystemContext { software_system: resolve_element(parser, position, raw_line, &target)? }
        }
        "container" => {
            let target = args.next().ok_or_else(|| missing_arg(position, raw_line, "'container' view requires a software system reference"))?;
            ViewKind::Container { software_system: resolve_element(parser, position, raw_line, &target)? }
        }
        "component" => {
            let target = args.next().ok_or_else(|| missing_arg(position, raw_line, "'component' view requires a container reference"))?;
            ViewKind::Component { container: resolve_element(parser, position, raw_line, &target)? }
        }
        "dynamic" => {
            let scope = match args.next() {
                Some(s) if s == "*" => None,
                Some(s) => Some(resolve_element(parser, position, raw_line, &s)?),
                None => None,
            };
            ViewKind::Dynamic { scope }
        }
        "deployment" => {
            let target = args.next().ok_or_else(|| missing_arg(position, raw_line, "'deployment' view requires a software system reference or '*'"))?;
            let software_system = if target == "*" { None } else { Some(resolve_element(parser, position, raw_line, &target)?) };
            let environment = args.next().ok_or_else(|| missing_arg(position, raw_line, "'deployment' view requires an environment name"))?;
            ViewKind::Deployment { software_system, environment }
        }
        "filtered" => {
            let base = args.next().ok_or_else(|| missing_arg(position, raw_line, "'filtered' view requires a base view key"))?;
            ViewKind::Filtered { base_view_key: base }
        }
        "custom" => ViewKind::Custom,
        other => unreachable!("dispatcher only routes known view keywords here, got {other:?}"),
    };

    let key = args.next().unwrap_or_else(|| {
        let ordinal = parser.workspace.as_ref().map(|ws| ws.views().len()).unwrap_or(0);
        format!("view-{ordinal}")
    });
    let description = args.next();

    let frame_kind = frame_kind_for(&kind);
    let ws = parser
        .workspace
        .as_mut()
        .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
    let index = ws.create_view(kind, &key);
    if let Some(description) = description {
        ws.view_mut(index).description = Some(description);
    }
    parser.listener.on_view_parsed(&key);

    if opens_block {
        parser.stack.push(ContextFrame::View { view_index: index, kind: frame_kind });
    }
    Ok(())
}

/// `include <expr>`. `<expr>` must tokenise as a single
/// argument: an unquoted expression containing `->` splits into separate
/// tokens and is rejected here with *unexpected tokens*, matching S4's
/// "exclude * -> element.tag==External (unquoted) fails".
pub fn include_expr<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let view_index = parser
        .stack
        .nearest_view_index()
        .ok_or_else(|| wrong_context(position, raw_line, "'include' is only valid inside a view"))?;
    let (args, _) = args_and_block(rest);
    if args.len() != 1 {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
            .message("'include' expects a single expression argument; quote it if it contains '->'")
            .build());
    }
    if let Some(ws) = &mut parser.workspace {
        ws.view_mut(view_index).includes.push(args.into_iter().next().unwrap());
    }
    Ok(())
}

/// `exclude <expr>`, the `include` production's mirror image.
pub fn exclude_expr<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let view_index = parser
        .stack
        .nearest_view_index()
        .ok_or_else(|| wrong_context(position, raw_line, "'exclude' is only valid inside a view"))?;
    let (args, _) = args_and_block(rest);
    if args.len() != 1 {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
            .message("'exclude' expects a single expression argument; quote it if it contains '->'")
            .build());
    }
    if let Some(ws) = &mut parser.workspace {
        ws.view_mut(view_index).excludes.push(args.into_iter().next().unwrap());
    }
    Ok(())
}

/// `autoLayout [rankDirection] [rankSeparation] [nodeSeparation]`.
pub fn auto_layout<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let view_index = parser
        .stack
        .nearest_view_index()
        .ok_or_else(|| wrong_context(position, raw_line, "'autoLayout' is only valid inside a view"))?;
    let (args, _) = args_and_block(rest);
    let mut args = args.into_iter().peekable();

    let mut layout = AutoLayout::default();
    if let Some(direction) = args.peek() {
        if matches!(direction.to_lowercase().as_str(), "lr" | "rl" | "tb" | "bt") {
            layout.rank_direction = Some(args.next().unwrap().to_uppercase());
        }
    }
    layout.rank_separation = args.next().and_then(|s| s.parse().ok());
    layout.node_separation = args.next().and_then(|s| s.parse().ok());

    if let Some(ws) = &mut parser.workspace {
        ws.view_mut(view_index).auto_layout = Some(layout);
    }
    Ok(())
}

/// `title <text>` inside a view.
pub fn title<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let view_index = parser
        .stack
        .nearest_view_index()
        .ok_or_else(|| wrong_context(position, raw_line, "'title' is only valid inside a view"))?;
    let (args, _) = args_and_block(rest);
    if let Some(ws) = &mut parser.workspace {
        ws.view_mut(view_index).title = Some(args.join(" "));
    }
    Ok(())
}

/// `animation { }`: groups one or more `animationStep` lines under a
/// single block.
pub fn animation_open<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let view_index = parser
        .stack
        .nearest_view_index()
        .ok_or_else(|| wrong_context(position, raw_line, "'animation' is only valid inside a view"))?;
    let (_, opens_block) = args_and_block(rest);
    if !opens_block {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
            .message("'animation' requires a block")
            .build());
    }
    parser.stack.push(ContextFrame::StaticViewAnimation { view_index });
    Ok(())
}

/// `animationStep <ref>...`, either directly inside a view or nested
/// inside an `animation { }` block; both append one step.
pub fn animation_step<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str, rest: &[Token]) -> Result<(), ParseError> {
    let view_index = parser
        .stack
        .nearest_view_index()
        .ok_or_else(|| wrong_context(position, raw_line, "'animationStep' is only valid inside a view"))?;
    let (args, _) = args_and_block(rest);
    if let Some(ws) = &mut parser.workspace {
        ws.view_mut(view_index).animation_steps.push(args);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workspace;
    use crate::parser::Parser;

    #[test]
    fn system_context_view_records_include_and_auto_layout() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
    views {
        systemContext s "c" {
            include *
            autoLayout
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.views().len(), 1);
        assert_eq!(ws.views()[0].key, "c");
        assert_eq!(ws.views()[0].includes, vec!["*".to_string()]);
        assert!(ws.views()[0].auto_layout.is_some());
    }

    #[test]
    fn unquoted_exclude_expression_with_arrow_is_rejected() {
        let mut parser = Parser::<Workspace>::new();
        let err = parser
            .parse_str(
                r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
            exclude * -> element.tag==External
        }
    }
}"#,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0301);
    }

    #[test]
    fn quoted_exclude_expression_with_arrow_is_accepted() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
            exclude "* -> element.tag==External"
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.views()[0].excludes, vec!["* -> element.tag==External".to_string()]);
    }

    #[test]
    fn dynamic_view_records_relationship_steps_and_parallel_sequence() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
    views {
        dynamic s "d" {
            u -> s "Calls"
            {
                u -> s "Calls again"
            }
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.views()[0].dynamic_relationships.len(), 2);
        assert_eq!(ws.views()[0].dynamic_relationships[0].2, "Calls");
        assert_eq!(ws.views()[0].dynamic_relationships[1].2, "Calls again");
    }

    #[test]
    fn animation_block_and_inline_animation_step_both_append_steps() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
            animationStep u
            animation {
                animationStep s
            }
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.views()[0].animation_steps.len(), 2);
        assert_eq!(ws.views()[0].animation_steps[0], vec!["u".to_string()]);
        assert_eq!(ws.views()[0].animation_steps[1], vec!["s".to_string()]);
    }
}
