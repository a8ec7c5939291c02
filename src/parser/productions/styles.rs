//! `styles`, `element <tagSelector>`, `relationship <tagSelector>`,
//! `branding`, `theme`/`themes`, and `terminology` productions.

use crate::base::Position;
use crate::context::{ContextFrame, PendingElementStyle, PendingRelationshipStyle};
use crate::errors::{ErrorCode, ParseError};
use crate::model::{ElementStyle, RelationshipStyle, WorkspaceBuilder};
use crate::tokenizer::Token;

use super::args_and_block;

fn wrong_context(position: Position, raw_line: &str, message: impl Into<String>) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0302).message(message).build()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn styles_open<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Views)) {
        return Err(wrong_context(position, raw_line, "'styles' is only valid directly under 'views'"));
    }
    parser.stack.push(ContextFrame::Styles);
    Ok(())
}

pub fn element_style<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Styles)) {
        return Err(wrong_context(position, raw_line, "'element' style selector is only valid inside 'styles'"));
    }
    let (args, opens_block) = args_and_block(rest);
    if !opens_block {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
            .message("an 'element' style selector requires a block")
            .build());
    }
    let tag_selector = args.first().cloned().unwrap_or_default();
    parser.stack.push(ContextFrame::ElementStyle(PendingElementStyle(ElementStyle {
        tag_selector,
        ..Default::default()
    })));
    Ok(())
}

pub fn relationship_style<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Styles)) {
        return Err(wrong_context(position, raw_line, "'relationship' style selector is only valid inside 'styles'"));
    }
    let (args, opens_block) = args_and_block(rest);
    if !opens_block {
        return Err(ParseError::builder(position, raw_line, ErrorCode::E0301)
            .message("a 'relationship' style selector requires a block")
            .build());
    }
    let tag_selector = args.first().cloned().unwrap_or_default();
    parser.stack.push(ContextFrame::RelationshipStyle(PendingRelationshipStyle(RelationshipStyle {
        tag_selector,
        ..Default::default()
    })));
    Ok(())
}

/// Sub-keys inside an `element { }` style block: `background`, `color`/
/// `colour`, `stroke`, `shape`, `border`, `opacity`, `width`, `height`,
/// `fontSize`, `metadata`, `description`, `icon`.
pub fn element_style_property<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    keyword: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    let value = args.first().cloned().unwrap_or_default();
    if matches!(keyword, "background" | "color" | "colour" | "stroke") {
        parser.listener.on_color_parsed(keyword, &value);
    }
    let Some(ContextFrame::ElementStyle(PendingElementStyle(style))) = parser.stack.top_mut() else {
        return Err(wrong_context(position, raw_line, "element style property used outside an 'element' style block"));
    };
    match keyword {
        "background" => style.background = Some(value),
        "color" | "colour" => style.color = Some(value),
        "stroke" => style.stroke = Some(value),
        "shape" => style.shape = Some(value),
        "border" => style.border = Some(value),
        "opacity" => style.opacity = value.parse().ok(),
        "width" => style.width = value.parse().ok(),
        "height" => style.height = value.parse().ok(),
        "fontsize" => style.font_size = value.parse().ok(),
        "metadata" => style.metadata = parse_bool(&value),
        "description" => style.description_visible = parse_bool(&value),
        "icon" => style.icon = Some(value),
        _ => {}
    }
    Ok(())
}

/// Sub-keys inside a `relationship { }` style block: `thickness`,
/// `color`/`colour`, `dashed`, `opacity`, `width`, `fontSize`, `position`,
/// `routing`.
pub fn relationship_style_property<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    keyword: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    let value = args.first().cloned().unwrap_or_default();
    if matches!(keyword, "color" | "colour") {
        parser.listener.on_color_parsed(keyword, &value);
    }
    let Some(ContextFrame::RelationshipStyle(PendingRelationshipStyle(style))) = parser.stack.top_mut() else {
        return Err(wrong_context(position, raw_line, "relationship style property used outside a 'relationship' style block"));
    };
    match keyword {
        "thickness" => style.thickness = value.parse().ok(),
        "color" | "colour" => style.color = Some(value),
        "dashed" => style.dashed = parse_bool(&value),
        "opacity" => style.opacity = value.parse().ok(),
        "width" => style.width = value.parse().ok(),
        "fontsize" => style.font_size = value.parse().ok(),
        "position" => style.position = value.parse().ok(),
        "routing" => style.routing = Some(value),
        _ => {}
    }
    Ok(())
}

pub fn branding_open<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Views)) {
        return Err(wrong_context(position, raw_line, "'branding' is only valid directly under 'views'"));
    }
    parser.stack.push(ContextFrame::Branding);
    Ok(())
}

/// `logo`/`font` sub-keys inside a `branding { }` block.
pub fn branding_property<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    keyword: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Branding)) {
        return Err(wrong_context(position, raw_line, format!("'{keyword}' is only valid inside 'branding'")));
    }
    let (args, _) = args_and_block(rest);
    let value = args.first().cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        match keyword {
            "logo" => ws.branding_mut().logo = Some(value),
            "font" => ws.branding_mut().font = Some(value),
            _ => {}
        }
    }
    Ok(())
}

pub fn theme<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, _position: Position, _raw_line: &str, rest: &[Token]) {
    let (args, _) = args_and_block(rest);
    if let Some(ws) = &mut parser.workspace {
        for path in args {
            ws.add_theme(&path);
        }
    }
}

pub fn terminology_open<B: WorkspaceBuilder + Default>(parser: &mut crate::parser::Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Views)) {
        return Err(wrong_context(position, raw_line, "'terminology' is only valid directly under 'views'"));
    }
    parser.stack.push(ContextFrame::Terminology);
    Ok(())
}

/// Per-entity overrides inside a `terminology { }` block, e.g.
/// `person "Actor"` or `softwareSystem "Service"`.
pub fn terminology_property<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    keyword: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Terminology)) {
        return Err(wrong_context(position, raw_line, format!("'{keyword}' is only valid inside 'terminology'")));
    }
    let (args, _) = args_and_block(rest);
    let value = args.first().cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        ws.terminology_mut().overrides.insert(keyword.to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workspace;
    use crate::parser::Parser;

    #[test]
    fn element_style_block_sets_background_and_shape() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    views {
        styles {
            element "Person" {
                background "#08427b"
                shape Person
            }
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.element_styles.len(), 1);
        assert_eq!(ws.element_styles[0].background.as_deref(), Some("#08427b"));
        assert_eq!(ws.element_styles[0].shape.as_deref(), Some("Person"));
    }

    #[test]
    fn relationship_style_block_sets_dashed_and_thickness() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    views {
        styles {
            relationship "Async" {
                dashed true
                thickness 2
            }
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.relationship_styles.len(), 1);
        assert_eq!(ws.relationship_styles[0].dashed, Some(true));
        assert_eq!(ws.relationship_styles[0].thickness, Some(2));
    }

    #[test]
    fn branding_block_sets_logo_and_font() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    views {
        branding {
            logo "logo.png"
            font "Open Sans"
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.branding.logo.as_deref(), Some("logo.png"));
        assert_eq!(ws.branding.font.as_deref(), Some("Open Sans"));
    }

    #[test]
    fn terminology_block_records_overrides() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    views {
        terminology {
            person "Actor"
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.terminology.overrides.get("person").map(String::as_str), Some("Actor"));
    }

    #[test]
    fn theme_directive_is_accumulated() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    views {
        theme https://example.com/theme.json
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.themes, vec!["https://example.com/theme.json".to_string()]);
    }
}
