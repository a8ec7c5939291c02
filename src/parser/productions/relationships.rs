//! Explicit (`src -> dst ...`) and implicit (`-> dst ...`) relationship
//! productions, and `!ref` resolution by identifier or canonical-name
//! expression.
//!
//! A relationship line written inside a `dynamic` view's body is not a
//! model relationship at all; it is recorded on the view itself as an
//! ordered step, so this module checks for that context before touching
//! the identifier register.

use crate::base::Position;
use crate::context::{ContextFrame, EffectiveContext, ModelItemRef, ViewFrameKind};
use crate::errors::{ErrorCode, ParseError};
use crate::model::{ElementId, ElementKind, WorkspaceBuilder};
use crate::tokenizer::Token;

use super::args_and_block;

fn wrong_context(position: Position, raw_line: &str, message: impl Into<String>) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0302).message(message).build()
}

fn reference_not_found(position: Position, raw_line: &str, identifier: &str) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0401)
        .message(format!("'{identifier}' does not refer to a known element"))
        .build()
}

fn resolve_element<B: WorkspaceBuilder + Default>(
    parser: &crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    identifier: &str,
) -> Result<ElementId, ParseError> {
    parser
        .register
        .get_element(identifier)
        .ok_or_else(|| reference_not_found(position, raw_line, identifier))
}

/// The view a bare `src -> dst ...` line belongs to, if the current frame
/// is a dynamic view or one of its parallel-sequence sub-blocks.
fn dynamic_view_index<B: WorkspaceBuilder + Default>(parser: &crate::parser::Parser<B>) -> Option<usize> {
    match parser.stack.top() {
        Some(ContextFrame::View { view_index, kind: ViewFrameKind::Dynamic }) => Some(*view_index),
        Some(ContextFrame::DynamicViewParallelSequence { view_index }) => Some(*view_index),
        _ => None,
    }
}

fn record_dynamic_step<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    view_index: usize,
    source: &str,
    rest: &[Token],
) {
    let (args, _) = args_and_block(rest);
    let destination = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        ws.view_mut(view_index)
            .dynamic_relationships
            .push((source.to_string(), destination, description));
    }
}

fn create_relationship<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    source: ElementId,
    destination: ElementId,
    args: &[String],
    pending_identifier: Option<&str>,
    opens_block: bool,
) -> Result<(), ParseError> {
    let id = {
        let ws = parser
            .workspace
            .as_mut()
            .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
        let id = ws.create_relationship(source, destination);
        if let Some(description) = args.first() {
            ws.relationship_mut(id).description = description.clone();
        }
        if let Some(technology) = args.get(1) {
            ws.relationship_mut(id).technology = technology.clone();
        }
        if let Some(tags) = args.get(2) {
            ws.relationship_mut(id).tags.extend(tags.split(',').map(str::to_string));
        }
        id
    };
    parser
        .register
        .register_relationship(pending_identifier, id)
        .map_err(|e| super::directives::register_error_to_parse_error(position, raw_line, e))?;
    parser.listener.on_relationship_parsed(id);
    if opens_block {
        parser.stack.push(ContextFrame::Relationship { id });
    }
    Ok(())
}

/// `src -> dst [desc [tech [tags]]]`. `tokens` is the whole
/// line: `tokens[0]` is the source reference, `tokens[1]` the `->`.
pub fn explicit<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    tokens: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let source_text = tokens[0]
        .text()
        .ok_or_else(|| wrong_context(position, raw_line, "relationship source must be an identifier"))?
        .to_string();

    if let Some(view_index) = dynamic_view_index(parser) {
        record_dynamic_step(parser, view_index, &source_text, &tokens[2..]);
        return Ok(());
    }

    if !matches!(parser.stack.effective(), EffectiveContext::Model | EffectiveContext::Enterprise)
        && parser.stack.nearest_model_item().is_none()
    {
        return Err(wrong_context(
            position,
            raw_line,
            "a relationship is only valid inside 'model', 'enterprise', or a model item",
        ));
    }

    let source = resolve_element(parser, position, raw_line, &source_text)?;
    let (args, opens_block) = args_and_block(&tokens[2..]);
    let destination_text = args
        .first()
        .cloned()
        .ok_or_else(|| wrong_context(position, raw_line, "relationship requires a destination"))?;
    let destination = resolve_element(parser, position, raw_line, &destination_text)?;
    create_relationship(parser, position, raw_line, source, destination, &args[1..], pending_identifier, opens_block)
}

/// `-> dst [desc [tech [tags]]]`: the source is the nearest enclosing
/// model element.
pub fn implicit<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    if let Some(view_index) = dynamic_view_index(parser) {
        // An implicit arrow has no meaning without a "current element" to
        // anchor on; dynamic views have no such anchor, so this is the one
        // place the "any ModelItem frame" grant doesn't extend.
        let (args, _) = args_and_block(rest);
        let destination = args.first().cloned().unwrap_or_default();
        let description = args.get(1).cloned().unwrap_or_default();
        if let Some(ws) = &mut parser.workspace {
            ws.view_mut(view_index)
                .dynamic_relationships
                .push((String::new(), destination, description));
        }
        return Ok(());
    }

    let source = match parser.stack.nearest_model_item() {
        Some(ModelItemRef::Element(id)) => id,
        _ => {
            return Err(wrong_context(
                position,
                raw_line,
                "an implicit relationship requires an enclosing model element",
            ))
        }
    };
    let (args, opens_block) = args_and_block(rest);
    let destination_text = args
        .first()
        .cloned()
        .ok_or_else(|| wrong_context(position, raw_line, "relationship requires a destination"))?;
    let destination = resolve_element(parser, position, raw_line, &destination_text)?;
    create_relationship(parser, position, raw_line, source, destination, &args[1..], pending_identifier, opens_block)
}

/// The context frame a referenced element should be re-entered as, so
/// subsequent lines inside a `!ref ... { }` block mutate it the same way
/// they would inside the element's own opening production.
fn frame_for_element<B: WorkspaceBuilder + Default>(parser: &crate::parser::Parser<B>, id: ElementId) -> ContextFrame {
    match parser.workspace.as_ref().map(|ws| &ws.element(id).kind) {
        Some(ElementKind::Person) => ContextFrame::Person { id },
        Some(ElementKind::SoftwareSystem) => ContextFrame::SoftwareSystem { id },
        Some(ElementKind::Container) => ContextFrame::Container { id },
        Some(ElementKind::Component) => ContextFrame::Component { id },
        Some(ElementKind::DeploymentNode) => ContextFrame::DeploymentNode { id },
        Some(ElementKind::InfrastructureNode) => ContextFrame::InfrastructureNode { id },
        Some(ElementKind::SoftwareSystemInstance { .. }) => ContextFrame::SoftwareSystemInstance { id },
        Some(ElementKind::ContainerInstance { .. }) => ContextFrame::ContainerInstance { id },
        Some(ElementKind::Custom { .. }) | None => ContextFrame::CustomElement { id },
    }
}

/// Resolves a `!ref` argument, either a plain identifier or a canonical-name
/// expression `<ElementType>://<name>[/<child>...]`.
fn resolve_reference_expr<B: WorkspaceBuilder + Default>(
    parser: &crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    reference: &str,
) -> Result<ElementId, ParseError> {
    if let Some(scheme_end) = reference.find("://") {
        let type_name = &reference[..scheme_end];
        let path_str = &reference[scheme_end + 3..];
        let path: Vec<String> = path_str.split('/').map(str::to_string).collect();
        let ws = parser
            .workspace
            .as_ref()
            .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
        return ws
            .find_by_canonical_name(type_name, &path)
            .ok_or_else(|| reference_not_found(position, raw_line, reference));
    }
    resolve_element(parser, position, raw_line, reference)
}

/// `!ref <identifier-or-canonical-name> [{]`. Resolves the
/// target, optionally gives it a fresh identifier (`id = !ref ...`), and
/// re-enters its context frame when the line opens a block.
pub fn resolve_ref<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Model)) && parser.stack.nearest_model_item().is_none() {
        return Err(wrong_context(position, raw_line, "'!ref' is only valid at the top of 'model' or inside a model item"));
    }
    let (args, opens_block) = args_and_block(rest);
    let reference = args
        .first()
        .cloned()
        .ok_or_else(|| wrong_context(position, raw_line, "'!ref' requires a target"))?;
    let id = resolve_reference_expr(parser, position, raw_line, &reference)?;

    if let Some(identifier) = pending_identifier {
        parser
            .register
            .register_element(Some(identifier), id)
            .map_err(|e| super::directives::register_error_to_parse_error(position, raw_line, e))?;
    }

    if opens_block {
        let frame = frame_for_element(parser, id);
        parser.stack.push(frame);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextFrame;
    use crate::model::{ElementKind, Workspace};
    use crate::parser::Parser;

    #[test]
    fn explicit_relationship_resolves_identifiers_and_applies_description() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses" "HTTPS"
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.model.relationships.len(), 1);
        assert_eq!(ws.model.relationships[0].description, "Uses");
        assert_eq!(ws.model.relationships[0].technology, "HTTPS");
    }

    #[test]
    fn implicit_relationship_uses_enclosing_element_as_source() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S" {
            -> u "Notifies"
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.model.relationships.len(), 1);
        assert_eq!(ws.model.relationships[0].description, "Notifies");
    }

    #[test]
    fn ref_by_canonical_name_adds_container_to_existing_system() {
        let mut ws = Workspace::new();
        ws.create_element(ElementKind::SoftwareSystem, "Software System 1");
        let mut parser = Parser::extending(ws);
        parser
            .parse_str(
                r#"workspace {
    model {
        !ref "SoftwareSystem://Software System 1" {
            container "Web"
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.model.elements.len(), 2);
        assert_eq!(ws.model.elements[1].name, "Web");
        assert!(matches!(ws.model.elements[1].kind, ElementKind::Container));
    }

    #[test]
    fn ref_unknown_target_is_reference_not_found() {
        let mut parser = Parser::<Workspace>::new();
        let err = parser
            .parse_str(
                r#"workspace {
    model {
        !ref "SoftwareSystem://Nope"
    }
}"#,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0401);
    }

    #[test]
    fn relationship_block_applies_tags_to_the_new_relationship() {
        let mut parser = Parser::<Workspace>::new();
        parser
            .parse_str(
                r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        rel = u -> s "Uses" {
            tags "important"
        }
    }
}"#,
            )
            .unwrap();
        let ws = parser.workspace().unwrap();
        assert_eq!(ws.model.relationships[0].tags, vec!["important".to_string()]);
    }
}
