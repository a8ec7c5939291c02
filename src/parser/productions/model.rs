//! `model`, `enterprise`, `group`, and the element-creating productions
//! (`person`, `softwareSystem`, `container`, `component`, `element`), plus
//! the shared `tags`/`url`/`description`/`technology`/`properties`/
//! `perspectives` model-item mutators.

use crate::base::Position;
use crate::context::{ContextFrame, EffectiveContext, GroupParent, ModelItemRef};
use crate::errors::{ErrorCode, ParseError};
use crate::model::{ElementKind, WorkspaceBuilder};
use crate::parser::dispatcher::require_model_item;
use crate::parser::Parser;

use super::args_and_block;

fn wrong_context(position: Position, raw_line: &str, message: impl Into<String>) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0302).message(message).build()
}

pub fn model_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Workspace)) {
        return Err(wrong_context(position, raw_line, "'model' is only valid directly under 'workspace'"));
    }
    parser.stack.push(ContextFrame::Model);
    Ok(())
}

pub fn enterprise_open<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Model)) {
        return Err(wrong_context(position, raw_line, "'enterprise' is only valid directly under 'model'"));
    }
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        ws.set_enterprise(&name);
    }
    parser.stack.push(ContextFrame::Enterprise);
    Ok(())
}

pub fn group_open<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::Model => GroupParent::Model,
        EffectiveContext::Enterprise => GroupParent::Enterprise,
        EffectiveContext::SoftwareSystem(id) => GroupParent::SoftwareSystem(id),
        EffectiveContext::Container(id) => GroupParent::Container(id),
        _ => return Err(wrong_context(position, raw_line, "'group' is not valid here")),
    };
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    parser.stack.push(ContextFrame::Group { parent, name });
    Ok(())
}

/// Whether an element declared in the current (pre-push) context sits
/// outside an `enterprise { }` boundary, for the Model-close end hook.
fn declared_outside_enterprise(parser: &Parser<impl WorkspaceBuilder + Default>) -> bool {
    !matches!(parser.stack.effective(), EffectiveContext::Enterprise)
}

fn current_group_name(parser: &Parser<impl WorkspaceBuilder + Default>) -> Option<String> {
    match parser.stack.top() {
        Some(ContextFrame::Group { name, .. }) => Some(name.clone()),
        _ => None,
    }
}

fn register_and_push<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    kind: ElementKind,
    name: String,
    description: Option<String>,
    technology: Option<String>,
    pending_identifier: Option<&str>,
    parent: Option<crate::model::ElementId>,
    outside_enterprise: bool,
    frame: impl FnOnce(crate::model::ElementId) -> ContextFrame,
) -> Result<(), ParseError> {
    let group = current_group_name(parser);
    let parent_key = parent.and_then(|p| parser.register.key_of_element(p)).map(str::to_string);

    let ws = parser
        .workspace
        .as_mut()
        .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
    let id = ws.create_element(kind, &name);
    {
        let record = ws.element_mut(id);
        record.parent = parent;
        record.declared_outside_enterprise = outside_enterprise;
        record.group = group;
        if let Some(description) = description {
            record.description = description;
        }
        if let Some(technology) = technology {
            record.technology = technology;
        }
    }

    parser
        .register
        .register_element_scoped(pending_identifier, parent_key.as_deref(), None, id)
        .map_err(|e| super::directives::register_error_to_parse_error(position, raw_line, e))?;

    parser.listener.on_model_element_parsed(id);
    parser.stack.push(frame(id));
    Ok(())
}

pub fn person<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    if !matches!(parser.stack.effective(), EffectiveContext::Model | EffectiveContext::Enterprise) {
        return Err(wrong_context(position, raw_line, "'person' is only valid inside 'model' or 'enterprise'"));
    }
    let outside = declared_outside_enterprise(parser);
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned();
    register_and_push(
        parser,
        position,
        raw_line,
        ElementKind::Person,
        name,
        description,
        None,
        pending_identifier,
        None,
        outside,
        |id| ContextFrame::Person { id },
    )
}

pub fn software_system<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    if !matches!(parser.stack.effective(), EffectiveContext::Model | EffectiveContext::Enterprise) {
        return Err(wrong_context(position, raw_line, "'softwareSystem' is only valid inside 'model' or 'enterprise'"));
    }
    let outside = declared_outside_enterprise(parser);
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned();
    register_and_push(
        parser,
        position,
        raw_line,
        ElementKind::SoftwareSystem,
        name,
        description,
        None,
        pending_identifier,
        None,
        outside,
        |id| ContextFrame::SoftwareSystem { id },
    )
}

pub fn container<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::SoftwareSystem(id) => id,
        _ => return Err(wrong_context(position, raw_line, "'container' is only valid inside 'softwareSystem'")),
    };
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned();
    let technology = args.get(2).cloned();
    register_and_push(
        parser,
        position,
        raw_line,
        ElementKind::Container,
        name,
        description,
        technology,
        pending_identifier,
        Some(parent),
        true,
        |id| ContextFrame::Container { id },
    )
}

pub fn component<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::Container(id) => id,
        _ => return Err(wrong_context(position, raw_line, "'component' is only valid inside 'container'")),
    };
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned();
    let technology = args.get(2).cloned();
    register_and_push(
        parser,
        position,
        raw_line,
        ElementKind::Component,
        name,
        description,
        technology,
        pending_identifier,
        Some(parent),
        true,
        |id| ContextFrame::Component { id },
    )
}

pub fn custom_element<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[crate::tokenizer::Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let metadata = args.get(1).cloned().unwrap_or_default();
    register_and_push(
        parser,
        position,
        raw_line,
        ElementKind::Custom { metadata },
        name,
        None,
        None,
        pending_identifier,
        None,
        true,
        |id| ContextFrame::CustomElement { id },
    )
}

/// `tags`, `url`, `description`, `technology` against the nearest
/// model-item frame.
pub fn mutate_current<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    keyword: &str,
    rest: &[crate::tokenizer::Token],
) -> Result<(), ParseError> {
    let (args, _) = args_and_block(rest);
    let value = args.first().cloned().unwrap_or_default();
    let target = require_model_item(&parser.stack, position, raw_line)?;
    let ws = parser
        .workspace
        .as_mut()
        .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;

    match target {
        ModelItemRef::Element(id) => {
            let record = ws.element_mut(id);
            match keyword {
                "tags" => record.tags.extend(args.iter().flat_map(|a| a.split(',')).map(str::to_string)),
                "url" => record.url = Some(value),
                "description" => record.description = value,
                "technology" => record.technology = value,
                _ => {}
            }
        }
        ModelItemRef::Relationship(id) => {
            let record = ws.relationship_mut(id);
            match keyword {
                "tags" => record.tags.extend(args.iter().flat_map(|a| a.split(',')).map(str::to_string)),
                "description" => record.description = value,
                "technology" => record.technology = value,
                "url" => {}
                _ => {}
            }
        }
    }
    Ok(())
}

pub fn properties_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    let target = require_model_item(&parser.stack, position, raw_line)?;
    parser.stack.push(ContextFrame::ModelItemProperties { target });
    Ok(())
}

pub fn perspectives_open<B: WorkspaceBuilder + Default>(parser: &mut Parser<B>, position: Position, raw_line: &str) -> Result<(), ParseError> {
    let target = require_model_item(&parser.stack, position, raw_line)?;
    parser.stack.push(ContextFrame::ModelItemPerspectives { target });
    Ok(())
}

fn name_value_pair(tokens: &[crate::tokenizer::Token]) -> (String, String) {
    let texts: Vec<&str> = tokens.iter().filter_map(crate::tokenizer::Token::text).collect();
    (texts.first().copied().unwrap_or_default().to_string(), texts.get(1..).unwrap_or(&[]).join(" "))
}

pub fn property_pair<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    target: ModelItemRef,
    tokens: &[crate::tokenizer::Token],
) -> Result<(), ParseError> {
    let (name, value) = name_value_pair(tokens);
    let ws = parser
        .workspace
        .as_mut()
        .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
    match target {
        ModelItemRef::Element(id) => {
            ws.element_mut(id).properties.insert(name, value);
        }
        ModelItemRef::Relationship(id) => {
            ws.relationship_mut(id).properties.insert(name, value);
        }
    }
    Ok(())
}

pub fn perspective_pair<B: WorkspaceBuilder + Default>(
    parser: &mut Parser<B>,
    position: Position,
    raw_line: &str,
    target: ModelItemRef,
    tokens: &[crate::tokenizer::Token],
) -> Result<(), ParseError> {
    let (name, value) = name_value_pair(tokens);
    let ws = parser
        .workspace
        .as_mut()
        .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
    match target {
        ModelItemRef::Element(id) => {
            ws.element_mut(id).perspectives.insert(name, value);
        }
        ModelItemRef::Relationship(id) => {
            ws.relationship_mut(id).perspectives.insert(name, value);
        }
    }
    Ok(())
}
