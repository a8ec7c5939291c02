//! Deployment-view-side productions: `deploymentEnvironment`,
//! `deploymentGroup`, `deploymentNode`, `infrastructureNode`,
//! `softwareSystemInstance`, `containerInstance`, `healthCheck`.
//!
//! Deployment elements live in a parallel hierarchy keyed by environment
//! name rather than by a `SoftwareSystem`/`Container` ancestor, so their
//! hierarchical hook mirrors `model.rs`'s `register_and_push` but threads an
//! `environment` name through instead of an enterprise boundary flag.

use crate::base::Position;
use crate::context::{ContextFrame, EffectiveContext};
use crate::errors::{ErrorCode, ParseError};
use crate::model::{ElementId, ElementKind, WorkspaceBuilder};
use crate::tokenizer::Token;

use super::args_and_block;

fn wrong_context(position: Position, raw_line: &str, message: impl Into<String>) -> ParseError {
    ParseError::builder(position, raw_line, ErrorCode::E0302).message(message).build()
}

pub fn environment_open<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    if !matches!(parser.stack.top(), Some(ContextFrame::Model)) {
        return Err(wrong_context(position, raw_line, "'deploymentEnvironment' is only valid directly under 'model'"));
    }
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        ws.ensure_deployment_environment(&name);
    }
    parser.stack.push(ContextFrame::DeploymentEnvironment { name });
    Ok(())
}

pub fn deployment_group<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    let name = match parser.stack.top() {
        Some(ContextFrame::DeploymentEnvironment { name }) => name.clone(),
        _ => return Err(wrong_context(position, raw_line, "'deploymentGroup' is only valid directly under 'deploymentEnvironment'")),
    };
    let (args, _) = args_and_block(rest);
    let group = args.first().cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        ws.ensure_deployment_environment(&name).deployment_groups.push(group);
    }
    Ok(())
}

/// The environment name governing the current frame, walking up through
/// nested `DeploymentNode`s to the enclosing `DeploymentEnvironment`.
fn current_environment<B: WorkspaceBuilder + Default>(parser: &crate::parser::Parser<B>) -> Option<String> {
    match parser.stack.effective() {
        EffectiveContext::DeploymentEnvironment(name) => Some(name),
        EffectiveContext::DeploymentNode(id) => parser.workspace.as_ref().and_then(|ws| ws.element(id).environment.clone()),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn register_deployment_element<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    kind: ElementKind,
    name: String,
    description: Option<String>,
    technology: Option<String>,
    pending_identifier: Option<&str>,
    parent: Option<ElementId>,
    frame: impl FnOnce(ElementId) -> ContextFrame,
) -> Result<(), ParseError> {
    let environment = current_environment(parser)
        .ok_or_else(|| wrong_context(position, raw_line, "deployment elements are only valid inside 'deploymentEnvironment'"))?;
    let parent_key = parent.and_then(|p| parser.register.key_of_element(p)).map(str::to_string);
    let ws = parser
        .workspace
        .as_mut()
        .ok_or_else(|| wrong_context(position, raw_line, "no 'workspace' has been opened yet"))?;
    let id = ws.create_element(kind, &name);
    {
        let record = ws.element_mut(id);
        record.parent = parent;
        record.environment = Some(environment.clone());
        if let Some(description) = description {
            record.description = description;
        }
        if let Some(technology) = technology {
            record.technology = technology;
        }
    }
    // A `DeploymentNode` with no element parent is keyed under its
    // environment's name instead (spec §4.4/§9's "pseudo-element" rule);
    // nested deployment/infrastructure elements key off their parent.
    let environment_key = if parent_key.is_none() { Some(environment.to_lowercase()) } else { None };
    parser
        .register
        .register_element_scoped(pending_identifier, parent_key.as_deref(), environment_key.as_deref(), id)
        .map_err(|e| super::directives::register_error_to_parse_error(position, raw_line, e))?;
    parser.listener.on_model_element_parsed(id);
    parser.stack.push(frame(id));
    Ok(())
}

pub fn deployment_node<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::DeploymentNode(id) => Some(id),
        EffectiveContext::DeploymentEnvironment(_) => None,
        _ => return Err(wrong_context(position, raw_line, "'deploymentNode' is only valid inside 'deploymentEnvironment' or another 'deploymentNode'")),
    };
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned();
    let technology = args.get(2).cloned();
    register_deployment_element(
        parser,
        position,
        raw_line,
        ElementKind::DeploymentNode,
        name,
        description,
        technology,
        pending_identifier,
        parent,
        |id| ContextFrame::DeploymentNode { id },
    )
}

pub fn infrastructure_node<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::DeploymentNode(id) => id,
        _ => return Err(wrong_context(position, raw_line, "'infrastructureNode' is only valid inside 'deploymentNode'")),
    };
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let description = args.get(1).cloned();
    let technology = args.get(2).cloned();
    register_deployment_element(
        parser,
        position,
        raw_line,
        ElementKind::InfrastructureNode,
        name,
        description,
        technology,
        pending_identifier,
        Some(parent),
        |id| ContextFrame::InfrastructureNode { id },
    )
}

fn resolve_instance_of<B: WorkspaceBuilder + Default>(
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

pub fn software_system_instance<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::DeploymentNode(id) => id,
        _ => return Err(wrong_context(position, raw_line, "'softwareSystemInstance' is only valid inside 'deploymentNode'")),
    };
    let (args, _) = args_and_block(rest);
    let identifier = args.first().cloned().unwrap_or_default();
    let instance_of = resolve_instance_of(parser, position, raw_line, &identifier)?;
    let name = parser.workspace.as_ref().map(|ws| ws.element(instance_of).name.clone()).unwrap_or_default();
    register_deployment_element(
        parser,
        position,
        raw_line,
        ElementKind::SoftwareSystemInstance { instance_of },
        name,
        None,
        None,
        pending_identifier,
        Some(parent),
        |id| ContextFrame::SoftwareSystemInstance { id },
    )
}

pub fn container_instance<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
    pending_identifier: Option<&str>,
) -> Result<(), ParseError> {
    let parent = match parser.stack.effective() {
        EffectiveContext::DeploymentNode(id) => id,
        _ => return Err(wrong_context(position, raw_line, "'containerInstance' is only valid inside 'deploymentNode'")),
    };
    let (args, _) = args_and_block(rest);
    let identifier = args.first().cloned().unwrap_or_default();
    let instance_of = resolve_instance_of(parser, position, raw_line, &identifier)?;
    let name = parser.workspace.as_ref().map(|ws| ws.element(instance_of).name.clone()).unwrap_or_default();
    register_deployment_element(
        parser,
        position,
        raw_line,
        ElementKind::ContainerInstance { instance_of },
        name,
        None,
        None,
        pending_identifier,
        Some(parent),
        |id| ContextFrame::ContainerInstance { id },
    )
}

/// `healthCheck <name> <url> [interval] [timeout]` against the current
/// `*Instance` element.
pub fn health_check<B: WorkspaceBuilder + Default>(
    parser: &mut crate::parser::Parser<B>,
    position: Position,
    raw_line: &str,
    rest: &[Token],
) -> Result<(), ParseError> {
    let id = match parser.stack.top() {
        Some(ContextFrame::SoftwareSystemInstance { id }) | Some(ContextFrame::ContainerInstance { id }) => *id,
        _ => return Err(wrong_context(position, raw_line, "'healthCheck' is only valid inside a 'softwareSystemInstance' or 'containerInstance'")),
    };
    let (args, _) = args_and_block(rest);
    let name = args.first().cloned().unwrap_or_default();
    let url = args.get(1).cloned().unwrap_or_default();
    if let Some(ws) = &mut parser.workspace {
        ws.element_mut(id).health_checks.push((name, url));
    }
    Ok(())
}
