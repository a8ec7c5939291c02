//! The context stack: a tagged variant per nesting kind, dispatched by
//! pattern match rather than a polymorphic frame hierarchy, so the `end`
//! hook collapses to a single match expression.
//!
//! A `Vec` of tagged frames, pushed on block entry and popped on close,
//! consulted by the dispatcher to decide which productions are legal on
//! the current line.

use crate::model::{ElementId, ElementStyle, RelationshipId, RelationshipStyle};

/// What a `ModelItemProperties`/`ModelItemPerspectives`/implicit-relationship
/// frame is actually attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelItemRef {
    Element(ElementId),
    Relationship(RelationshipId),
}

/// The frame pushed for `group { }`; which kind of frame it was opened in
/// determines where the group's member elements ultimately attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupParent {
    Model,
    Enterprise,
    SoftwareSystem(ElementId),
    Container(ElementId),
}

/// A frame partially accumulated while its block is open; committed to the
/// workspace only when the closing `}` is seen, so `properties`/appends can
/// be applied line-by-line without touching the workspace on every line.
#[derive(Debug, Clone, Default)]
pub struct PendingElementStyle(pub ElementStyle);
#[derive(Debug, Clone, Default)]
pub struct PendingRelationshipStyle(pub RelationshipStyle);

#[derive(Debug, Clone)]
pub enum ContextFrame {
    Workspace,
    Model,
    Enterprise,
    Group { parent: GroupParent, name: String },
    Person { id: ElementId },
    SoftwareSystem { id: ElementId },
    Container { id: ElementId },
    Component { id: ElementId },
    CustomElement { id: ElementId },
    DeploymentEnvironment { name: String },
    DeploymentNode { id: ElementId },
    InfrastructureNode { id: ElementId },
    SoftwareSystemInstance { id: ElementId },
    ContainerInstance { id: ElementId },
    Relationship { id: RelationshipId },
    ModelItemProperties { target: ModelItemRef },
    ModelItemPerspectives { target: ModelItemRef },
    Views,
    View { view_index: usize, kind: ViewFrameKind },
    DynamicViewParallelSequence { view_index: usize },
    StaticViewAnimation { view_index: usize },
    Styles,
    ElementStyle(PendingElementStyle),
    RelationshipStyle(PendingRelationshipStyle),
    Branding,
    Terminology,
    Configuration,
    Users,
    Plugin { fqcn: String, params: Vec<(String, String)> },
    InlineScript { language: Option<String>, body: String },
    Comment,
    Included,
}

/// Distinguishes the seven view-opener productions so the dispatcher can
/// gate `autoLayout`/`animation`/dynamic-relationship productions, which
/// aren't legal in every view kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFrameKind {
    Custom,
    SystemLandscape,
    SystemContext,
    Container,
    Component,
    Dynamic,
    Deployment,
    Filtered,
}

impl ContextFrame {
    /// The `ModelItemRef` this frame edits, for frames that represent a
    /// single model element or relationship currently being described.
    pub fn model_item(&self) -> Option<ModelItemRef> {
        match self {
            Self::Person { id }
            | Self::SoftwareSystem { id }
            | Self::Container { id }
            | Self::Component { id }
            | Self::CustomElement { id }
            | Self::DeploymentNode { id }
            | Self::InfrastructureNode { id }
            | Self::SoftwareSystemInstance { id }
            | Self::ContainerInstance { id } => Some(ModelItemRef::Element(*id)),
            Self::Relationship { id } => Some(ModelItemRef::Relationship(*id)),
            _ => None,
        }
    }

    pub fn element_id(&self) -> Option<ElementId> {
        match self.model_item() {
            Some(ModelItemRef::Element(id)) => Some(id),
            _ => None,
        }
    }

    /// A short, human-readable name for this frame kind, used in error
    /// messages and [`crate::listener::Listener::on_context_end`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Workspace => "Workspace",
            Self::Model => "Model",
            Self::Enterprise => "Enterprise",
            Self::Group { .. } => "Group",
            Self::Person { .. } => "Person",
            Self::SoftwareSystem { .. } => "SoftwareSystem",
            Self::Container { .. } => "Container",
            Self::Component { .. } => "Component",
            Self::CustomElement { .. } => "CustomElement",
            Self::DeploymentEnvironment { .. } => "DeploymentEnvironment",
            Self::DeploymentNode { .. } => "DeploymentNode",
            Self::InfrastructureNode { .. } => "InfrastructureNode",
            Self::SoftwareSystemInstance { .. } => "SoftwareSystemInstance",
            Self::ContainerInstance { .. } => "ContainerInstance",
            Self::Relationship { .. } => "Relationship",
            Self::ModelItemProperties { .. } => "ModelItemProperties",
            Self::ModelItemPerspectives { .. } => "ModelItemPerspectives",
            Self::Views => "Views",
            Self::View { .. } => "View",
            Self::DynamicViewParallelSequence { .. } => "DynamicViewParallelSequence",
            Self::StaticViewAnimation { .. } => "StaticViewAnimation",
            Self::Styles => "Styles",
            Self::ElementStyle { .. } => "ElementStyle",
            Self::RelationshipStyle { .. } => "RelationshipStyle",
            Self::Branding => "Branding",
            Self::Terminology => "Terminology",
            Self::Configuration => "Configuration",
            Self::Users => "Users",
            Self::Plugin { .. } => "Plugin",
            Self::InlineScript { .. } => "InlineScript",
            Self::Comment => "Comment",
            Self::Included => "Included",
        }
    }
}

/// The parser's context stack: a `Vec<ContextFrame>` plus the lookups the
/// dispatcher needs against its top frame, without exposing mutable access
/// to interior frames at large (callers push/pop/peek the top only).
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ContextFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ContextFrame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&ContextFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut ContextFrame> {
        self.frames.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Walks up from the top looking for the nearest frame that edits a
    /// model item.
    pub fn nearest_model_item(&self) -> Option<ModelItemRef> {
        self.frames.iter().rev().find_map(ContextFrame::model_item)
    }

    /// The view a `title`/`include`/`exclude`/`autoLayout`/`animationStep`
    /// line currently applies to: the nearest enclosing `View`,
    /// `DynamicViewParallelSequence`, or `StaticViewAnimation` frame, all
    /// of which carry the owning view's index.
    pub fn nearest_view_index(&self) -> Option<usize> {
        self.frames.iter().rev().find_map(|frame| match frame {
            ContextFrame::View { view_index, .. }
            | ContextFrame::DynamicViewParallelSequence { view_index }
            | ContextFrame::StaticViewAnimation { view_index } => Some(*view_index),
            _ => None,
        })
    }

    /// The effective parent context for productions that are gated by the
    /// top-of-stack frame. `Group` is treated as transparent: a `group { }`
    /// opened inside `SoftwareSystem` still allows `container` beneath it,
    /// because `group`'s allowed parents are the same set
    /// `container`/`person`/`softwareSystem` themselves key off of, and a
    /// group is a visual sub-grouping rather than a new structural layer.
    pub fn effective(&self) -> EffectiveContext {
        match self.frames.last() {
            Some(ContextFrame::Group { parent, .. }) => match parent {
                GroupParent::Model => EffectiveContext::Model,
                GroupParent::Enterprise => EffectiveContext::Enterprise,
                GroupParent::SoftwareSystem(id) => EffectiveContext::SoftwareSystem(*id),
                GroupParent::Container(id) => EffectiveContext::Container(*id),
            },
            Some(ContextFrame::Model) => EffectiveContext::Model,
            Some(ContextFrame::Enterprise) => EffectiveContext::Enterprise,
            Some(ContextFrame::SoftwareSystem { id }) => EffectiveContext::SoftwareSystem(*id),
            Some(ContextFrame::Container { id }) => EffectiveContext::Container(*id),
            Some(ContextFrame::Workspace) => EffectiveContext::Workspace,
            Some(ContextFrame::Views) => EffectiveContext::Views,
            Some(ContextFrame::Styles) => EffectiveContext::Styles,
            Some(ContextFrame::DeploymentEnvironment { name }) => {
                EffectiveContext::DeploymentEnvironment(name.clone())
            }
            Some(ContextFrame::DeploymentNode { id }) => EffectiveContext::DeploymentNode(*id),
            _ => EffectiveContext::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveContext {
    Workspace,
    Model,
    Enterprise,
    SoftwareSystem(ElementId),
    Container(ElementId),
    DeploymentEnvironment(String),
    DeploymentNode(ElementId),
    Views,
    Styles,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementId;

    #[test]
    fn push_pop_round_trips() {
        let mut stack = ContextStack::new();
        stack.push(ContextFrame::Workspace);
        stack.push(ContextFrame::Model);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().unwrap().name(), "Model");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn nearest_model_item_skips_property_sub_frames() {
        let mut stack = ContextStack::new();
        let id = ElementId(0);
        stack.push(ContextFrame::SoftwareSystem { id });
        stack.push(ContextFrame::ModelItemProperties { target: ModelItemRef::Element(id) });
        assert_eq!(stack.nearest_model_item(), Some(ModelItemRef::Element(id)));
    }

    #[test]
    fn empty_stack_has_no_top() {
        let stack = ContextStack::new();
        assert!(stack.top().is_none());
    }
}
