//! Model elements — the nodes of the architecture graph.
//!
//! Nine element-bearing context frames (Person, SoftwareSystem, Container,
//! Component, CustomElement, DeploymentNode, InfrastructureNode,
//! SoftwareSystemInstance, ContainerInstance) plus the organisational
//! Group construct all resolve to one of these records; the workspace
//! this module backs is treated as an opaque data layer given a concrete
//! shape, not something the productions reach into directly.

use rustc_hash::FxHashMap;

/// Arena handle for an [`ElementRecord`]. Stable for the lifetime of a [`crate::model::Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Person,
    SoftwareSystem,
    Container,
    Component,
    /// A user-declared `element` with a free-form type name, e.g. `element "Database" "Data Store"`.
    Custom { metadata: String },
    DeploymentNode,
    InfrastructureNode,
    SoftwareSystemInstance { instance_of: ElementId },
    ContainerInstance { instance_of: ElementId },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::SoftwareSystem => "SoftwareSystem",
            Self::Container => "Container",
            Self::Component => "Component",
            Self::Custom { .. } => "Element",
            Self::DeploymentNode => "DeploymentNode",
            Self::InfrastructureNode => "InfrastructureNode",
            Self::SoftwareSystemInstance { .. } => "SoftwareSystemInstance",
            Self::ContainerInstance { .. } => "ContainerInstance",
        }
    }

    /// Whether instances of this kind live inside a deployment environment
    /// rather than directly in the static model tree.
    pub fn is_deployment_kind(&self) -> bool {
        matches!(
            self,
            Self::DeploymentNode
                | Self::InfrastructureNode
                | Self::SoftwareSystemInstance { .. }
                | Self::ContainerInstance { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct ElementRecord {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: String,
    pub description: String,
    pub technology: String,
    pub tags: Vec<String>,
    pub url: Option<String>,
    /// Name of the `group { }` this element was declared inside, if any.
    pub group: Option<String>,
    /// Structural parent (SoftwareSystem for a Container, Container for a
    /// Component, enclosing DeploymentNode for a nested DeploymentNode or
    /// InfrastructureNode/instance).
    pub parent: Option<ElementId>,
    pub properties: FxHashMap<String, String>,
    pub perspectives: FxHashMap<String, String>,
    /// Deployment environment name this element was declared under, for
    /// DeploymentNode/InfrastructureNode/instances.
    pub environment: Option<String>,
    /// Was this element declared directly under `model { }` (not inside
    /// `enterprise { }`)? Used to mark it `external` once the model frame
    /// closes, if an enterprise was declared.
    pub declared_outside_enterprise: bool,
    pub external: bool,
    /// `healthCheck` entries attached to a `*Instance` element: `(name, url)`.
    pub health_checks: Vec<(String, String)>,
}

impl ElementRecord {
    pub fn new(id: ElementId, kind: ElementKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            description: String::new(),
            technology: String::new(),
            tags: Vec::new(),
            url: None,
            group: None,
            parent: None,
            properties: FxHashMap::default(),
            perspectives: FxHashMap::default(),
            environment: None,
            declared_outside_enterprise: false,
            external: false,
            health_checks: Vec::new(),
        }
    }

    pub fn is_person_or_software_system(&self) -> bool {
        matches!(self.kind, ElementKind::Person | ElementKind::SoftwareSystem)
    }
}
