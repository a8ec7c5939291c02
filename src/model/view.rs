//! Views and their presentation rules.

use super::element::ElementId;

#[derive(Debug, Clone)]
pub enum ViewKind {
    SystemLandscape,
    SystemContext { software_system: ElementId },
    Container { software_system: ElementId },
    Component { container: ElementId },
    Dynamic { scope: Option<ElementId> },
    Deployment { software_system: Option<ElementId>, environment: String },
    Filtered { base_view_key: String },
    Custom,
}

#[derive(Debug, Clone, Default)]
pub struct AutoLayout {
    pub rank_direction: Option<String>,
    pub rank_separation: Option<u32>,
    pub node_separation: Option<u32>,
}

/// One step of an animation: the set of element/relationship identifiers
/// (or tag expressions) that become visible at that step.
pub type AnimationStep = Vec<String>;

#[derive(Debug, Clone)]
pub struct ViewRecord {
    pub key: String,
    pub kind: ViewKind,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw `include`/`exclude` expressions, kept as written.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub auto_layout: Option<AutoLayout>,
    pub animation_steps: Vec<AnimationStep>,
    /// Explicit relationships declared inside a `dynamic` view body, in
    /// source order, as (source-ref, destination-ref, description).
    pub dynamic_relationships: Vec<(String, String, String)>,
}

impl ViewRecord {
    pub fn new(key: impl Into<String>, kind: ViewKind) -> Self {
        Self {
            key: key.into(),
            kind,
            title: None,
            description: None,
            includes: Vec::new(),
            excludes: Vec::new(),
            auto_layout: None,
            animation_steps: Vec::new(),
            dynamic_relationships: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ElementStyle {
    pub tag_selector: String,
    pub background: Option<String>,
    pub color: Option<String>,
    pub stroke: Option<String>,
    pub shape: Option<String>,
    pub border: Option<String>,
    pub opacity: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub font_size: Option<u32>,
    pub metadata: Option<bool>,
    pub description_visible: Option<bool>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipStyle {
    pub tag_selector: String,
    pub thickness: Option<u32>,
    pub color: Option<String>,
    pub dashed: Option<bool>,
    pub opacity: Option<u8>,
    pub width: Option<u32>,
    pub font_size: Option<u32>,
    pub position: Option<u32>,
    pub routing: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Branding {
    pub logo: Option<String>,
    pub font: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Terminology {
    /// e.g. `"person" -> "Actor"`, `"softwareSystem" -> "Service"`.
    pub overrides: rustc_hash::FxHashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub users: Vec<(String, String)>,
}
