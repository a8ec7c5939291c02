//! The workspace aggregate and the narrow builder interface the parser
//! mutates it through.
//!
//! The domain object model itself is treated as an external, opaque
//! collaborator reached only through [`WorkspaceBuilder`]; [`Workspace`]
//! is this crate's own in-memory implementation of that interface — a
//! concrete aggregate generic over a trait-bounded seam, rather than a
//! `dyn Trait` (no call site in this crate needs dynamic dispatch, and
//! every method here takes/returns plain data, so static dispatch keeps
//! `Parser` monomorphic and its error messages short).

use indexmap::IndexMap;

use super::element::{ElementId, ElementKind, ElementRecord};
use super::relationship::{RelationshipId, RelationshipRecord};
use super::view::{Branding, Configuration, ElementStyle, RelationshipStyle, Terminology, ViewKind, ViewRecord};

#[derive(Debug, Clone, Default)]
pub struct DeploymentEnvironment {
    pub name: String,
    pub deployment_groups: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Model {
    pub elements: Vec<ElementRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub enterprise_name: Option<String>,
    pub deployment_environments: IndexMap<String, DeploymentEnvironment>,
}

/// The narrow interface production handlers mutate the workspace through.
///
/// Every method takes and returns plain identifiers/records rather than
/// handing out long-lived references, so a caller could substitute a
/// different backing store (e.g. one that persists to disk as it goes)
/// without the parser itself changing.
pub trait WorkspaceBuilder {
    fn set_name(&mut self, name: &str);
    fn set_description(&mut self, description: &str);

    fn create_element(&mut self, kind: ElementKind, name: &str) -> ElementId;
    fn element(&self, id: ElementId) -> &ElementRecord;
    fn element_mut(&mut self, id: ElementId) -> &mut ElementRecord;
    fn element_count(&self) -> usize;

    fn set_enterprise(&mut self, name: &str);
    fn enterprise_name(&self) -> Option<&str>;
    /// Runs the `enterprise { }` frame's end-hook effect deferred to model
    /// close: marks every person/software-system declared outside the
    /// enterprise boundary as external, iff an enterprise was declared.
    fn finalize_enterprise_boundary(&mut self);

    fn ensure_deployment_environment(&mut self, name: &str) -> &mut DeploymentEnvironment;
    fn deployment_environment(&self, name: &str) -> Option<&DeploymentEnvironment>;

    fn create_relationship(&mut self, source: ElementId, destination: ElementId) -> RelationshipId;
    fn relationship(&self, id: RelationshipId) -> &RelationshipRecord;
    fn relationship_mut(&mut self, id: RelationshipId) -> &mut RelationshipRecord;

    fn create_view(&mut self, kind: ViewKind, key: &str) -> usize;
    fn view_mut(&mut self, index: usize) -> &mut ViewRecord;
    fn views(&self) -> &[ViewRecord];

    fn add_element_style(&mut self, style: ElementStyle);
    fn add_relationship_style(&mut self, style: RelationshipStyle);
    fn branding_mut(&mut self) -> &mut Branding;
    fn terminology_mut(&mut self) -> &mut Terminology;
    fn add_theme(&mut self, theme: &str);
    fn configuration_mut(&mut self) -> &mut Configuration;

    /// Resolves a canonical-name `!ref` expression, e.g.
    /// `SoftwareSystem://Software System 1` or the nested
    /// `Container://Software System 1/Web` form.
    fn find_by_canonical_name(&self, type_name: &str, path: &[String]) -> Option<ElementId>;

    /// True if the model was non-empty *before* this parse began.
    fn is_extending(&self) -> bool;

    fn set_echoed_dsl(&mut self, text: String);
    fn echoed_dsl(&self) -> &str;
}

/// In-memory default implementation of [`WorkspaceBuilder`].
#[derive(Debug, Default)]
pub struct Workspace {
    pub name: String,
    pub description: String,
    pub model: Model,
    pub views: Vec<ViewRecord>,
    pub element_styles: Vec<ElementStyle>,
    pub relationship_styles: Vec<RelationshipStyle>,
    pub branding: Branding,
    pub terminology: Terminology,
    pub themes: Vec<String>,
    pub configuration: Configuration,
    echoed_dsl: String,
    extending: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a workspace that already carries a model, as if it had
    /// been deserialized from an existing `workspace extends` target.
    pub fn extending(mut self) -> Self {
        self.extending = true;
        self
    }
}

impl WorkspaceBuilder for Workspace {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    fn create_element(&mut self, kind: ElementKind, name: &str) -> ElementId {
        let id = ElementId(self.model.elements.len() as u32);
        self.model.elements.push(ElementRecord::new(id, kind, name));
        id
    }

    fn element(&self, id: ElementId) -> &ElementRecord {
        &self.model.elements[id.index()]
    }

    fn element_mut(&mut self, id: ElementId) -> &mut ElementRecord {
        &mut self.model.elements[id.index()]
    }

    fn element_count(&self) -> usize {
        self.model.elements.len()
    }

    fn set_enterprise(&mut self, name: &str) {
        self.model.enterprise_name = Some(name.to_string());
    }

    fn enterprise_name(&self) -> Option<&str> {
        self.model.enterprise_name.as_deref()
    }

    fn finalize_enterprise_boundary(&mut self) {
        if self.model.enterprise_name.is_none() {
            return;
        }
        for element in &mut self.model.elements {
            if element.is_person_or_software_system() && element.declared_outside_enterprise {
                element.external = true;
            }
        }
    }

    fn ensure_deployment_environment(&mut self, name: &str) -> &mut DeploymentEnvironment {
        self.model
            .deployment_environments
            .entry(name.to_string())
            .or_insert_with(|| DeploymentEnvironment {
                name: name.to_string(),
                deployment_groups: Vec::new(),
            })
    }

    fn deployment_environment(&self, name: &str) -> Option<&DeploymentEnvironment> {
        self.model.deployment_environments.get(name)
    }

    fn create_relationship(&mut self, source: ElementId, destination: ElementId) -> RelationshipId {
        let id = RelationshipId(self.model.relationships.len() as u32);
        self.model
            .relationships
            .push(RelationshipRecord::new(id, source, destination));
        id
    }

    fn relationship(&self, id: RelationshipId) -> &RelationshipRecord {
        &self.model.relationships[id.index()]
    }

    fn relationship_mut(&mut self, id: RelationshipId) -> &mut RelationshipRecord {
        &mut self.model.relationships[id.index()]
    }

    fn create_view(&mut self, kind: ViewKind, key: &str) -> usize {
        let index = self.views.len();
        self.views.push(ViewRecord::new(key, kind));
        index
    }

    fn view_mut(&mut self, index: usize) -> &mut ViewRecord {
        &mut self.views[index]
    }

    fn views(&self) -> &[ViewRecord] {
        &self.views
    }

    fn add_element_style(&mut self, style: ElementStyle) {
        self.element_styles.push(style);
    }

    fn add_relationship_style(&mut self, style: RelationshipStyle) {
        self.relationship_styles.push(style);
    }

    fn branding_mut(&mut self) -> &mut Branding {
        &mut self.branding
    }

    fn terminology_mut(&mut self) -> &mut Terminology {
        &mut self.terminology
    }

    fn add_theme(&mut self, theme: &str) {
        self.themes.push(theme.to_string());
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    fn find_by_canonical_name(&self, type_name: &str, path: &[String]) -> Option<ElementId> {
        let (first, rest) = path.split_first()?;
        let mut current = self
            .model
            .elements
            .iter()
            .find(|e| e.parent.is_none() && e.kind.type_name() == type_name && e.name == *first)?
            .id;
        for segment in rest {
            current = self
                .model
                .elements
                .iter()
                .find(|e| e.parent == Some(current) && e.name == *segment)?
                .id;
        }
        Some(current)
    }

    fn is_extending(&self) -> bool {
        self.extending || !self.model.elements.is_empty()
    }

    fn set_echoed_dsl(&mut self, text: String) {
        self.echoed_dsl = text;
    }

    fn echoed_dsl(&self) -> &str {
        &self.echoed_dsl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_resolves_top_level_system() {
        let mut ws = Workspace::new();
        ws.create_element(ElementKind::SoftwareSystem, "Software System 1");
        let found = ws.find_by_canonical_name("SoftwareSystem", &["Software System 1".to_string()]);
        assert!(found.is_some());
    }

    #[test]
    fn canonical_name_resolves_nested_container() {
        let mut ws = Workspace::new();
        let sys = ws.create_element(ElementKind::SoftwareSystem, "Software System 1");
        let web = ws.create_element(ElementKind::Container, "Web");
        ws.element_mut(web).parent = Some(sys);

        let found = ws.find_by_canonical_name(
            "Container",
            &["Software System 1".to_string(), "Web".to_string()],
        );
        assert_eq!(found, Some(web));
    }

    #[test]
    fn enterprise_boundary_marks_outside_elements_external() {
        let mut ws = Workspace::new();
        ws.set_enterprise("Acme");
        let inside = ws.create_element(ElementKind::Person, "Employee");
        let outside = ws.create_element(ElementKind::Person, "Customer");
        ws.element_mut(outside).declared_outside_enterprise = true;

        ws.finalize_enterprise_boundary();

        assert!(!ws.element(inside).external);
        assert!(ws.element(outside).external);
    }

    #[test]
    fn no_enterprise_means_nothing_is_marked_external() {
        let mut ws = Workspace::new();
        let p = ws.create_element(ElementKind::Person, "Customer");
        ws.element_mut(p).declared_outside_enterprise = true;
        ws.finalize_enterprise_boundary();
        assert!(!ws.element(p).external);
    }
}
