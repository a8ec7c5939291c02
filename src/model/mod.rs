//! The workspace data model production handlers populate.
//!
//! This module stores what the DSL declares; it does not validate
//! architectural soundness beyond identifier uniqueness.

mod element;
mod relationship;
mod view;
mod workspace;

pub use element::{ElementId, ElementKind, ElementRecord};
pub use relationship::{RelationshipId, RelationshipRecord};
pub use view::{
    AnimationStep, AutoLayout, Branding, Configuration, ElementStyle, RelationshipStyle,
    Terminology, ViewKind, ViewRecord,
};
pub use workspace::{DeploymentEnvironment, Model, Workspace, WorkspaceBuilder};
