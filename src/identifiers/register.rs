//! The identifier register: two disjoint mappings,
//! identifier → element and identifier → relationship.
//!
//! An interned-key lookup table keyed by normalised name, rejecting
//! redefinitions, generalised to the two entity kinds this DSL registers
//! and to case-insensitive, `\w+`-constrained keys rather than qualified
//! dotted-path scoping.

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::model::{ElementId, RelationshipId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierScope {
    #[default]
    Flat,
    Hierarchical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// The identifier doesn't match `\w+`.
    InvalidIdentifier { identifier: String },
    /// The proposed key is already in use by a different element or by a relationship.
    IdentifierInUse { identifier: String },
    /// The element is already registered under a different key.
    ElementAlreadyHasIdentifier { existing: String, existing_is_synthetic: bool },
}

/// Returns whether `s` matches `\w+`: non-empty, every character alphanumeric or `_`.
pub fn is_valid_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn is_word(s: &str) -> bool {
    is_valid_word(s)
}

#[derive(Debug, Default)]
pub struct IdentifierRegister {
    elements: FxHashMap<String, ElementId>,
    relationships: FxHashMap<String, RelationshipId>,
    /// Reverse lookup: element → (its registered key, whether that key was synthesised).
    element_keys: FxHashMap<ElementId, (String, bool)>,
    scope: IdentifierScope,
}

impl IdentifierRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> IdentifierScope {
        self.scope
    }

    pub fn set_scope(&mut self, scope: IdentifierScope) {
        self.scope = scope;
    }

    fn key_in_use(&self, key: &str) -> bool {
        self.elements.contains_key(key) || self.relationships.contains_key(key)
    }

    /// Registers `id` under `identifier`, synthesising a UUID key when
    /// `identifier` is `None`. Returns the key actually stored under.
    ///
    /// Equivalent to [`Self::register_element_scoped`] with no parent or
    /// environment prefix — the right call for elements that never sit
    /// beneath another registered element (people, top-level software
    /// systems, `!ref`-assigned identifiers).
    pub fn register_element(
        &mut self,
        identifier: Option<&str>,
        id: ElementId,
    ) -> Result<String, RegisterError> {
        self.register_element_scoped(identifier, None, None, id)
    }

    /// Registers `id` under `identifier`, prefixed per [`IdentifierScope`]
    /// when hierarchical: `parent_key` is the registered key of the
    /// element's own model parent (if any), `environment_key` is the
    /// deployment environment name for a parentless `DeploymentNode` (spec
    /// §4.4's "pseudo-element" rule). Ignored entirely in `Flat` scope.
    pub fn register_element_scoped(
        &mut self,
        identifier: Option<&str>,
        parent_key: Option<&str>,
        environment_key: Option<&str>,
        id: ElementId,
    ) -> Result<String, RegisterError> {
        if let Some((existing_key, existing_is_synthetic)) = self.element_keys.get(&id) {
            // The element is already registered; registering it again under a
            // *different* key is rejected, registering it again
            // under the *same* key (e.g. a hierarchical re-touch) is a no-op.
            if identifier.is_none() || identifier.map(str::to_lowercase).as_deref() == Some(existing_key.as_str()) {
                return Ok(existing_key.clone());
            }
            return Err(RegisterError::ElementAlreadyHasIdentifier {
                existing: existing_key.clone(),
                existing_is_synthetic: *existing_is_synthetic,
            });
        }

        let (key, is_synthetic) = match identifier {
            Some(raw) => {
                if !is_word(raw) {
                    return Err(RegisterError::InvalidIdentifier { identifier: raw.to_string() });
                }
                let local = raw.to_lowercase();
                let key = match self.scope {
                    IdentifierScope::Hierarchical => hierarchical_key(parent_key, environment_key, &local),
                    IdentifierScope::Flat => local,
                };
                (key, false)
            }
            None => (Uuid::new_v4().to_string(), true),
        };

        if self.key_in_use(&key) {
            return Err(RegisterError::IdentifierInUse { identifier: key });
        }

        self.elements.insert(key.clone(), id);
        self.element_keys.insert(id, (key.clone(), is_synthetic));
        Ok(key)
    }

    pub fn register_relationship(
        &mut self,
        identifier: Option<&str>,
        id: RelationshipId,
    ) -> Result<String, RegisterError> {
        let key = match identifier {
            Some(raw) => {
                if !is_word(raw) {
                    return Err(RegisterError::InvalidIdentifier { identifier: raw.to_string() });
                }
                raw.to_lowercase()
            }
            None => Uuid::new_v4().to_string(),
        };

        if self.key_in_use(&key) {
            return Err(RegisterError::IdentifierInUse { identifier: key });
        }

        self.relationships.insert(key.clone(), id);
        Ok(key)
    }

    pub fn get_element(&self, identifier: &str) -> Option<ElementId> {
        self.elements.get(&identifier.to_lowercase()).copied()
    }

    pub fn get_relationship(&self, identifier: &str) -> Option<RelationshipId> {
        self.relationships.get(&identifier.to_lowercase()).copied()
    }

    /// The key an element was actually registered under, if any.
    pub fn key_of_element(&self, id: ElementId) -> Option<&str> {
        self.element_keys.get(&id).map(|(key, _)| key.as_str())
    }
}

/// Computes a hierarchical key: parent key + `.` + local key,
/// or environment key + `.` + local key for a parentless `DeploymentNode`,
/// or the bare local key otherwise.
pub fn hierarchical_key(parent_key: Option<&str>, environment_key: Option<&str>, local_key: &str) -> String {
    match parent_key.or(environment_key) {
        Some(prefix) => format!("{prefix}.{local_key}"),
        None => local_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_insensitive() {
        let mut register = IdentifierRegister::new();
        let id = ElementId(0);
        register.register_element(Some("Foo"), id).unwrap();
        assert_eq!(register.get_element("FOO"), Some(id));
        assert_eq!(register.get_element("foo"), Some(id));
    }

    #[test]
    fn absent_identifier_synthesises_uuid() {
        let mut register = IdentifierRegister::new();
        let id = ElementId(0);
        let key = register.register_element(None, id).unwrap();
        assert_eq!(register.get_element(&key), Some(id));
        assert_eq!(register.key_of_element(id), Some(key.as_str()));
    }

    #[test]
    fn invalid_identifier_is_rejected() {
        let mut register = IdentifierRegister::new();
        let id = ElementId(0);
        let err = register.register_element(Some("not valid!"), id).unwrap_err();
        assert_eq!(err, RegisterError::InvalidIdentifier { identifier: "not valid!".to_string() });
    }

    #[test]
    fn duplicate_key_across_elements_is_rejected() {
        let mut register = IdentifierRegister::new();
        register.register_element(Some("a"), ElementId(0)).unwrap();
        let err = register.register_element(Some("a"), ElementId(1)).unwrap_err();
        assert_eq!(err, RegisterError::IdentifierInUse { identifier: "a".to_string() });
    }

    #[test]
    fn element_key_collides_with_relationship_key() {
        let mut register = IdentifierRegister::new();
        register.register_relationship(Some("uses"), RelationshipId(0)).unwrap();
        let err = register.register_element(Some("uses"), ElementId(0)).unwrap_err();
        assert_eq!(err, RegisterError::IdentifierInUse { identifier: "uses".to_string() });
    }

    #[test]
    fn re_registering_element_under_new_key_is_rejected() {
        let mut register = IdentifierRegister::new();
        let id = ElementId(0);
        register.register_element(None, id).unwrap();
        let err = register.register_element(Some("named"), id).unwrap_err();
        match err {
            RegisterError::ElementAlreadyHasIdentifier { existing_is_synthetic, .. } => {
                assert!(existing_is_synthetic);
            }
            other => panic!("expected ElementAlreadyHasIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn hierarchical_key_prefixes_with_parent() {
        assert_eq!(hierarchical_key(Some("ss"), None, "web"), "ss.web");
    }

    #[test]
    fn hierarchical_key_falls_back_to_environment_for_parentless_deployment_node() {
        assert_eq!(hierarchical_key(None, Some("live"), "node1"), "live.node1");
    }

    #[test]
    fn hierarchical_key_is_bare_when_no_parent_or_environment() {
        assert_eq!(hierarchical_key(None, None, "ss"), "ss");
    }
}
