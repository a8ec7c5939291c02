//! The `!constant` table.
//!
//! Constants are global to a parse: name → value, set once per name (later
//! `!constant` declarations simply overwrite earlier ones, the same
//! "last wins" resolution `!impliedRelationships` uses — see DESIGN.md's
//! Open Question log).

use rustc_hash::FxHashMap;

/// Returns whether `name` matches `[A-Za-z0-9_.\-]+`.
pub fn is_valid_constant_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

#[derive(Debug, Default, Clone)]
pub struct ConstantTable {
    values: FxHashMap<String, String>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines (or overwrites) a constant. Returns `false` if `name` is not
    /// a valid constant name.
    pub fn define(&mut self, name: &str, value: &str) -> bool {
        if !is_valid_constant_name(name) {
            return false;
        }
        self.values.insert(name.to_string(), value.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dots_dashes_and_underscores() {
        assert!(is_valid_constant_name("my-const.name_1"));
    }

    #[test]
    fn rejects_whitespace_and_braces() {
        assert!(!is_valid_constant_name("my const"));
        assert!(!is_valid_constant_name("${NAME}"));
        assert!(!is_valid_constant_name(""));
    }

    #[test]
    fn redefining_a_constant_is_last_wins() {
        let mut table = ConstantTable::new();
        assert!(table.define("NAME", "Acme"));
        assert!(table.define("NAME", "Globex"));
        assert_eq!(table.get("NAME"), Some("Globex"));
    }

    #[test]
    fn invalid_name_is_rejected_without_mutating_table() {
        let mut table = ConstantTable::new();
        assert!(!table.define("bad name", "x"));
        assert_eq!(table.get("bad name"), None);
    }
}
