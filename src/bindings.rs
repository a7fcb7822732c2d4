use std::collections::HashMap;
use std::fs;
use std::path::Path;

use miette::{IntoDiagnostic, WrapErr};
use serde::Deserialize;

use crate::pipeline::BindingStore;

/// One catalog entry: an asset/attribute pair bound to a formula.
#[derive(Debug, Clone, Deserialize)]
pub struct Binding {
    pub asset_id: String,
    pub attribute_id: String,
    pub expression: String,
}

/// Binding catalog held in memory, keyed by (asset id, attribute id).
/// Uniqueness per pair is the catalog's contract; inserting a duplicate
/// replaces the earlier formula.
#[derive(Debug, Default)]
pub struct InMemoryBindingStore {
    bindings: HashMap<(String, String), String>,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        InMemoryBindingStore::default()
    }

    pub fn insert(&mut self, binding: Binding) {
        self.bindings.insert(
            (binding.asset_id, binding.attribute_id),
            binding.expression,
        );
    }

    /// Loads a JSON array of `{asset_id, attribute_id, expression}` entries.
    pub fn from_json_file(path: impl AsRef<Path>) -> miette::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading `{}` failed", path.display()))?;
        let bindings: Vec<Binding> = serde_json::from_str(&contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("decoding bindings from `{}` failed", path.display()))?;
        let mut store = InMemoryBindingStore::new();
        for binding in bindings {
            store.insert(binding);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl BindingStore for InMemoryBindingStore {
    fn find(&self, asset_id: &str, attribute_id: &str) -> Option<&str> {
        self.bindings
            .get(&(asset_id.to_string(), attribute_id.to_string()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_keyed_by_both_identifiers() {
        let mut store = InMemoryBindingStore::new();
        store.insert(Binding {
            asset_id: "A001".to_string(),
            attribute_id: "temp".to_string(),
            expression: "ATTR+50".to_string(),
        });

        assert_eq!(store.find("A001", "temp"), Some("ATTR+50"));
        assert_eq!(store.find("A001", "pressure"), None);
        assert_eq!(store.find("A002", "temp"), None);
    }

    #[test]
    fn duplicate_pair_replaces_the_formula() {
        let mut store = InMemoryBindingStore::new();
        for expression in ["ATTR+1", "ATTR+2"] {
            store.insert(Binding {
                asset_id: "A001".to_string(),
                attribute_id: "temp".to_string(),
                expression: expression.to_string(),
            });
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("A001", "temp"), Some("ATTR+2"));
    }
}
