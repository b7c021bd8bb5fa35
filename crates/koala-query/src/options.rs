//! Query configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::selector::PseudoClassName;

/// Options controlling how selectors are compiled.
///
/// Deserializes from JSON with every field optional:
///
/// ```json
/// { "defaultEngine": "css:light", "pseudoClasses": ["nth-child", "not"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
    /// Engine for parts without a `name=` prefix.
    pub default_engine: Engine,

    /// Pseudo-classes the clause parser accepts. Any other pseudo-class is
    /// reported as unknown.
    pub pseudo_classes: BTreeSet<PseudoClassName>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            default_engine: Engine::Css,
            pseudo_classes: PseudoClassName::ALL.into_iter().collect(),
        }
    }
}

impl QueryOptions {
    /// Whether `name` may appear in a clause.
    #[must_use]
    pub fn allows(&self, name: PseudoClassName) -> bool {
        self.pseudo_classes.contains(&name)
    }

    /// Enable a pseudo-class.
    #[must_use]
    pub fn with_pseudo_class(mut self, name: PseudoClassName) -> Self {
        let _ = self.pseudo_classes.insert(name);
        self
    }

    /// Disable a pseudo-class.
    #[must_use]
    pub fn without_pseudo_class(mut self, name: PseudoClassName) -> Self {
        let _ = self.pseudo_classes.remove(&name);
        self
    }

    /// Use `engine` for parts without a prefix.
    #[must_use]
    pub fn with_default_engine(mut self, engine: Engine) -> Self {
        self.default_engine = engine;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_everything() {
        let options = QueryOptions::default();
        assert!(PseudoClassName::ALL.iter().all(|&name| options.allows(name)));
        assert_eq!(options.default_engine, Engine::Css);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: QueryOptions =
            serde_json::from_str(r#"{ "pseudoClasses": ["nth-child", "not"] }"#).unwrap();
        assert!(options.allows(PseudoClassName::NthChild));
        assert!(!options.allows(PseudoClassName::Empty));
        assert_eq!(options.default_engine, Engine::Css);

        let options: QueryOptions =
            serde_json::from_str(r#"{ "defaultEngine": "css:light" }"#).unwrap();
        assert_eq!(options.default_engine, Engine::CssLight);
        assert!(options.allows(PseudoClassName::Empty));
    }

    #[test]
    fn test_builders() {
        let options = QueryOptions::default()
            .without_pseudo_class(PseudoClassName::Root)
            .with_default_engine(Engine::Text);
        assert!(!options.allows(PseudoClassName::Root));
        assert!(options.with_pseudo_class(PseudoClassName::Root).allows(PseudoClassName::Root));
    }
}
