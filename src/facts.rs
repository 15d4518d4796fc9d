//! Declarative bind facts and host metadata ingestion.
//!
//! Hosts describe bindable DOM attributes and component properties in their
//! own loose shapes. Everything here converts those into plain records before
//! the registry looks at them.

use serde::{Deserialize, Serialize};

/// Element name standing for "any element".
pub const WILDCARD_ELEMENT: &str = "*";

/// One legal (value, change) attribute pair for an element, optionally
/// narrowed by a type qualifier such as `<input type="checkbox">`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct BindTargetFact {
    pub element: String,
    pub type_qualifier: Option<String>,
    pub value_attribute: String,
    pub change_attribute: String,
}

impl BindTargetFact {
    pub fn new(
        element: &str,
        type_qualifier: Option<&str>,
        value_attribute: &str,
        change_attribute: &str,
    ) -> Self {
        BindTargetFact {
            element: element.to_string(),
            type_qualifier: type_qualifier.map(str::to_string),
            value_attribute: value_attribute.to_string(),
            change_attribute: change_attribute.to_string(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.element == WILDCARD_ELEMENT
    }
}

pub fn builtin_facts() -> Vec<BindTargetFact> {
    vec![
        BindTargetFact::new(WILDCARD_ELEMENT, None, "value", "changed"),
        BindTargetFact::new("input", Some("checkbox"), "checked", "changed"),
        BindTargetFact::new("input", Some("text"), "value", "changed"),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST DECLARATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// A fact as the host declares it. Every field may be missing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FactDeclaration {
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub type_qualifier: Option<String>,
    #[serde(default)]
    pub value_attribute: Option<String>,
    #[serde(default)]
    pub change_attribute: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub type_name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub type_name: String,
    /// True when the property is shaped like an event delegate.
    #[serde(default)]
    pub is_delegate: bool,
}

impl ComponentDescriptor {
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Converts host declarations into facts. Declarations without a value or
/// change attribute are discarded.
pub fn ingest_fact_declarations(declarations: &[FactDeclaration]) -> Vec<BindTargetFact> {
    let mut facts = Vec::with_capacity(declarations.len());
    for decl in declarations {
        let (value, change) = match (
            non_blank(&decl.value_attribute),
            non_blank(&decl.change_attribute),
        ) {
            (Some(value), Some(change)) => (value, change),
            _ => {
                tracing::debug!(
                    element = ?decl.element,
                    value_attribute = ?decl.value_attribute,
                    change_attribute = ?decl.change_attribute,
                    "discarding bind declaration without value/change attribute"
                );
                continue;
            }
        };
        let element = non_blank(&decl.element).unwrap_or(WILDCARD_ELEMENT);
        facts.push(BindTargetFact::new(
            element,
            non_blank(&decl.type_qualifier),
            value,
            change,
        ));
    }
    facts
}

/// Full fact set for one compilation: built-ins (when enabled) followed by
/// declared facts, exact duplicates collapsed to their first occurrence.
pub fn collect_facts(declared: &[BindTargetFact], include_builtins: bool) -> Vec<BindTargetFact> {
    let mut facts: Vec<BindTargetFact> = Vec::new();
    let builtins = if include_builtins {
        builtin_facts()
    } else {
        Vec::new()
    };
    for fact in builtins.into_iter().chain(declared.iter().cloned()) {
        if !facts.contains(&fact) {
            facts.push(fact);
        }
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_facts() {
        let facts = builtin_facts();
        assert_eq!(facts.len(), 3);
        assert!(facts[0].is_wildcard());
        assert_eq!(facts[1].type_qualifier.as_deref(), Some("checkbox"));
        assert_eq!(facts[1].value_attribute, "checked");
    }

    #[test]
    fn test_ingest_discards_blank_attributes() {
        let decls = vec![
            FactDeclaration {
                element: Some("select".to_string()),
                type_qualifier: None,
                value_attribute: Some("value".to_string()),
                change_attribute: Some("onchange".to_string()),
            },
            FactDeclaration {
                element: Some("textarea".to_string()),
                value_attribute: Some("  ".to_string()),
                change_attribute: Some("onchange".to_string()),
                ..Default::default()
            },
            FactDeclaration {
                element: None,
                value_attribute: Some("value".to_string()),
                change_attribute: None,
                ..Default::default()
            },
        ];
        let facts = ingest_fact_declarations(&decls);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].element, "select");
    }

    #[test]
    fn test_ingest_defaults_to_wildcard() {
        let decls = vec![FactDeclaration {
            element: Some(" ".to_string()),
            type_qualifier: Some("".to_string()),
            value_attribute: Some("value".to_string()),
            change_attribute: Some("oninput".to_string()),
        }];
        let facts = ingest_fact_declarations(&decls);
        assert_eq!(facts[0].element, WILDCARD_ELEMENT);
        assert_eq!(facts[0].type_qualifier, None);
    }

    #[test]
    fn test_collect_facts_dedupes() {
        let declared = vec![
            BindTargetFact::new("input", Some("text"), "value", "changed"),
            BindTargetFact::new("select", None, "value", "changed"),
            BindTargetFact::new("select", None, "value", "changed"),
        ];
        let facts = collect_facts(&declared, true);
        assert_eq!(facts.len(), 4);
        assert_eq!(facts[3].element, "select");

        let facts = collect_facts(&declared, false);
        assert_eq!(facts.len(), 2);
    }

    #[test]
    fn test_empty_declarations_fall_back_to_builtins() {
        assert_eq!(collect_facts(&[], true), builtin_facts());
        assert!(collect_facts(&[], false).is_empty());
    }
}
