//! Bind Target Registry
//!
//! Builds the closed set of bind targets for one compilation and the tag
//! matching rules the parser uses to route `bind` attributes to them.
//!
//! ## Matching invariants
//!
//! 1. Every element fact gets a fully-qualified rule on `bind-<value>`.
//! 2. Only facts alone in their `(element, qualifier)` group get a bare `bind` rule.
//!    Ambiguous pairs must be written out by the author.
//! 3. Exactly one fallback rule exists, on the `bind-` prefix, and it is last.
//! 4. A component property `FooChanged` (delegate) next to `Foo` (not a delegate)
//!    yields one component target. Anything else is silently not bindable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::facts::{BindTargetFact, ComponentDescriptor, WILDCARD_ELEMENT};
use crate::options::ExpansionOptions;

pub const BIND_ATTRIBUTE: &str = "bind";
pub const BIND_PREFIX: &str = "bind-";
pub const CHANGED_SUFFIX: &str = "Changed";

// ═══════════════════════════════════════════════════════════════════════════════
// BIND TARGETS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Element,
    Component,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindTarget {
    pub kind: TargetKind,
    pub element: String,
    #[serde(default)]
    pub type_qualifier: Option<String>,
    #[serde(default)]
    pub value_attribute: Option<String>,
    #[serde(default)]
    pub change_attribute: Option<String>,
    #[serde(default)]
    pub component_type: Option<String>,
}

impl BindTarget {
    pub fn from_fact(fact: &BindTargetFact) -> Self {
        BindTarget {
            kind: TargetKind::Element,
            element: fact.element.clone(),
            type_qualifier: fact.type_qualifier.clone(),
            value_attribute: Some(fact.value_attribute.clone()),
            change_attribute: Some(fact.change_attribute.clone()),
            component_type: None,
        }
    }

    pub fn component(type_name: &str, value_attribute: &str, change_attribute: &str) -> Self {
        BindTarget {
            kind: TargetKind::Component,
            element: type_name.to_string(),
            type_qualifier: None,
            value_attribute: Some(value_attribute.to_string()),
            change_attribute: Some(change_attribute.to_string()),
            component_type: Some(type_name.to_string()),
        }
    }

    /// Catch-all target so a `bind-` attribute is always recognized.
    pub fn fallback() -> Self {
        BindTarget {
            kind: TargetKind::Fallback,
            element: WILDCARD_ELEMENT.to_string(),
            type_qualifier: None,
            value_attribute: None,
            change_attribute: None,
            component_type: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == TargetKind::Fallback
    }
}

/// One target per fact, in fact order, followed by the fallback target.
pub fn build_element_targets(facts: &[BindTargetFact]) -> Vec<BindTarget> {
    facts
        .iter()
        .map(BindTarget::from_fact)
        .chain(std::iter::once(BindTarget::fallback()))
        .collect()
}

/// Pairs `Foo` with a delegate-shaped `FooChanged` on each component.
pub fn build_component_targets(components: &[ComponentDescriptor]) -> Vec<BindTarget> {
    let mut targets = Vec::new();
    for component in components {
        for changed in &component.properties {
            if !changed.is_delegate {
                continue;
            }
            let base = match changed.name.strip_suffix(CHANGED_SUFFIX) {
                Some(base) if !base.is_empty() => base,
                _ => continue,
            };
            let has_value_property = component
                .properties
                .iter()
                .any(|p| p.name == base && !p.is_delegate);
            if has_value_property {
                targets.push(BindTarget::component(
                    &component.type_name,
                    base,
                    &changed.name,
                ));
            }
        }
    }
    targets
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHING RULES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttributeComparison {
    Exact,
    Prefix,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRequirement {
    pub name: String,
    pub comparison: AttributeComparison,
}

/// Required attribute value on the tag, e.g. `type="checkbox"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConstraint {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagMatchingRule {
    pub target_index: usize,
    pub tag_name: String,
    #[serde(default)]
    pub qualifier: Option<AttributeConstraint>,
    pub attribute: AttributeRequirement,
}

impl TagMatchingRule {
    pub fn matches_attribute_name(&self, name: &str) -> bool {
        match self.attribute.comparison {
            AttributeComparison::Exact => name == self.attribute.name,
            AttributeComparison::Prefix => name.starts_with(&self.attribute.name),
        }
    }

    pub fn is_wildcard_tag(&self) -> bool {
        self.tag_name == WILDCARD_ELEMENT
    }
}

type GroupKey<'a> = (&'a str, Option<&'a str>);

fn group_key(target: &BindTarget) -> GroupKey<'_> {
    (target.element.as_str(), target.type_qualifier.as_deref())
}

/// An `(element, qualifier)` pair shared by more than one element fact. It
/// has no bare `bind` rule, and no less specific bare rule may stand in for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousGroup {
    pub element: String,
    pub type_qualifier: Option<String>,
}

fn build_rules(
    targets: &[BindTarget],
    qualifier_attribute: &str,
) -> (Vec<TagMatchingRule>, Vec<AmbiguousGroup>) {
    let mut group_sizes: HashMap<GroupKey<'_>, usize> = HashMap::new();
    for target in targets.iter().filter(|t| t.kind == TargetKind::Element) {
        *group_sizes.entry(group_key(target)).or_insert(0) += 1;
    }

    let mut ambiguous_groups: Vec<AmbiguousGroup> = Vec::new();
    for target in targets.iter().filter(|t| t.kind == TargetKind::Element) {
        let key = group_key(target);
        let seen = ambiguous_groups
            .iter()
            .any(|g| g.element == key.0 && g.type_qualifier.as_deref() == key.1);
        if !seen && group_sizes.get(&key).map_or(false, |n| *n > 1) {
            ambiguous_groups.push(AmbiguousGroup {
                element: key.0.to_string(),
                type_qualifier: key.1.map(str::to_string),
            });
        }
    }

    let mut rules = Vec::new();
    for (index, target) in targets.iter().enumerate() {
        match target.kind {
            TargetKind::Element => {
                let value = target.value_attribute.as_deref().unwrap_or_default();
                let qualifier = target.type_qualifier.as_ref().map(|q| AttributeConstraint {
                    name: qualifier_attribute.to_string(),
                    value: q.clone(),
                });
                rules.push(TagMatchingRule {
                    target_index: index,
                    tag_name: target.element.clone(),
                    qualifier: qualifier.clone(),
                    attribute: AttributeRequirement {
                        name: format!("{}{}", BIND_PREFIX, value),
                        comparison: AttributeComparison::Exact,
                    },
                });
                if group_sizes.get(&group_key(target)) == Some(&1) {
                    rules.push(TagMatchingRule {
                        target_index: index,
                        tag_name: target.element.clone(),
                        qualifier,
                        attribute: AttributeRequirement {
                            name: BIND_ATTRIBUTE.to_string(),
                            comparison: AttributeComparison::Exact,
                        },
                    });
                }
            }
            TargetKind::Component => {
                let value = target.value_attribute.as_deref().unwrap_or_default();
                rules.push(TagMatchingRule {
                    target_index: index,
                    tag_name: target.element.clone(),
                    qualifier: None,
                    attribute: AttributeRequirement {
                        name: format!("{}{}", BIND_PREFIX, value),
                        comparison: AttributeComparison::Exact,
                    },
                });
            }
            TargetKind::Fallback => {}
        }
    }

    // Fallback rules go last so every specific rule is considered first.
    for (index, target) in targets.iter().enumerate() {
        if target.is_fallback() {
            rules.push(TagMatchingRule {
                target_index: index,
                tag_name: WILDCARD_ELEMENT.to_string(),
                qualifier: None,
                attribute: AttributeRequirement {
                    name: BIND_PREFIX.to_string(),
                    comparison: AttributeComparison::Prefix,
                },
            });
        }
    }

    (rules, ambiguous_groups)
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only after construction; share it across compilation units freely.
#[derive(Debug, Clone)]
pub struct BindTargetRegistry {
    targets: Vec<BindTarget>,
    rules: Vec<TagMatchingRule>,
    ambiguous_groups: Vec<AmbiguousGroup>,
    components: HashMap<String, ComponentDescriptor>,
    qualifier_attribute: String,
}

impl BindTargetRegistry {
    pub fn build(
        facts: &[BindTargetFact],
        components: &[ComponentDescriptor],
        options: &ExpansionOptions,
    ) -> Self {
        let mut targets = build_element_targets(facts);
        targets.extend(build_component_targets(components));

        let (rules, ambiguous_groups) = build_rules(&targets, &options.qualifier_attribute);

        tracing::debug!(
            element_targets = facts.len(),
            component_targets = targets.len() - facts.len() - 1,
            rules = rules.len(),
            ambiguous_groups = ambiguous_groups.len(),
            "built bind target registry"
        );

        BindTargetRegistry {
            targets,
            rules,
            ambiguous_groups,
            components: components
                .iter()
                .map(|c| (c.type_name.clone(), c.clone()))
                .collect(),
            qualifier_attribute: options.qualifier_attribute.clone(),
        }
    }

    pub fn targets(&self) -> &[BindTarget] {
        &self.targets
    }

    pub fn rules(&self) -> &[TagMatchingRule] {
        &self.rules
    }

    /// Element groups in fact order, first occurrence wins.
    pub fn ambiguous_groups(&self) -> &[AmbiguousGroup] {
        &self.ambiguous_groups
    }

    pub fn target(&self, index: usize) -> Option<&BindTarget> {
        self.targets.get(index)
    }

    pub fn component(&self, type_name: &str) -> Option<&ComponentDescriptor> {
        self.components.get(type_name)
    }

    pub fn qualifier_attribute(&self) -> &str {
        &self.qualifier_attribute
    }
}
