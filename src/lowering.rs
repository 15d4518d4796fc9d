//! Bind Expansion Engine
//!
//! Lowers every matched bind usage into a value attribute and a change
//! handler attribute, in document order.
//!
//! ## Per-usage outcomes
//!
//! Each usage is classified exactly once:
//! - **Suppressed**: a fallback usage shadowed by a specific usage for the same
//!   final attribute on the same tag. No output, no diagnostic. Decided for the
//!   whole tag by `suppress_duplicates` before any usage is lowered.
//! - **Dropped**: the name does not parse, the attribute names cannot be
//!   resolved, or the content is empty. No output, no diagnostic.
//! - **Removed**: the content is composite. No output, a diagnostic on the tag.
//! - **Expanded**: two generated attributes at the usage's position, value first.
//!
//! No outcome aborts processing of sibling usages or other tags.

use serde::{Deserialize, Serialize};

use crate::diagnostics::BindDiagnostic;
use crate::ir::{
    AttributeNode, BindDocument, BindUsage, BoundProperty, ComponentNode, ContentFragment,
    ElementNode, GeneratedAttribute, TagKind,
};
use crate::options::ExpansionOptions;
use crate::registry::{BindTargetRegistry, BIND_ATTRIBUTE, BIND_PREFIX, CHANGED_SUFFIX};
use crate::visitor::{walk_component, walk_element, TemplateVisitor};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Attribute name is not `bind`, `bind-A` or `bind-A-B`.
    UnparseableName,
    /// No target was bound by the parser.
    Unmatched,
    /// Value or change attribute name could not be determined.
    Unresolvable,
    /// Empty expression body, already reported upstream.
    EmptyContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoweringOutcome {
    Expanded {
        value: GeneratedAttribute,
        change: GeneratedAttribute,
    },
    Dropped(DropReason),
    Removed(BindDiagnostic),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoweringReport {
    pub expanded: u32,
    pub suppressed: u32,
    pub dropped: u32,
    pub removed: u32,
    pub diagnostics: Vec<BindDiagnostic>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAME PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Explicit names written in a bind attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedBindName<'a> {
    pub value: Option<&'a str>,
    pub change: Option<&'a str>,
}

pub fn parse_bind_attribute_name(name: &str) -> Option<ParsedBindName<'_>> {
    if name == BIND_ATTRIBUTE {
        return Some(ParsedBindName {
            value: None,
            change: None,
        });
    }

    let rest = name.strip_prefix(BIND_PREFIX)?;
    let segments: Vec<&str> = rest.split('-').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    match segments.as_slice() {
        [value] => Some(ParsedBindName {
            value: Some(*value),
            change: None,
        }),
        [value, change] => Some(ParsedBindName {
            value: Some(*value),
            change: Some(*change),
        }),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedNames {
    value: String,
    change: String,
    value_property: Option<BoundProperty>,
    change_property: Option<BoundProperty>,
}

/// Final value attribute a usage would produce, used for duplicate detection.
fn final_value_name(usage: &BindUsage) -> Option<String> {
    let parsed = parse_bind_attribute_name(&usage.attribute_name)?;
    parsed
        .value
        .map(str::to_string)
        .or_else(|| usage.target.as_ref()?.value_attribute.clone())
}

fn bound_property(
    registry: &BindTargetRegistry,
    component_type: &str,
    name: &str,
) -> Option<BoundProperty> {
    let property = registry.component(component_type)?.property(name)?;
    Some(BoundProperty {
        name: property.name.clone(),
        type_name: property.type_name.clone(),
    })
}

/// `value` is a plain property and `change` a delegate-shaped one.
fn is_property_pair(
    registry: &BindTargetRegistry,
    component_type: &str,
    value: &str,
    change: &str,
) -> bool {
    let component = match registry.component(component_type) {
        Some(component) => component,
        None => return false,
    };
    let value_ok = component.property(value).map_or(false, |p| !p.is_delegate);
    let change_ok = component.property(change).map_or(false, |p| p.is_delegate);
    value_ok && change_ok
}

fn resolve_names(
    usage: &BindUsage,
    parsed: ParsedBindName<'_>,
    kind: TagKind<'_>,
    registry: &BindTargetRegistry,
) -> Result<ResolvedNames, DropReason> {
    let target = usage.target.as_ref().ok_or(DropReason::Unmatched)?;

    let value = parsed
        .value
        .map(str::to_string)
        .or_else(|| target.value_attribute.clone());
    let change = parsed
        .change
        .map(str::to_string)
        .or_else(|| target.change_attribute.clone());

    let resolved = match kind {
        TagKind::Component(component_type) => {
            let value = value.ok_or(DropReason::Unresolvable)?;
            let change = change.unwrap_or_else(|| format!("{}{}", value, CHANGED_SUFFIX));
            // The fallback carries no property pair of its own; the component
            // must declare one under the written names.
            if target.is_fallback() && !is_property_pair(registry, component_type, &value, &change)
            {
                return Err(DropReason::Unresolvable);
            }
            ResolvedNames {
                value_property: bound_property(registry, component_type, &value),
                change_property: bound_property(registry, component_type, &change),
                value,
                change,
            }
        }
        TagKind::Element => ResolvedNames {
            value: value.ok_or(DropReason::Unresolvable)?,
            change: change.ok_or(DropReason::Unresolvable)?,
            value_property: None,
            change_property: None,
        },
    };

    if resolved.value == resolved.change {
        return Err(DropReason::Unresolvable);
    }
    Ok(resolved)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTENT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

fn is_complex_content(content: &[ContentFragment]) -> bool {
    content.len() > 1 || content.first().map_or(false, |f| f.tokens.len() > 1)
}

fn content_text(content: &[ContentFragment]) -> String {
    content
        .iter()
        .flat_map(|f| f.tokens.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn single_expression(content: &[ContentFragment]) -> Option<&str> {
    let token = content.first()?.tokens.first()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITE
// ═══════════════════════════════════════════════════════════════════════════════

fn assignment_lambda(expression: &str, options: &ExpansionOptions) -> String {
    let param = &options.lambda_parameter;
    format!("({}) => {} = {}", param, expression, param)
}

fn rewrite(
    usage: &BindUsage,
    names: ResolvedNames,
    expression: &str,
    options: &ExpansionOptions,
) -> LoweringOutcome {
    let value = GeneratedAttribute {
        name: names.value,
        expression: format!("{}({})", options.read_helper, expression),
        property: names.value_property,
        location: usage.location,
    };

    // Component callbacks are precisely typed; DOM handlers receive an opaque
    // payload that the write helper coerces first.
    let handler = match names.change_property {
        Some(_) => assignment_lambda(expression, options),
        None => format!(
            "{}({}, {})",
            options.write_helper,
            assignment_lambda(expression, options),
            expression
        ),
    };
    let change = GeneratedAttribute {
        name: names.change,
        expression: handler,
        property: names.change_property,
        location: usage.location,
    };

    LoweringOutcome::Expanded { value, change }
}

/// Classifies and, when possible, expands a single usage.
pub fn lower_usage(
    usage: &BindUsage,
    kind: TagKind<'_>,
    registry: &BindTargetRegistry,
    options: &ExpansionOptions,
) -> LoweringOutcome {
    let parsed = match parse_bind_attribute_name(&usage.attribute_name) {
        Some(parsed) => parsed,
        None => return LoweringOutcome::Dropped(DropReason::UnparseableName),
    };

    let names = match resolve_names(usage, parsed, kind, registry) {
        Ok(names) => names,
        Err(reason) => return LoweringOutcome::Dropped(reason),
    };

    if is_complex_content(&usage.content) {
        return LoweringOutcome::Removed(BindDiagnostic::unsupported_complex_content(
            &usage.attribute_name,
            &content_text(&usage.content),
            usage.location,
        ));
    }

    match single_expression(&usage.content) {
        Some(expression) => rewrite(usage, names, expression, options),
        None => LoweringOutcome::Dropped(DropReason::EmptyContent),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DUPLICATE SUPPRESSION
// ═══════════════════════════════════════════════════════════════════════════════

fn is_fallback_usage(usage: &BindUsage) -> bool {
    usage.target.as_ref().map_or(false, |t| t.is_fallback())
}

/// Drops fallback usages that a specific usage on the same tag already
/// covers. Builds a fresh list, preserving the order of what remains.
pub fn suppress_duplicates(attributes: Vec<AttributeNode>) -> (Vec<AttributeNode>, u32) {
    let specific_names: Vec<String> = attributes
        .iter()
        .filter_map(|attr| match attr {
            AttributeNode::BindUsage(u) if u.target.is_some() && !is_fallback_usage(u) => {
                final_value_name(u)
            }
            _ => None,
        })
        .collect();

    let mut suppressed = 0;
    let mut kept = Vec::with_capacity(attributes.len());
    for attr in attributes {
        if let AttributeNode::BindUsage(usage) = &attr {
            if is_fallback_usage(usage) {
                let shadowed = final_value_name(usage)
                    .map_or(false, |name| specific_names.iter().any(|s| *s == name));
                if shadowed {
                    tracing::debug!(
                        attribute = %usage.attribute_name,
                        line = usage.location.line,
                        column = usage.location.column,
                        "suppressed fallback bind usage"
                    );
                    suppressed += 1;
                    continue;
                }
            }
        }
        kept.push(attr);
    }
    (kept, suppressed)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE PASS
// ═══════════════════════════════════════════════════════════════════════════════

struct BindLowerer<'r> {
    registry: &'r BindTargetRegistry,
    options: &'r ExpansionOptions,
    file_path: String,
    report: LoweringReport,
}

impl<'r> BindLowerer<'r> {
    fn lower_attributes(
        &mut self,
        attributes: Vec<AttributeNode>,
        kind: TagKind<'_>,
        diagnostics: &mut Vec<BindDiagnostic>,
    ) -> Vec<AttributeNode> {
        let (attributes, suppressed) = suppress_duplicates(attributes);
        self.report.suppressed += suppressed;

        let mut out = Vec::with_capacity(attributes.len() + 1);
        for attr in attributes {
            let usage = match attr {
                AttributeNode::BindUsage(usage) => usage,
                other => {
                    out.push(other);
                    continue;
                }
            };

            match lower_usage(&usage, kind, self.registry, self.options) {
                LoweringOutcome::Expanded { value, change } => {
                    self.report.expanded += 1;
                    out.push(AttributeNode::Generated(value));
                    out.push(AttributeNode::Generated(change));
                }
                LoweringOutcome::Dropped(reason) => {
                    tracing::debug!(
                        file = %self.file_path,
                        attribute = %usage.attribute_name,
                        line = usage.location.line,
                        column = usage.location.column,
                        ?reason,
                        "dropped bind usage"
                    );
                    self.report.dropped += 1;
                }
                LoweringOutcome::Removed(diagnostic) => {
                    tracing::debug!(
                        file = %self.file_path,
                        attribute = %usage.attribute_name,
                        code = %diagnostic.code,
                        "removed bind usage with diagnostic"
                    );
                    self.report.removed += 1;
                    self.report.diagnostics.push(diagnostic.clone());
                    diagnostics.push(diagnostic);
                }
            }
        }
        out
    }
}

impl<'r> TemplateVisitor for BindLowerer<'r> {
    fn visit_element(&mut self, element: &mut ElementNode) {
        let attributes = std::mem::take(&mut element.attributes);
        element.attributes =
            self.lower_attributes(attributes, TagKind::Element, &mut element.diagnostics);
        walk_element(self, element);
    }

    fn visit_component(&mut self, component: &mut ComponentNode) {
        let attributes = std::mem::take(&mut component.attributes);
        component.attributes = self.lower_attributes(
            attributes,
            TagKind::Component(&component.name),
            &mut component.diagnostics,
        );
        walk_component(self, component);
    }
}

/// Rewrites every bind usage in the document in place.
pub fn lower_document(
    document: &mut BindDocument,
    registry: &BindTargetRegistry,
    options: &ExpansionOptions,
) -> LoweringReport {
    let mut lowerer = BindLowerer {
        registry,
        options,
        file_path: document.file_path.clone(),
        report: LoweringReport::default(),
    };
    lowerer.visit_document(document);
    lowerer.report
}
