//! Attribute matching
//!
//! Applies the registry's tag matching rules to raw attributes, turning every
//! claimed `bind` attribute into one `BindUsage` per matched target. A `bind-`
//! attribute claimed by a specific rule also produces a fallback usage; the
//! lowering pass drops that duplicate.

use lazy_static::lazy_static;
use regex::Regex;

use crate::facts::WILDCARD_ELEMENT;
use crate::ir::{
    AttributeNode, BindDocument, BindUsage, ComponentNode, ContentFragment, ElementNode,
    HtmlAttribute, TagKind,
};
use crate::registry::{
    AmbiguousGroup, BindTargetRegistry, TagMatchingRule, TargetKind, BIND_ATTRIBUTE, BIND_PREFIX,
};
use crate::visitor::{walk_component, walk_element, TemplateVisitor};

lazy_static! {
    /// Implicit expression after `@`: a dotted identifier chain.
    static ref IMPLICIT_EXPR_RE: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*").unwrap();

    /// Member access continuing an implicit expression after `]` or `)`.
    static ref MEMBER_CHAIN_RE: Regex =
        Regex::new(r"^(?:\.[A-Za-z_][A-Za-z0-9_]*)+").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTENT FRAGMENTS
// ═══════════════════════════════════════════════════════════════════════════════

fn find_balanced(code: &str, start: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in code[start..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(start + i);
            }
        }
    }
    None
}

/// End of an implicit expression: identifier chain, then any balanced
/// `[...]` / `(...)` groups, each optionally followed by more `.member`s.
fn implicit_expression_end(code: &str) -> Option<usize> {
    let mut end = IMPLICIT_EXPR_RE.find(code)?.end();
    loop {
        let close = match code[end..].chars().next() {
            Some('[') => find_balanced(code, end, '[', ']'),
            Some('(') => find_balanced(code, end, '(', ')'),
            _ => None,
        };
        match close {
            Some(close) => end = close + 1,
            None => break,
        }
        if let Some(m) = MEMBER_CHAIN_RE.find(&code[end..]) {
            end += m.end();
        }
    }
    Some(end)
}

fn flush_literal(literal: &mut String, fragments: &mut Vec<ContentFragment>) {
    if !literal.trim().is_empty() {
        fragments.push(ContentFragment::literal(literal));
    }
    literal.clear();
}

/// Splits a raw attribute value into literal and expression fragments.
/// `@ident.chain[index](args)` and `@(code)` are expressions, `@@` is a
/// literal `@`.
pub fn split_content(raw: Option<&str>) -> Vec<ContentFragment> {
    let raw = match raw {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut rest = raw;

    while let Some(at) = rest.find('@') {
        literal.push_str(&rest[..at]);
        let after = &rest[at + 1..];

        if let Some(stripped) = after.strip_prefix('@') {
            literal.push('@');
            rest = stripped;
            continue;
        }

        if after.starts_with('(') {
            if let Some(close) = find_balanced(after, 0, '(', ')') {
                flush_literal(&mut literal, &mut fragments);
                fragments.push(ContentFragment::expression(&after[1..close]));
                rest = &after[close + 1..];
                continue;
            }
        } else if let Some(end) = implicit_expression_end(after) {
            flush_literal(&mut literal, &mut fragments);
            fragments.push(ContentFragment::expression(&after[..end]));
            rest = &after[end..];
            continue;
        }

        literal.push('@');
        rest = after;
    }
    literal.push_str(rest);
    flush_literal(&mut literal, &mut fragments);

    fragments
}

// ═══════════════════════════════════════════════════════════════════════════════
// RULE SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_bind_attribute(name: &str) -> bool {
    name == BIND_ATTRIBUTE || name.starts_with(BIND_PREFIX)
}

struct TagContext<'a> {
    kind: TagKind<'a>,
    tag_name: &'a str,
    qualifier_value: Option<&'a str>,
}

fn rule_applies(
    rule: &TagMatchingRule,
    target_kind: TargetKind,
    tag: &TagContext<'_>,
    attribute_name: &str,
) -> bool {
    if !rule.matches_attribute_name(attribute_name) {
        return false;
    }
    let tag_matches = match (target_kind, tag.kind) {
        (TargetKind::Fallback, _) => true,
        (TargetKind::Component, TagKind::Component(type_name)) => rule.tag_name == type_name,
        (TargetKind::Element, TagKind::Element) => {
            rule.is_wildcard_tag() || rule.tag_name.eq_ignore_ascii_case(tag.tag_name)
        }
        _ => false,
    };
    if !tag_matches {
        return false;
    }
    match &rule.qualifier {
        Some(constraint) => tag
            .qualifier_value
            .map_or(false, |v| v.eq_ignore_ascii_case(&constraint.value)),
        None => true,
    }
}

fn score(has_qualifier: bool, wildcard_tag: bool) -> u8 {
    let mut score = 0;
    if has_qualifier {
        score += 2;
    }
    if !wildcard_tag {
        score += 1;
    }
    score
}

fn specificity(rule: &TagMatchingRule) -> u8 {
    score(rule.qualifier.is_some(), rule.is_wildcard_tag())
}

/// Specificity of the most specific ambiguous group covering an element tag.
/// Bare `bind` rules at or below it are shadowed by that group.
fn ambiguity_floor(groups: &[AmbiguousGroup], tag: &TagContext<'_>) -> Option<u8> {
    if tag.kind != TagKind::Element {
        return None;
    }
    groups
        .iter()
        .filter(|g| {
            let wildcard = g.element == WILDCARD_ELEMENT;
            let element_ok = wildcard || g.element.eq_ignore_ascii_case(tag.tag_name);
            let qualifier_ok = match &g.type_qualifier {
                Some(q) => tag.qualifier_value.map_or(false, |v| v.eq_ignore_ascii_case(q)),
                None => true,
            };
            element_ok && qualifier_ok
        })
        .map(|g| score(g.type_qualifier.is_some(), g.element == WILDCARD_ELEMENT))
        .max()
}

/// Most specific non-fallback rule, then the fallback rule, as target indices.
fn select_targets(
    registry: &BindTargetRegistry,
    tag: &TagContext<'_>,
    attribute_name: &str,
) -> (Option<usize>, Option<usize>) {
    let mut specific: Option<(&TagMatchingRule, u8)> = None;
    let mut fallback = None;
    let floor = if attribute_name == BIND_ATTRIBUTE {
        ambiguity_floor(registry.ambiguous_groups(), tag)
    } else {
        None
    };

    for rule in registry.rules() {
        let target_kind = match registry.target(rule.target_index) {
            Some(target) => target.kind,
            None => continue,
        };
        if !rule_applies(rule, target_kind, tag, attribute_name) {
            continue;
        }
        if target_kind == TargetKind::Fallback {
            fallback.get_or_insert(rule.target_index);
            continue;
        }
        let score = specificity(rule);
        if floor.map_or(false, |floor| score <= floor) {
            continue;
        }
        if specific.map_or(true, |(_, best)| score > best) {
            specific = Some((rule, score));
        }
    }

    (specific.map(|(rule, _)| rule.target_index), fallback)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHER
// ═══════════════════════════════════════════════════════════════════════════════

struct BindMatcher<'r> {
    registry: &'r BindTargetRegistry,
    matched: usize,
}

impl<'r> BindMatcher<'r> {
    fn usage(&self, attr: &HtmlAttribute, target_index: usize) -> Option<AttributeNode> {
        let target = self.registry.target(target_index)?.clone();
        Some(AttributeNode::BindUsage(BindUsage {
            attribute_name: attr.name.clone(),
            content: split_content(attr.value.as_deref()),
            target: Some(target),
            location: attr.location,
        }))
    }

    fn match_attributes(
        &mut self,
        attributes: Vec<AttributeNode>,
        tag: &TagContext<'_>,
    ) -> Vec<AttributeNode> {
        let mut out = Vec::with_capacity(attributes.len());
        for attr in attributes {
            let html = match attr {
                AttributeNode::Html(html) if is_bind_attribute(&html.name) => html,
                other => {
                    out.push(other);
                    continue;
                }
            };

            let (specific, fallback) = select_targets(self.registry, tag, &html.name);
            let usages: Vec<AttributeNode> = specific
                .into_iter()
                .chain(fallback)
                .filter_map(|index| self.usage(&html, index))
                .collect();

            if usages.is_empty() {
                out.push(AttributeNode::Html(html));
            } else {
                self.matched += usages.len();
                out.extend(usages);
            }
        }
        out
    }
}

impl<'r> TemplateVisitor for BindMatcher<'r> {
    fn visit_element(&mut self, element: &mut ElementNode) {
        let qualifier_value = element
            .attribute_value(self.registry.qualifier_attribute())
            .map(str::to_string);
        let attributes = std::mem::take(&mut element.attributes);
        let tag = TagContext {
            kind: TagKind::Element,
            tag_name: &element.tag,
            qualifier_value: qualifier_value.as_deref(),
        };
        element.attributes = self.match_attributes(attributes, &tag);
        walk_element(self, element);
    }

    fn visit_component(&mut self, component: &mut ComponentNode) {
        let attributes = std::mem::take(&mut component.attributes);
        let tag = TagContext {
            kind: TagKind::Component(&component.name),
            tag_name: &component.name,
            qualifier_value: None,
        };
        component.attributes = self.match_attributes(attributes, &tag);
        walk_component(self, component);
    }
}

/// Routes raw `bind` attributes to targets. Returns the number of usages created.
pub fn match_bind_attributes(document: &mut BindDocument, registry: &BindTargetRegistry) -> usize {
    let mut matcher = BindMatcher {
        registry,
        matched: 0,
    };
    matcher.visit_document(document);
    matcher.matched
}
