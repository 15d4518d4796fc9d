use serde::{Deserialize, Serialize};

use crate::diagnostics::BindDiagnostic;
use crate::registry::BindTarget;

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// One compilation unit as handed over by the host parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindDocument {
    pub file_path: String,
    pub nodes: Vec<TemplateNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TemplateNode {
    Element(ElementNode),
    Component(ComponentNode),
    Text(TextNode),
    Expression(ExpressionNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<AttributeNode>,
    #[serde(default)]
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub diagnostics: Vec<BindDiagnostic>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    /// Component type name as resolved by the host.
    pub name: String,
    pub attributes: Vec<AttributeNode>,
    #[serde(default)]
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub diagnostics: Vec<BindDiagnostic>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionNode {
    pub expression: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Whether a bind usage sits on a plain DOM element or on a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind<'a> {
    Element,
    Component(&'a str),
}

impl ElementNode {
    /// Value of a plain attribute, compared case-insensitively by name.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            AttributeNode::Html(html) if html.name.eq_ignore_ascii_case(name) => {
                html.value.as_deref()
            }
            _ => None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AttributeNode {
    /// Attribute the matcher did not claim.
    Html(HtmlAttribute),
    /// A bind directive bound to exactly one target.
    BindUsage(BindUsage),
    /// Output of a successful expansion.
    Generated(GeneratedAttribute),
}

impl AttributeNode {
    pub fn name(&self) -> &str {
        match self {
            AttributeNode::Html(a) => &a.name,
            AttributeNode::BindUsage(u) => &u.attribute_name,
            AttributeNode::Generated(g) => &g.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlAttribute {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindUsage {
    /// Name as written, e.g. `bind`, `bind-value`, `bind-value-changed`.
    pub attribute_name: String,
    #[serde(default)]
    pub content: Vec<ContentFragment>,
    #[serde(default)]
    pub target: Option<BindTarget>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Literal,
    Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentFragment {
    pub kind: FragmentKind,
    pub tokens: Vec<String>,
}

impl ContentFragment {
    pub fn literal(text: &str) -> Self {
        ContentFragment {
            kind: FragmentKind::Literal,
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn expression(code: &str) -> Self {
        ContentFragment {
            kind: FragmentKind::Expression,
            tokens: vec![code.trim().to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAttribute {
    pub name: String,
    /// Source text handed to the downstream compiler verbatim.
    pub expression: String,
    #[serde(default)]
    pub property: Option<BoundProperty>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Component property a generated attribute is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoundProperty {
    pub name: String,
    pub type_name: String,
}
