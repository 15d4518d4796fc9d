//! # Bind Lowering Ground Truth
//!
//! ## Bind Syntax
//!
//! Three forms are recognized on any tag:
//! - `bind="@expr"`: both attribute names come from the matched target.
//! - `bind-A="@expr"`: `A` is the value attribute; the change attribute comes
//!   from the target (or is `AChanged` on components).
//! - `bind-A-B="@expr"`: both names are explicit.
//!
//! ## Pipeline
//!
//! 1. **Registry**: facts and component metadata become `BindTarget`s and
//!    `TagMatchingRule`s, once per compilation, read-only afterwards.
//! 2. **Matching**: each `bind` attribute becomes one `BindUsage` per matched
//!    target (specific and/or fallback).
//! 3. **Lowering**: duplicate fallback usages are suppressed, names are
//!    resolved, content is validated, and each surviving usage is replaced in
//!    place by `value=ReadValue(expr)` followed by the change handler.
//!
//! ## Failure Policy
//!
//! Lowering is total. A bad usage is dropped or removed with a diagnostic on
//! its tag; siblings and other tags are always processed.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod diagnostics;
mod error;
mod facts;
mod ir;
mod lowering;
mod matching;
mod options;
mod pipeline;
mod registry;
mod visitor;

#[cfg(test)]
mod lowering_tests;

pub use diagnostics::{BindDiagnostic, DiagnosticKind, BIND_UNSUPPORTED_COMPLEX_CONTENT};
pub use error::BindError;
pub use facts::{
    builtin_facts, collect_facts, ingest_fact_declarations, BindTargetFact, ComponentDescriptor,
    FactDeclaration, PropertyDescriptor, WILDCARD_ELEMENT,
};
pub use ir::{
    AttributeNode, BindDocument, BindUsage, BoundProperty, ComponentNode, ContentFragment,
    ElementNode, ExpressionNode, FragmentKind, GeneratedAttribute, HtmlAttribute, SourceLocation,
    TagKind, TemplateNode, TextNode,
};
pub use lowering::{
    lower_document, lower_usage, parse_bind_attribute_name, suppress_duplicates, DropReason,
    LoweringOutcome, LoweringReport, ParsedBindName,
};
pub use matching::{is_bind_attribute, match_bind_attributes, split_content};
pub use options::ExpansionOptions;
pub use pipeline::{
    build_registry, compile_binds_internal, compile_binds_json, expand_documents,
    matching_rules_json, BindMetadata, CompileResult,
};
#[cfg(feature = "napi")]
pub use pipeline::{build_matching_rules_native, compile_binds_native};
pub use registry::{
    build_component_targets, build_element_targets, AmbiguousGroup, AttributeComparison,
    AttributeConstraint, AttributeRequirement, BindTarget, BindTargetRegistry, TagMatchingRule, TargetKind,
};
pub use visitor::TemplateVisitor;

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "Bind Lowering Native Bridge Connected".to_string()
}
