//! Pipeline Module
//!
//! Host-facing entry points: registry construction, attribute matching and
//! lowering for one or many compilation units, plus the serialized bridge.

#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::BindError;
use crate::facts::{collect_facts, ingest_fact_declarations, ComponentDescriptor, FactDeclaration};
use crate::ir::BindDocument;
use crate::lowering::{lower_document, LoweringReport};
use crate::matching::match_bind_attributes;
use crate::options::ExpansionOptions;
use crate::registry::{BindTargetRegistry, TagMatchingRule};

/// Everything the host knows about bindable things in this compilation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BindMetadata {
    #[serde(default)]
    pub facts: Vec<FactDeclaration>,
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
    pub document: BindDocument,
    pub matched: u32,
    pub report: LoweringReport,
}

pub fn build_registry(metadata: &BindMetadata, options: &ExpansionOptions) -> BindTargetRegistry {
    let declared = ingest_fact_declarations(&metadata.facts);
    let facts = collect_facts(&declared, options.include_builtin_facts);
    BindTargetRegistry::build(&facts, &metadata.components, options)
}

/// Counts cross the serialized boundary as `u32`; larger counts saturate.
fn boundary_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Matches and lowers a single document against a freshly built registry.
pub fn compile_binds_internal(
    mut document: BindDocument,
    metadata: &BindMetadata,
    options: &ExpansionOptions,
) -> CompileResult {
    let registry = build_registry(metadata, options);
    let matched = match_bind_attributes(&mut document, &registry);
    let report = lower_document(&mut document, &registry, options);
    CompileResult {
        document,
        matched: boundary_count(matched),
        report,
    }
}

/// Lowers already-matched documents in parallel. Each tree is owned by one
/// worker; the registry is shared read-only.
pub fn expand_documents(
    documents: &mut [BindDocument],
    registry: &BindTargetRegistry,
    options: &ExpansionOptions,
) -> Vec<LoweringReport> {
    documents
        .par_iter_mut()
        .map(|document| lower_document(document, registry, options))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERIALIZED BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_options(options_json: Option<&str>) -> Result<ExpansionOptions, BindError> {
    match options_json {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str(json).map_err(BindError::InvalidOptions)
        }
        _ => Ok(ExpansionOptions::default()),
    }
}

pub fn compile_binds_json(
    document_json: &str,
    metadata_json: &str,
    options_json: Option<&str>,
) -> Result<String, BindError> {
    let document: BindDocument = serde_json::from_str(document_json).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse bind document");
        BindError::InvalidDocument(e)
    })?;
    let metadata: BindMetadata = serde_json::from_str(metadata_json).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse bind metadata");
        BindError::InvalidMetadata(e)
    })?;
    let options = parse_options(options_json)?;

    let result = compile_binds_internal(document, &metadata, &options);
    Ok(serde_json::to_string(&result)?)
}

pub fn matching_rules_json(metadata_json: &str, options_json: Option<&str>) -> Result<String, BindError> {
    let metadata: BindMetadata =
        serde_json::from_str(metadata_json).map_err(BindError::InvalidMetadata)?;
    let options = parse_options(options_json)?;
    let registry = build_registry(&metadata, &options);
    let rules: &[TagMatchingRule] = registry.rules();
    Ok(serde_json::to_string(&serde_json::json!({
        "targets": registry.targets(),
        "rules": rules,
    }))?)
}

#[cfg(feature = "napi")]
#[napi]
pub fn compile_binds_native(
    document_json: String,
    metadata_json: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    compile_binds_json(&document_json, &metadata_json, options_json.as_deref())
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn build_matching_rules_native(
    metadata_json: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    matching_rules_json(&metadata_json, options_json.as_deref())
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
