use serde::{Deserialize, Serialize};

use crate::ir::SourceLocation;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const BIND_UNSUPPORTED_COMPLEX_CONTENT: &str = "BL9986";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        BIND_UNSUPPORTED_COMPLEX_CONTENT => {
            "A bind attribute value is a single expression denoting an assignable location."
        }
        _ => "Unknown invariant.",
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnsupportedComplexContent,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::UnsupportedComplexContent => BIND_UNSUPPORTED_COMPLEX_CONTENT,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BIND DIAGNOSTIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Reported problem attached to the tag that owned the offending usage.
/// The host renders these; lowering never halts on them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindDiagnostic {
    pub kind: DiagnosticKind,
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub attribute_name: String,
    pub location: SourceLocation,
}

impl BindDiagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: String,
        attribute_name: &str,
        location: SourceLocation,
    ) -> Self {
        let code = kind.code();
        BindDiagnostic {
            kind,
            code: code.to_string(),
            message,
            guarantee: get_guarantee(code).to_string(),
            attribute_name: attribute_name.to_string(),
            location,
        }
    }

    pub fn unsupported_complex_content(
        attribute_name: &str,
        content: &str,
        location: SourceLocation,
    ) -> Self {
        Self::new(
            DiagnosticKind::UnsupportedComplexContent,
            format!(
                "Bind attributes do not support complex content (mixed markup and code). Attribute: '{}', text: '{}'.",
                attribute_name, content
            ),
            attribute_name,
            location,
        )
    }
}
