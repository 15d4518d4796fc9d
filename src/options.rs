use serde::{Deserialize, Serialize};

/// Knobs for generated code and fact collection. Every field has a default,
/// so `{}` is a valid serialized configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpansionOptions {
    /// Helper applied to the bound expression to produce the value attribute.
    pub read_helper: String,
    /// Helper wrapping DOM change handlers so the event payload is coerced
    /// before assignment.
    pub write_helper: String,
    /// Parameter name used by generated assignment lambdas.
    pub lambda_parameter: String,
    pub include_builtin_facts: bool,
    /// DOM attribute that fact type qualifiers constrain.
    pub qualifier_attribute: String,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        ExpansionOptions {
            read_helper: "ReadValue".to_string(),
            write_helper: "WriteValueHandler".to_string(),
            lambda_parameter: "__value".to_string(),
            include_builtin_facts: true,
            qualifier_attribute: "type".to_string(),
        }
    }
}
