use thiserror::Error;

/// Failures at the serialized host boundary. The lowering passes themselves
/// never fail; these only cover payloads that cannot be decoded or encoded.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("Document parse error: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("Metadata parse error: {0}")]
    InvalidMetadata(#[source] serde_json::Error),

    #[error("Options parse error: {0}")]
    InvalidOptions(#[source] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}
