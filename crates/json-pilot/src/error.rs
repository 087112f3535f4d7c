use serde_json::Value;
use thiserror::Error;

/// Errors raised at the untyped JSON boundary.
///
/// The typed migration path never fails: malformed patch entries are
/// dropped and missing metadata is synthesized. These variants only cover
/// input whose top-level shape cannot be a document or a patch set at all,
/// plus a single [`crate::Patch`] deserialized on its own.
#[derive(Debug, Error)]
pub enum Error {
    #[error("document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("patch set must be a JSON array, got {0}")]
    NotAnArray(&'static str),
    #[error("patch entry needs a positive integer version and a non-empty object body")]
    InvalidPatch,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Name of the JSON type of `value`, used in error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
