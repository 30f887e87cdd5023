//! Error types for report processing.

use thiserror::Error;

/// Failures of the report core.
///
/// An empty report is not an error; it is a normal report whose views are empty.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The payload parsed as JSON but is not an object.
    #[error("malformed payload: expected a JSON object, found {found}")]
    MalformedPayload { found: &'static str },

    /// The payload text is not JSON.
    #[error("malformed payload: invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The report could not be serialized for export.
    #[error("failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),
}
