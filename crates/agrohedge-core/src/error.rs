use thiserror::Error;

#[derive(Debug, Error)]
pub enum HedgeError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// The shape of an input collection does not match the fixed workbook layout.
    #[error("Configuration error in {context}: {reason}")]
    Configuration { context: String, reason: String },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for HedgeError {
    fn from(e: serde_json::Error) -> Self {
        HedgeError::SerializationError(e.to_string())
    }
}
